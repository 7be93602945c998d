use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use karel_core::Status;

/// The host control channel: the status cell and the short-circuit mask.
///
/// These are the only fields shared across threads without the facade lock.
/// The status cell uses release/acquire ordering, so a host that observes a
/// terminal status and then takes the facade lock sees the world exactly as
/// the interpreter left it.
#[derive(Debug)]
pub struct Control {
    status: AtomicU8,
    fetch_mask: AtomicUsize,
}

impl Control {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(Status::NotInitialized.as_u8()),
            fetch_mask: AtomicUsize::new(1),
        }
    }

    /// Prepare for a run: clear any pending interrupt and mark IN_PROGRESS.
    pub fn arm(&self) {
        self.fetch_mask.store(1, Ordering::Release);
        self.publish(Status::InProgress);
    }

    /// Request cooperative interruption of the running interpreter.
    ///
    /// Callable from any thread at any time; the interpreter observes the
    /// zeroed mask at its next instruction fetch, which redirects to the
    /// synthetic RETN at offset 0 and unwinds cleanly.
    pub fn short_circuit(&self) {
        self.fetch_mask.store(0, Ordering::Release);
    }

    /// The current fetch multiplier: 1 normally, 0 after a short-circuit.
    pub fn mask(&self) -> usize {
        self.fetch_mask.load(Ordering::Acquire)
    }

    pub fn publish(&self, status: Status) {
        self.status.store(status.as_u8(), Ordering::Release);
    }

    pub fn status(&self) -> Status {
        // The cell only ever holds values written from Status.
        Status::from_u8(self.status.load(Ordering::Acquire)).unwrap_or(Status::UnknownError)
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}

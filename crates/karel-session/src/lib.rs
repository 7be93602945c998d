//! Karel Session - High-level facade over the compiler and interpreter.
//!
//! This crate provides the [`Session`] struct, the entry point for hosts:
//! - Loading Karel source (text or file) through the compiler collaborator
//! - Importing and exporting world state
//! - Running a procedure by symbol name
//! - Observing run status and interrupting a run from another thread
//!
//! # Quick Start
//!
//! ```no_run
//! use karel_session::Session;
//!
//! let session = Session::new();
//! session.load_source("define main step end").unwrap();
//! session.load_world(&[0; 400], &[5, 5, 0, 5, 5]).unwrap();
//! let status = session.run_symbol("main").unwrap();
//! println!("terminated with {status}");
//! ```
//!
//! Load and run operations are mutually exclusive through a single facade
//! lock, held for their whole duration. The status cell and the interrupt
//! flag are the only state shared across threads without that lock; a host
//! that observes a terminal status and then locks (any world accessor does)
//! sees the world exactly as the interpreter left it.

mod error;

pub use error::SessionError;
// Re-export the types hosts need alongside the facade.
pub use karel_core::{Diagnostic, Status, SymbolTable};
pub use karel_vm::{Direction, GRID_SIDE, MAX_FLAGS, Robot, RobotRecord, WALL_IMPORT, World};

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use karel_vm::Control;

/// Everything guarded by the facade lock.
struct VmState {
    world: World,
    image: Vec<u8>,
    symbols: SymbolTable,
    bytecode_valid: bool,
    world_valid: bool,
}

/// Unified facade over loading, world import/export, and execution.
pub struct Session {
    state: Mutex<VmState>,
    control: Control,
}

impl Session {
    /// Create a session with nothing loaded; both validity flags are clear
    /// and the status cell reads NOT_INITIALIZED until the first run.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(VmState {
                world: World::new(),
                image: Vec::new(),
                symbols: SymbolTable::new(),
                bytecode_valid: false,
                world_valid: false,
            }),
            control: Control::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VmState> {
        // The interpreter publishes its terminal status before unwinding, so
        // state behind a poisoned lock is still coherent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compile Karel source and install the resulting bytecode and symbol
    /// table, replacing any previous program.
    pub fn load_source(&self, source: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        let program = karel_lang::compile(source).map_err(SessionError::Compilation)?;
        tracing::debug!(
            bytes = program.code.len(),
            symbols = program.symbols.len(),
            "bytecode loaded"
        );
        state.image = program.code;
        state.symbols.clear();
        for (name, entry) in program.symbols.iter() {
            state.symbols.insert(name, entry);
        }
        state.bytecode_valid = true;
        Ok(())
    }

    /// Read a source file and compile it as [`Session::load_source`].
    pub fn load_file(&self, path: &Path) -> Result<(), SessionError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "source file unreadable");
            SessionError::FileNotFound {
                path: path.to_owned(),
                source: e,
            }
        })?;
        self.load_source(&source)
    }

    /// Import a world: a row-major GRID_SIDE² cell buffer (255 = wall) and
    /// the robot record (px, py, d, hx, hy). The previous world is fully
    /// overwritten.
    pub fn load_world(&self, cells: &[u8], record: &RobotRecord) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.world = World::import(cells, record)?;
        state.world_valid = true;
        Ok(())
    }

    /// Run the procedure bound to `name` until it terminates.
    ///
    /// Requires both bytecode and world to be loaded. The returned status is
    /// the same terminal status published to the status cell.
    pub fn run_symbol(&self, name: &str) -> Result<Status, SessionError> {
        let mut state = self.lock();
        if !state.bytecode_valid || !state.world_valid {
            return Err(SessionError::StateNotValid);
        }
        let entry = state
            .symbols
            .lookup(name)
            .ok_or_else(|| SessionError::SymbolNotFound(name.to_owned()))?;

        self.control.arm();
        let VmState { world, image, .. } = &mut *state;
        let status = karel_vm::run(world, image, entry, &self.control);
        tracing::debug!(symbol = name, %status, "run finished");
        Ok(status)
    }

    /// Request cooperative interruption of a running program. Callable from
    /// any thread; never blocks on the facade lock.
    pub fn interrupt(&self) {
        self.control.short_circuit();
    }

    /// The most recently published status.
    pub fn status(&self) -> Status {
        self.control.status()
    }

    /// Export the world into `out` (same layout as import; walls become 255).
    pub fn read_world(&self, out: &mut [u8]) -> Result<(), SessionError> {
        let state = self.lock();
        if !state.world_valid {
            return Err(SessionError::StateNotValid);
        }
        state.world.export_into(out)?;
        Ok(())
    }

    /// The robot state as an export record.
    pub fn robot(&self) -> Result<RobotRecord, SessionError> {
        let state = self.lock();
        if !state.world_valid {
            return Err(SessionError::StateNotValid);
        }
        Ok(state.world.robot_record())
    }

    /// Names of all loaded procedures, in unspecified order.
    pub fn symbols(&self) -> Vec<String> {
        self.lock()
            .symbols
            .iter()
            .map(|(name, _)| name.to_owned())
            .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

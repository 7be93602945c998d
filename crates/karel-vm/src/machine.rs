use crate::error::StackError;

/// Stack depth both stacks preallocate; pushes below this never allocate.
pub const FAST_DEPTH: usize = 512;

/// Growth increment once the fast depth is exceeded.
const GROW_CHUNK: usize = 16;

/// Bookkeeping for one active REPEAT loop.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RepeatFrame {
    /// PC of the REPEAT instruction itself, used for first-visit detection.
    pub origin: u32,
    /// Iterations left, including the one in flight.
    pub remaining: u16,
}

/// Interpreter execution state for a single run.
///
/// Holds the program counter, the call stack of return PCs, and the repeat
/// stack of outer loops paused while an inner REPEAT runs. `depth` counts all
/// currently-open frames across both stacks; past [`FAST_DEPTH`] every push
/// takes the cold growth path with fallible allocation.
#[derive(Debug)]
pub struct Machine {
    pub pc: usize,
    /// The innermost active loop, if any. Outer loops live on the repeat stack.
    pub cur_repeat: Option<RepeatFrame>,
    calls: Vec<u32>,
    repeats: Vec<RepeatFrame>,
    depth: usize,
}

impl Machine {
    pub fn new(entry_pc: u32) -> Self {
        Self {
            pc: entry_pc as usize,
            cur_repeat: None,
            calls: Vec::with_capacity(FAST_DEPTH),
            repeats: Vec::with_capacity(FAST_DEPTH),
            depth: 0,
        }
    }

    /// Open a call frame: record the PC to return to on RETN.
    pub fn push_call(&mut self, return_pc: u32) -> Result<(), StackError> {
        if self.depth >= FAST_DEPTH {
            self.grow()?;
        }
        self.calls.push(return_pc);
        self.depth += 1;
        Ok(())
    }

    /// Close the innermost call frame, yielding its return PC.
    pub fn pop_call(&mut self) -> Option<u32> {
        let return_pc = self.calls.pop()?;
        self.depth -= 1;
        Some(return_pc)
    }

    /// Open a repeat frame, parking any currently-active loop on the repeat
    /// stack.
    pub fn begin_repeat(&mut self, frame: RepeatFrame) -> Result<(), StackError> {
        // Two distinct REPEAT instructions cannot share a PC, so an equal
        // origin here would mean first-visit detection misfired.
        debug_assert!(
            self.cur_repeat
                .as_ref()
                .is_none_or(|prev| prev.origin != frame.origin)
        );
        if self.depth >= FAST_DEPTH {
            self.grow()?;
        }
        if let Some(prev) = self.cur_repeat.take() {
            self.repeats.push(prev);
        }
        self.cur_repeat = Some(frame);
        self.depth += 1;
        Ok(())
    }

    /// Close the innermost loop, resuming the parked outer loop if any.
    pub fn end_repeat(&mut self) {
        debug_assert!(self.cur_repeat.is_some());
        self.cur_repeat = self.repeats.pop();
        self.depth -= 1;
    }

    /// Total frames currently open across both stacks.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of currently-open call frames.
    pub fn call_depth(&self) -> usize {
        self.calls.len()
    }

    /// Number of currently-nested REPEATs, the active one included.
    pub fn repeat_depth(&self) -> usize {
        self.repeats.len() + usize::from(self.cur_repeat.is_some())
    }

    /// Cold path past the fast depth: grow whichever stack is full by a small
    /// chunk, with fallible allocation.
    #[cold]
    fn grow(&mut self) -> Result<(), StackError> {
        if self.calls.len() == self.calls.capacity() {
            self.calls
                .try_reserve_exact(GROW_CHUNK)
                .map_err(|_| StackError::Exhausted)?;
        }
        if self.repeats.len() == self.repeats.capacity() {
            self.repeats
                .try_reserve_exact(GROW_CHUNK)
                .map_err(|_| StackError::Exhausted)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_machine() {
        let machine = Machine::new(17);
        assert_eq!(machine.pc, 17);
        assert_eq!(machine.depth(), 0);
        assert_eq!(machine.call_depth(), 0);
        assert_eq!(machine.repeat_depth(), 0);
    }

    #[test]
    fn call_push_pop() {
        let mut machine = Machine::new(0);
        machine.push_call(10).unwrap();
        machine.push_call(20).unwrap();
        assert_eq!(machine.depth(), 2);

        assert_eq!(machine.pop_call(), Some(20));
        assert_eq!(machine.pop_call(), Some(10));
        assert_eq!(machine.pop_call(), None);
        assert_eq!(machine.depth(), 0);
    }

    #[test]
    fn repeat_nesting_parks_outer_loop() {
        let mut machine = Machine::new(0);
        machine
            .begin_repeat(RepeatFrame {
                origin: 100,
                remaining: 5,
            })
            .unwrap();
        machine
            .begin_repeat(RepeatFrame {
                origin: 200,
                remaining: 3,
            })
            .unwrap();

        assert_eq!(machine.repeat_depth(), 2);
        assert_eq!(machine.cur_repeat.unwrap().origin, 200);

        machine.end_repeat();
        assert_eq!(machine.cur_repeat.unwrap().origin, 100);
        machine.end_repeat();
        assert!(machine.cur_repeat.is_none());
        assert_eq!(machine.depth(), 0);
    }

    #[test]
    fn depth_sums_both_stacks() {
        let mut machine = Machine::new(0);
        machine.push_call(1).unwrap();
        machine
            .begin_repeat(RepeatFrame {
                origin: 2,
                remaining: 2,
            })
            .unwrap();
        machine.push_call(3).unwrap();

        assert_eq!(machine.call_depth(), 2);
        assert_eq!(machine.repeat_depth(), 1);
        assert_eq!(machine.depth(), machine.call_depth() + machine.repeat_depth());
    }

    #[test]
    fn growth_past_fast_depth() {
        let mut machine = Machine::new(0);
        for i in 0..(FAST_DEPTH + 40) {
            machine.push_call(i as u32).unwrap();
        }
        assert_eq!(machine.call_depth(), FAST_DEPTH + 40);
        for i in (0..(FAST_DEPTH + 40)).rev() {
            assert_eq!(machine.pop_call(), Some(i as u32));
        }
    }
}

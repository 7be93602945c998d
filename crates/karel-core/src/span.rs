/// Byte offset in source code.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Pos(u32);

impl Pos {
    pub fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> u32 {
        self.0
    }
}

/// A range in source code.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Span {
    start: Pos,
    end: Pos,
}

impl Span {
    /// Dummy span at position (0, 0).
    pub const DUMMY: Span = Span {
        start: Pos(0),
        end: Pos(0),
    };

    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> Pos {
        self.start
    }

    pub fn end(self) -> Pos {
        self.end
    }

    /// Length of this span in bytes.
    pub fn len(self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Line and column (1-indexed) of the span start within `source`.
    pub fn line_col(self, source: &str) -> (u32, u32) {
        let offset = self.start.0 as usize;
        let mut line = 1;
        let mut col = 1;
        for (i, c) in source.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

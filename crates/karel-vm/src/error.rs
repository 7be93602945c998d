/// Interpreter stack errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// Growing the call/repeat stacks past the fast depth failed to allocate.
    Exhausted,
}

impl std::fmt::Display for StackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackError::Exhausted => write!(f, "stack growth failed: out of memory"),
        }
    }
}

impl std::error::Error for StackError {}

/// Errors rejected by world import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldError {
    /// Cell buffer is not GRID_SIDE² bytes long.
    BadLength { expected: usize, got: usize },
    /// A cell byte is neither a flag count nor the wall marker.
    BadCell { x: u32, y: u32, value: u8 },
    /// Facing index outside 0..=3.
    BadDirection(u32),
    /// Robot position or home outside the grid.
    OutOfRange { x: u32, y: u32 },
    /// Robot placed on a wall cell.
    RobotOnWall { x: u32, y: u32 },
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorldError::BadLength { expected, got } => {
                write!(f, "world buffer must be {} bytes, got {}", expected, got)
            }
            WorldError::BadCell { x, y, value } => {
                write!(f, "invalid cell value {} at ({}, {})", value, x, y)
            }
            WorldError::BadDirection(d) => write!(f, "invalid facing index {}", d),
            WorldError::OutOfRange { x, y } => {
                write!(f, "robot coordinate ({}, {}) outside the grid", x, y)
            }
            WorldError::RobotOnWall { x, y } => {
                write!(f, "robot placed on a wall at ({}, {})", x, y)
            }
        }
    }
}

impl std::error::Error for WorldError {}

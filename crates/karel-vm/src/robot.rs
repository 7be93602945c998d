use crate::grid::GRID_SIDE;

/// Cardinal facing, counter-clockwise order.
///
/// North increases y; origin (0, 0) is the bottom-left corner of the grid.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum Direction {
    North = 0,
    West = 1,
    South = 2,
    East = 3,
}

impl Direction {
    /// Decode a facing index from a world import record.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Direction::North),
            1 => Some(Direction::West),
            2 => Some(Direction::South),
            3 => Some(Direction::East),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    /// The turn-left primitive: d ← (d + 1) mod 4.
    pub fn turn_left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::West => "west",
            Direction::South => "south",
            Direction::East => "east",
        };
        write!(f, "{}", name)
    }
}

/// Robot state: position, home, and facing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Robot {
    pub x: u32,
    pub y: u32,
    pub dir: Direction,
    pub home_x: u32,
    pub home_y: u32,
}

impl Robot {
    /// The cell the robot would enter by stepping forward, or `None` when the
    /// step would leave the grid. Pure; the robot is not mutated.
    pub fn preview_step(&self) -> Option<(u32, u32)> {
        match self.dir {
            Direction::North => (self.y + 1 < GRID_SIDE).then(|| (self.x, self.y + 1)),
            Direction::West => (self.x > 0).then(|| (self.x - 1, self.y)),
            Direction::South => (self.y > 0).then(|| (self.x, self.y - 1)),
            Direction::East => (self.x + 1 < GRID_SIDE).then(|| (self.x + 1, self.y)),
        }
    }

    pub fn turn_left(&mut self) {
        self.dir = self.dir.turn_left();
    }

    pub fn move_to(&mut self, x: u32, y: u32) {
        self.x = x;
        self.y = y;
    }

    /// True when the robot stands on the cell recorded as home at import.
    pub fn is_home(&self) -> bool {
        self.x == self.home_x && self.y == self.home_y
    }
}

use crate::error::WorldError;
use crate::grid::{GRID_SIDE, Grid, MAX_FLAGS, WALL};
use crate::robot::{Direction, Robot};

/// Byte value denoting a wall in import/export buffers.
pub const WALL_IMPORT: u8 = 255;

/// The 5-word robot import record: px, py, d, hx, hy.
pub type RobotRecord = [u32; 5];

const CELL_COUNT: usize = (GRID_SIDE * GRID_SIDE) as usize;

/// The complete world state the interpreter mutates: grid plus robot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct World {
    pub grid: Grid,
    pub robot: Robot,
}

impl World {
    /// An empty world: no flags, no walls, robot parked at the origin facing
    /// North. Stands in until the first import overwrites it wholesale.
    pub fn new() -> Self {
        Self {
            grid: Grid::new(),
            robot: Robot {
                x: 0,
                y: 0,
                dir: Direction::North,
                home_x: 0,
                home_y: 0,
            },
        }
    }

    /// Build a world from an import buffer and robot record.
    ///
    /// `cells` is GRID_SIDE² bytes, row-major with bottom-left origin; 255
    /// translates to the wall nibble, 0..=MAX_FLAGS are stored verbatim, and
    /// anything else is rejected. The grid is fully overwritten and the robot
    /// replaced wholesale.
    pub fn import(cells: &[u8], record: &RobotRecord) -> Result<Self, WorldError> {
        if cells.len() != CELL_COUNT {
            return Err(WorldError::BadLength {
                expected: CELL_COUNT,
                got: cells.len(),
            });
        }

        let mut grid = Grid::new();
        for y in 0..GRID_SIDE {
            for x in 0..GRID_SIDE {
                let value = cells[(x + y * GRID_SIDE) as usize];
                let nibble = if value == WALL_IMPORT {
                    WALL
                } else if value <= MAX_FLAGS {
                    value
                } else {
                    return Err(WorldError::BadCell { x, y, value });
                };
                grid.set(x, y, nibble);
            }
        }

        let [px, py, d, hx, hy] = *record;
        let dir = Direction::from_index(d).ok_or(WorldError::BadDirection(d))?;
        for &(x, y) in &[(px, py), (hx, hy)] {
            if x >= GRID_SIDE || y >= GRID_SIDE {
                return Err(WorldError::OutOfRange { x, y });
            }
        }
        // A robot inside a wall would let PLACE overflow the nibble; reject it
        // here rather than trust every caller.
        if grid.get(px, py) == WALL {
            return Err(WorldError::RobotOnWall { x: px, y: py });
        }

        Ok(Self {
            grid,
            robot: Robot {
                x: px,
                y: py,
                dir,
                home_x: hx,
                home_y: hy,
            },
        })
    }

    /// Write the grid into `out` with the inverse translation of
    /// [`World::import`]: wall nibbles become 255.
    pub fn export_into(&self, out: &mut [u8]) -> Result<(), WorldError> {
        if out.len() != CELL_COUNT {
            return Err(WorldError::BadLength {
                expected: CELL_COUNT,
                got: out.len(),
            });
        }
        for y in 0..GRID_SIDE {
            for x in 0..GRID_SIDE {
                let nibble = self.grid.get(x, y);
                out[(x + y * GRID_SIDE) as usize] =
                    if nibble == WALL { WALL_IMPORT } else { nibble };
            }
        }
        Ok(())
    }

    /// The robot state as an export record, same layout as import.
    pub fn robot_record(&self) -> RobotRecord {
        [
            self.robot.x,
            self.robot.y,
            self.robot.dir.index(),
            self.robot.home_x,
            self.robot.home_y,
        ]
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cells() -> Vec<u8> {
        vec![0; CELL_COUNT]
    }

    #[test]
    fn import_export_round_trip() {
        let mut cells = empty_cells();
        cells[0] = 3;
        cells[(7 + 4 * GRID_SIDE) as usize] = WALL_IMPORT;
        cells[CELL_COUNT - 1] = MAX_FLAGS;

        let world = World::import(&cells, &[5, 5, 0, 5, 5]).unwrap();
        let mut out = vec![0u8; CELL_COUNT];
        world.export_into(&mut out).unwrap();
        assert_eq!(out, cells);
    }

    #[test]
    fn import_translates_wall_marker() {
        let mut cells = empty_cells();
        cells[(2 + 3 * GRID_SIDE) as usize] = WALL_IMPORT;
        let world = World::import(&cells, &[0, 0, 0, 0, 0]).unwrap();
        assert_eq!(world.grid.get(2, 3), WALL);
    }

    #[test]
    fn import_rejects_bad_cell() {
        let mut cells = empty_cells();
        cells[10] = 9; // above MAX_FLAGS, not the wall marker
        let err = World::import(&cells, &[0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            WorldError::BadCell {
                x: 10,
                y: 0,
                value: 9
            }
        );
    }

    #[test]
    fn import_rejects_bad_length() {
        let err = World::import(&[0u8; 10], &[0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, WorldError::BadLength { got: 10, .. }));
    }

    #[test]
    fn import_rejects_bad_robot() {
        let cells = empty_cells();
        assert_eq!(
            World::import(&cells, &[0, 0, 4, 0, 0]).unwrap_err(),
            WorldError::BadDirection(4)
        );
        assert_eq!(
            World::import(&cells, &[GRID_SIDE, 0, 0, 0, 0]).unwrap_err(),
            WorldError::OutOfRange { x: GRID_SIDE, y: 0 }
        );
        assert_eq!(
            World::import(&cells, &[0, 0, 0, 0, GRID_SIDE]).unwrap_err(),
            WorldError::OutOfRange { x: 0, y: GRID_SIDE }
        );
    }

    #[test]
    fn import_rejects_robot_on_wall() {
        let mut cells = empty_cells();
        cells[(5 + 5 * GRID_SIDE) as usize] = WALL_IMPORT;
        let err = World::import(&cells, &[5, 5, 0, 5, 5]).unwrap_err();
        assert_eq!(err, WorldError::RobotOnWall { x: 5, y: 5 });
    }

    #[test]
    fn robot_record_round_trip() {
        let record = [3, 4, 2, 6, 7];
        let world = World::import(&empty_cells(), &record).unwrap();
        assert_eq!(world.robot_record(), record);
    }
}

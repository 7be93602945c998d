//! TOML world files for the command-line host.
//!
//! ```toml
//! rows = [
//!     "....................",
//!     # ... GRID_SIDE rows of GRID_SIDE cells, listed top to bottom ...
//! ]
//!
//! [robot]
//! x = 5
//! y = 5
//! dir = "north"
//! home_x = 5
//! home_y = 5
//! ```
//!
//! Row characters: `.` or `0` for an empty cell, `1`..`8` for flag counts,
//! `#` for a wall. Rows read top to bottom for legibility; the loader flips
//! them into the bottom-left-origin import layout.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use karel_session::{GRID_SIDE, RobotRecord, WALL_IMPORT};

#[derive(Debug, Deserialize)]
pub struct WorldFile {
    rows: Vec<String>,
    robot: RobotSpec,
}

#[derive(Debug, Deserialize)]
struct RobotSpec {
    x: u32,
    y: u32,
    dir: String,
    home_x: u32,
    home_y: u32,
}

#[derive(Debug, Error)]
pub enum WorldFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("expected {GRID_SIDE} rows, got {0}")]
    RowCount(usize),

    #[error("row {row} has {got} cells, expected {GRID_SIDE}")]
    RowWidth { row: usize, got: usize },

    #[error("invalid cell character '{c}' in row {row}")]
    BadCell { row: usize, c: char },

    #[error("invalid facing '{0}' (expected north, west, south, or east)")]
    BadFacing(String),
}

impl WorldFile {
    pub fn load(path: &Path) -> Result<Self, WorldFileError> {
        let text = std::fs::read_to_string(path).map_err(|e| WorldFileError::Io {
            path: path.to_owned(),
            source: e,
        })?;
        Self::parse(&text).map_err(|e| match e {
            WorldFileError::Parse { source, .. } => WorldFileError::Parse {
                path: path.to_owned(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self, WorldFileError> {
        toml::from_str(text).map_err(|e| WorldFileError::Parse {
            path: PathBuf::new(),
            source: e,
        })
    }

    /// Translate into the facade's import buffer and robot record.
    pub fn to_import(&self) -> Result<(Vec<u8>, RobotRecord), WorldFileError> {
        if self.rows.len() != GRID_SIDE as usize {
            return Err(WorldFileError::RowCount(self.rows.len()));
        }

        let mut cells = vec![0u8; (GRID_SIDE * GRID_SIDE) as usize];
        for (row, text) in self.rows.iter().enumerate() {
            let chars: Vec<char> = text.chars().collect();
            if chars.len() != GRID_SIDE as usize {
                return Err(WorldFileError::RowWidth {
                    row,
                    got: chars.len(),
                });
            }
            // Row 0 of the file is the top of the map: y = GRID_SIDE - 1.
            let y = GRID_SIDE - 1 - row as u32;
            for (x, &c) in chars.iter().enumerate() {
                let value = match c {
                    '.' | '0' => 0,
                    '1'..='8' => c as u8 - b'0',
                    '#' => WALL_IMPORT,
                    _ => return Err(WorldFileError::BadCell { row, c }),
                };
                cells[x + (y * GRID_SIDE) as usize] = value;
            }
        }

        let dir = match self.robot.dir.to_ascii_lowercase().as_str() {
            "north" => 0,
            "west" => 1,
            "south" => 2,
            "east" => 3,
            other => return Err(WorldFileError::BadFacing(other.to_owned())),
        };

        Ok((
            cells,
            [
                self.robot.x,
                self.robot.y,
                dir,
                self.robot.home_x,
                self.robot.home_y,
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_toml(rows: &[String]) -> String {
        let mut text = String::from("rows = [\n");
        for row in rows {
            text.push_str(&format!("    \"{}\",\n", row));
        }
        text.push_str("]\n\n[robot]\nx = 5\ny = 5\ndir = \"east\"\nhome_x = 5\nhome_y = 5\n");
        text
    }

    fn empty_rows() -> Vec<String> {
        vec![".".repeat(GRID_SIDE as usize); GRID_SIDE as usize]
    }

    #[test]
    fn parses_empty_world() {
        let file = WorldFile::parse(&world_toml(&empty_rows())).unwrap();
        let (cells, robot) = file.to_import().unwrap();
        assert!(cells.iter().all(|&c| c == 0));
        assert_eq!(robot, [5, 5, 3, 5, 5]);
    }

    #[test]
    fn flips_rows_to_bottom_left_origin() {
        let mut rows = empty_rows();
        // Top-left corner of the file is cell (0, GRID_SIDE-1).
        rows[0].replace_range(0..1, "#");
        // Bottom row of the file, third column: cell (2, 0).
        let last = rows.len() - 1;
        rows[last].replace_range(2..3, "5");

        let (cells, _) = WorldFile::parse(&world_toml(&rows)).unwrap().to_import().unwrap();
        assert_eq!(cells[((GRID_SIDE - 1) * GRID_SIDE) as usize], WALL_IMPORT);
        assert_eq!(cells[2], 5);
    }

    #[test]
    fn rejects_wrong_row_count() {
        let mut rows = empty_rows();
        rows.pop();
        let err = WorldFile::parse(&world_toml(&rows)).unwrap().to_import().unwrap_err();
        assert!(matches!(err, WorldFileError::RowCount(19)));
    }

    #[test]
    fn rejects_wrong_row_width() {
        let mut rows = empty_rows();
        rows[3].pop();
        let err = WorldFile::parse(&world_toml(&rows)).unwrap().to_import().unwrap_err();
        assert!(matches!(err, WorldFileError::RowWidth { row: 3, .. }));
    }

    #[test]
    fn rejects_unknown_cell_character() {
        let mut rows = empty_rows();
        rows[0].replace_range(0..1, "x");
        let err = WorldFile::parse(&world_toml(&rows)).unwrap().to_import().unwrap_err();
        assert!(matches!(err, WorldFileError::BadCell { row: 0, c: 'x' }));
    }

    #[test]
    fn rejects_unknown_facing() {
        let text = world_toml(&empty_rows()).replace("east", "up");
        let err = WorldFile::parse(&text).unwrap().to_import().unwrap_err();
        assert!(matches!(err, WorldFileError::BadFacing(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            WorldFile::parse("rows = ["),
            Err(WorldFileError::Parse { .. })
        ));
    }
}

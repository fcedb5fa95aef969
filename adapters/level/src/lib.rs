#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level adapter that turns textual level encodings into core layouts.
//!
//! A level string lists the rows of the grid from top to bottom, each row
//! terminated by `_`. Every character is one tile:
//!
//! | Character | Tile |
//! |-----------|------|
//! | `1` | wall |
//! | `a` `b` `c` `d` | floor holding a yellow, red, blue or green box |
//! | `A` `B` `C` `D` | push target of that color |
//! | `^` `>` `v` `<` | floor where the robot starts, facing up, right, down or left |
//! | anything else | floor |
//!
//! Line breaks and the surrounding indentation are ignored so levels can be
//! written one row per line in TOML packs.

mod pack;

use temporal_bot_core::{
    BoxColor, BoxPlacement, CellCoord, CellKind, Direction, Grid, LayoutError, LevelLayout,
    Placement, TargetCell,
};
use thiserror::Error;

pub use pack::{LevelDefinition, LevelPack, LevelPackError};

const ROW_TERMINATOR: char = '_';
const WALL: char = '1';

/// Parses a level string into a validated layout.
pub fn parse_layout(source: &str) -> Result<LevelLayout, LevelParseError> {
    let normalized: String = source.lines().map(str::trim).collect();
    let Some(width) = normalized.chars().position(|tile| tile == ROW_TERMINATOR) else {
        return Err(LevelParseError::MissingRowTerminator);
    };
    if width == 0 {
        return Err(LevelParseError::EmptyRow);
    }

    let mut pieces: Vec<&str> = normalized.split(ROW_TERMINATOR).collect();
    match pieces.pop() {
        Some("") => {}
        _ => return Err(LevelParseError::TrailingTiles),
    }

    let mut rows = Vec::with_capacity(pieces.len());
    let mut starts = Vec::new();
    let mut boxes = Vec::new();
    let mut targets = Vec::new();

    for (row_index, piece) in pieces.iter().enumerate() {
        let found = piece.chars().count();
        if found != width {
            return Err(LevelParseError::RaggedRow {
                row: row_index,
                expected: width,
                found,
            });
        }

        let mut row = Vec::with_capacity(width);
        for (column_index, tile) in piece.chars().enumerate() {
            let cell = CellCoord::new(column_index as u32, row_index as u32);
            let kind = match tile {
                WALL => CellKind::Wall,
                _ => {
                    if let Some(color) = box_color(tile) {
                        boxes.push(BoxPlacement { cell, color });
                        CellKind::Floor
                    } else if let Some(color) = target_color(tile) {
                        targets.push(TargetCell::new(cell, color));
                        CellKind::PushTarget
                    } else {
                        if let Some(facing) = robot_facing(tile) {
                            starts.push(Placement { cell, facing });
                        }
                        CellKind::Floor
                    }
                }
            };
            row.push(kind);
        }
        rows.push(row);
    }

    let start = match starts.as_slice() {
        [] => return Err(LevelParseError::MissingRobot),
        [start] => *start,
        _ => {
            return Err(LevelParseError::MultipleRobots {
                count: starts.len(),
            })
        }
    };

    let grid = Grid::from_rows(rows)?;
    Ok(LevelLayout::new(grid, start, boxes, targets)?)
}

fn box_color(tile: char) -> Option<BoxColor> {
    match tile {
        'a' => Some(BoxColor::Yellow),
        'b' => Some(BoxColor::Red),
        'c' => Some(BoxColor::Blue),
        'd' => Some(BoxColor::Green),
        _ => None,
    }
}

fn target_color(tile: char) -> Option<BoxColor> {
    box_color(tile.to_ascii_lowercase()).filter(|_| tile.is_ascii_uppercase())
}

fn robot_facing(tile: char) -> Option<Direction> {
    match tile {
        '^' => Some(Direction::Up),
        '>' => Some(Direction::Right),
        'v' => Some(Direction::Down),
        '<' => Some(Direction::Left),
        _ => None,
    }
}

/// Reasons a level string is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelParseError {
    /// The string contained no `_` row terminator.
    #[error("level string has no `_` row terminator")]
    MissingRowTerminator,
    /// The first row contained no tiles.
    #[error("first level row is empty")]
    EmptyRow,
    /// A row differed in width from the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// Tiles followed the final row terminator.
    #[error("tiles follow the final `_` row terminator")]
    TrailingTiles,
    /// No robot start was present.
    #[error("level has no robot start")]
    MissingRobot,
    /// More than one robot start was present.
    #[error("level has {count} robot starts, expected exactly one")]
    MultipleRobots {
        /// Number of robot starts found.
        count: usize,
    },
    /// The decoded tiles formed an invalid layout.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_push_level() {
        let layout = parse_layout("11111_1>aA1_11111_").expect("valid level");

        assert_eq!(layout.grid().columns(), 5);
        assert_eq!(layout.grid().rows(), 3);
        assert_eq!(
            layout.start(),
            Placement {
                cell: CellCoord::new(1, 1),
                facing: Direction::Right,
            }
        );
        assert_eq!(
            layout.boxes(),
            &[BoxPlacement {
                cell: CellCoord::new(2, 1),
                color: BoxColor::Yellow,
            }]
        );
        assert_eq!(
            layout.targets(),
            &[TargetCell::new(CellCoord::new(3, 1), BoxColor::Yellow)]
        );
        assert_eq!(
            layout.grid().cell_kind(CellCoord::new(3, 1)),
            CellKind::PushTarget
        );
        assert_eq!(layout.grid().cell_kind(CellCoord::new(4, 1)), CellKind::Wall);
    }

    #[test]
    fn ignores_line_breaks_and_indentation() {
        let source = "
            11111_
            1v.B1_
            1.b.1_
            11111_
        ";
        let layout = parse_layout(source).expect("valid level");
        assert_eq!(layout.grid().rows(), 4);
        assert_eq!(layout.start().facing, Direction::Down);
        assert_eq!(layout.boxes()[0].color, BoxColor::Red);
    }

    #[test]
    fn unknown_characters_are_floor() {
        let layout = parse_layout("1111_1*^1_1111_").expect("valid level");
        assert_eq!(layout.grid().cell_kind(CellCoord::new(1, 1)), CellKind::Floor);
    }

    #[test]
    fn placeholder_level_without_robot_is_rejected() {
        assert_eq!(
            parse_layout("111_1*1_111_"),
            Err(LevelParseError::MissingRobot)
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert_eq!(
            parse_layout("1111_1>1_1111_"),
            Err(LevelParseError::RaggedRow {
                row: 1,
                expected: 4,
                found: 3,
            })
        );
    }

    #[test]
    fn multiple_robots_are_rejected() {
        assert_eq!(
            parse_layout("11111_1>^.1_11111_"),
            Err(LevelParseError::MultipleRobots { count: 2 })
        );
    }

    #[test]
    fn trailing_tiles_and_missing_terminators_are_rejected() {
        assert_eq!(
            parse_layout("111_1>1_111"),
            Err(LevelParseError::TrailingTiles)
        );
        assert_eq!(
            parse_layout("1>1"),
            Err(LevelParseError::MissingRowTerminator)
        );
        assert_eq!(parse_layout("_"), Err(LevelParseError::EmptyRow));
    }
}

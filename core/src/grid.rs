//! Static tile map and level layout contracts.

use thiserror::Error;

use crate::{BoxColor, CellCoord, Direction, TargetCell};

/// Kinds of terrain a grid cell may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Impassable wall.
    Wall,
    /// Walkable floor.
    Floor,
    /// Walkable floor marked as the resting place for a colored box.
    PushTarget,
}

impl CellKind {
    /// Reports whether movables may enter cells of this kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Immutable rectangular tile map loaded once per level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Builds a grid from row-major cell rows.
    ///
    /// Every row must have the same width and at least one cell must be walkable.
    pub fn from_rows(rows: Vec<Vec<CellKind>>) -> Result<Self, LayoutError> {
        let Some(first) = rows.first() else {
            return Err(LayoutError::EmptyGrid);
        };
        let width = first.len();
        if width == 0 {
            return Err(LayoutError::EmptyGrid);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LayoutError::RaggedRow {
                    row: index,
                    expected: width,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }

        if !cells.iter().any(|cell| cell.is_walkable()) {
            return Err(LayoutError::NoWalkableCells);
        }

        let columns = u32::try_from(width).map_err(|_| LayoutError::TooLarge)?;
        let row_count = u32::try_from(rows.len()).map_err(|_| LayoutError::TooLarge)?;

        Ok(Self {
            columns,
            rows: row_count,
            cells,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns the kind of the provided cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Returns the kind of the provided cell.
    ///
    /// # Panics
    ///
    /// Panics when the cell lies outside the grid. Valid levels are walled in, so
    /// callers never step off the map.
    #[must_use]
    pub fn cell_kind(&self, cell: CellCoord) -> CellKind {
        match self.get(cell) {
            Some(kind) => kind,
            None => panic!(
                "cell ({}, {}) lies outside the {}x{} grid",
                cell.column(),
                cell.row(),
                self.columns,
                self.rows
            ),
        }
    }

    /// Reports whether movables may enter the cell. Cells outside the grid are never walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.get(cell).map_or(false, CellKind::is_walkable)
    }

    /// Iterates over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellKind)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), *kind)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Cell and facing a robot occupies when it enters the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Cell the robot appears on.
    pub cell: CellCoord,
    /// Direction the robot faces when it appears.
    pub facing: Direction,
}

/// Initial placement of a pushable box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoxPlacement {
    /// Cell the box rests on at level start.
    pub cell: CellCoord,
    /// Color tag matched against target cells.
    pub color: BoxColor,
}

/// Pre-parsed level: terrain, robot start, box placements, and colored targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelLayout {
    grid: Grid,
    start: Placement,
    boxes: Vec<BoxPlacement>,
    targets: Vec<TargetCell>,
}

impl LevelLayout {
    /// Validates placements against the grid and assembles a layout.
    pub fn new(
        grid: Grid,
        start: Placement,
        boxes: Vec<BoxPlacement>,
        targets: Vec<TargetCell>,
    ) -> Result<Self, LayoutError> {
        ensure_walkable(&grid, start.cell)?;

        let mut occupied = vec![start.cell];
        for placement in &boxes {
            ensure_walkable(&grid, placement.cell)?;
            if occupied.contains(&placement.cell) {
                return Err(LayoutError::OverlappingPlacements {
                    column: placement.cell.column(),
                    row: placement.cell.row(),
                });
            }
            occupied.push(placement.cell);
        }

        for target in &targets {
            let cell = target.cell();
            ensure_walkable(&grid, cell)?;
            if grid.get(cell) != Some(CellKind::PushTarget) {
                return Err(LayoutError::TargetOffPad {
                    column: cell.column(),
                    row: cell.row(),
                });
            }
        }

        Ok(Self {
            grid,
            start,
            boxes,
            targets,
        })
    }

    /// Terrain of the level.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cell and facing every robot spawns with.
    #[must_use]
    pub const fn start(&self) -> Placement {
        self.start
    }

    /// Initial box placements in level order.
    #[must_use]
    pub fn boxes(&self) -> &[BoxPlacement] {
        &self.boxes
    }

    /// Colored target cells that must be covered to win.
    #[must_use]
    pub fn targets(&self) -> &[TargetCell] {
        &self.targets
    }
}

fn ensure_walkable(grid: &Grid, cell: CellCoord) -> Result<(), LayoutError> {
    match grid.get(cell) {
        None => Err(LayoutError::PlacementOutOfBounds {
            column: cell.column(),
            row: cell.row(),
        }),
        Some(CellKind::Wall) => Err(LayoutError::PlacementOnWall {
            column: cell.column(),
            row: cell.row(),
        }),
        Some(_) => Ok(()),
    }
}

/// Reasons a grid or level layout is rejected at load time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The grid contained no cells.
    #[error("grid contains no cells")]
    EmptyGrid,
    /// A row differed in width from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// Every cell was a wall.
    #[error("grid has no walkable cells")]
    NoWalkableCells,
    /// Grid dimensions exceed the coordinate range.
    #[error("grid dimensions exceed the supported coordinate range")]
    TooLarge,
    /// A placement referenced a cell outside the grid.
    #[error("placement at ({column}, {row}) lies outside the grid")]
    PlacementOutOfBounds {
        /// Column of the placement.
        column: u32,
        /// Row of the placement.
        row: u32,
    },
    /// A placement referenced a wall cell.
    #[error("placement at ({column}, {row}) sits on a wall")]
    PlacementOnWall {
        /// Column of the placement.
        column: u32,
        /// Row of the placement.
        row: u32,
    },
    /// A colored target referenced a cell that is not a push target.
    #[error("target at ({column}, {row}) is not on a push target cell")]
    TargetOffPad {
        /// Column of the target.
        column: u32,
        /// Row of the target.
        row: u32,
    },
    /// Two movables were placed on the same cell.
    #[error("more than one movable placed at ({column}, {row})")]
    OverlappingPlacements {
        /// Column of the shared cell.
        column: u32,
        /// Row of the shared cell.
        row: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_rows() -> Vec<Vec<CellKind>> {
        use CellKind::{Floor as F, Wall as W};
        vec![
            vec![W, W, W, W, W],
            vec![W, F, F, F, W],
            vec![W, F, F, F, W],
            vec![W, W, W, W, W],
        ]
    }

    #[test]
    fn grid_reports_dimensions_and_kinds() {
        let grid = Grid::from_rows(open_rows()).expect("valid grid");
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cell_kind(CellCoord::new(0, 0)), CellKind::Wall);
        assert_eq!(grid.cell_kind(CellCoord::new(2, 1)), CellKind::Floor);
        assert!(grid.get(CellCoord::new(5, 0)).is_none());
        assert!(!grid.is_walkable(CellCoord::new(9, 9)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut rows = open_rows();
        let _ = rows[2].pop();
        assert_eq!(
            Grid::from_rows(rows),
            Err(LayoutError::RaggedRow {
                row: 2,
                expected: 5,
                found: 4,
            })
        );
    }

    #[test]
    fn all_wall_grid_is_rejected() {
        let rows = vec![vec![CellKind::Wall; 3]; 3];
        assert_eq!(Grid::from_rows(rows), Err(LayoutError::NoWalkableCells));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn cell_kind_panics_out_of_bounds() {
        let grid = Grid::from_rows(open_rows()).expect("valid grid");
        let _ = grid.cell_kind(CellCoord::new(7, 1));
    }

    #[test]
    fn iter_walks_row_major() {
        let grid = Grid::from_rows(open_rows()).expect("valid grid");
        let cells: Vec<_> = grid.iter().map(|(cell, _)| cell).take(6).collect();
        assert_eq!(cells[4], CellCoord::new(4, 0));
        assert_eq!(cells[5], CellCoord::new(0, 1));
    }

    #[test]
    fn layout_rejects_overlapping_box_and_start() {
        let grid = Grid::from_rows(open_rows()).expect("valid grid");
        let start = Placement {
            cell: CellCoord::new(1, 1),
            facing: Direction::Down,
        };
        let boxes = vec![BoxPlacement {
            cell: CellCoord::new(1, 1),
            color: BoxColor::Yellow,
        }];
        assert_eq!(
            LevelLayout::new(grid, start, boxes, Vec::new()),
            Err(LayoutError::OverlappingPlacements { column: 1, row: 1 })
        );
    }

    #[test]
    fn layout_rejects_start_on_wall() {
        let grid = Grid::from_rows(open_rows()).expect("valid grid");
        let start = Placement {
            cell: CellCoord::new(0, 1),
            facing: Direction::Up,
        };
        assert_eq!(
            LevelLayout::new(grid, start, Vec::new(), Vec::new()),
            Err(LayoutError::PlacementOnWall { column: 0, row: 1 })
        );
    }

    #[test]
    fn layout_rejects_target_on_plain_floor() {
        let mut rows = open_rows();
        rows[2][3] = CellKind::PushTarget;
        let grid = Grid::from_rows(rows).expect("valid grid");
        let start = Placement {
            cell: CellCoord::new(1, 1),
            facing: Direction::Right,
        };
        let on_pad = vec![TargetCell::new(CellCoord::new(3, 2), BoxColor::Red)];
        assert!(LevelLayout::new(grid.clone(), start, Vec::new(), on_pad).is_ok());

        let off_pad = vec![TargetCell::new(CellCoord::new(2, 2), BoxColor::Red)];
        assert_eq!(
            LevelLayout::new(grid, start, Vec::new(), off_pad),
            Err(LayoutError::TargetOffPad { column: 2, row: 2 })
        );
    }
}

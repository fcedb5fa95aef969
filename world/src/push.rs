//! Push chain resolution.
//!
//! A move walks the occupancy chain ahead of the mover one cell at a time,
//! collecting every movable that would be displaced. The whole chain advances
//! together or not at all.

use std::{collections::BTreeSet, time::Duration};

use temporal_bot_core::{BlockReason, CellCoord, CellKind, Direction, Grid, Intent, MovableId};
use tracing::{debug, warn};

use crate::{
    movable::{Movable, PushBox},
    timeline::Robot,
};

/// Mutable view over every movable on the board.
pub(crate) struct Bodies<'a> {
    pub(crate) robots: &'a mut [Robot],
    pub(crate) boxes: &'a mut [PushBox],
}

impl Bodies<'_> {
    fn get(&self, id: MovableId) -> Option<&Movable> {
        match id {
            MovableId::Robot(robot) => self
                .robots
                .iter()
                .find(|candidate| candidate.id == robot)
                .map(|candidate| &candidate.body),
            MovableId::Box(target) => self
                .boxes
                .iter()
                .find(|candidate| candidate.id == target)
                .map(|candidate| &candidate.body),
        }
    }

    fn get_mut(&mut self, id: MovableId) -> Option<&mut Movable> {
        match id {
            MovableId::Robot(robot) => self
                .robots
                .iter_mut()
                .find(|candidate| candidate.id == robot)
                .map(|candidate| &mut candidate.body),
            MovableId::Box(target) => self
                .boxes
                .iter_mut()
                .find(|candidate| candidate.id == target)
                .map(|candidate| &mut candidate.body),
        }
    }

    /// Visible movable standing on `cell`, if any.
    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<MovableId> {
        occupant(self.robots, self.boxes, cell)
    }
}

/// Visible movable standing on `cell` among the provided robots and boxes.
pub(crate) fn occupant(robots: &[Robot], boxes: &[PushBox], cell: CellCoord) -> Option<MovableId> {
    let mut found = robots
        .iter()
        .filter(|robot| robot.body.visible() && robot.body.cell() == cell)
        .map(|robot| MovableId::Robot(robot.id))
        .chain(
            boxes
                .iter()
                .filter(|pushable| pushable.body.visible() && pushable.body.cell() == cell)
                .map(|pushable| MovableId::Box(pushable.id)),
        );
    let first = found.next();
    debug_assert!(
        found.next().is_none(),
        "more than one visible movable on ({}, {})",
        cell.column(),
        cell.row()
    );
    first
}

/// Single step of a movable displaced by a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Displacement {
    pub(crate) movable: MovableId,
    pub(crate) from: CellCoord,
    pub(crate) to: CellCoord,
}

/// Outcome of executing one intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// The mover stepped forward. `pushed` lists the rest of the chain, nearest first.
    Advanced {
        from: CellCoord,
        to: CellCoord,
        pushed: Vec<Displacement>,
    },
    /// The mover executed its rewind marker and left the board.
    Vanished { cell: CellCoord },
    /// Nothing moved. The mover may have turned toward the direction.
    Blocked(BlockReason),
}

/// Executes `intent` for `mover` against the grid and the other movables.
pub(crate) fn resolve(
    bodies: &mut Bodies<'_>,
    grid: &Grid,
    mover: MovableId,
    intent: Intent,
    now: Duration,
) -> Option<Resolution> {
    let direction = match intent {
        Intent::Rewind => {
            let body = bodies.get_mut(mover)?;
            body.vanish();
            return Some(Resolution::Vanished { cell: body.cell() });
        }
        Intent::Move(direction) => direction,
    };

    let origin = bodies.get(mover)?.cell();
    let chain = plan_chain(grid, mover, origin, direction, |cell| bodies.occupant(cell));

    match chain {
        Ok(chain) => {
            for (index, step) in chain.iter().enumerate() {
                let Some(body) = bodies.get_mut(step.movable) else {
                    continue;
                };
                let reorient = index == 0 && body.facing() != direction;
                body.advance_to(step.to, direction, reorient, now);
            }

            let mut steps = chain.into_iter();
            let lead = steps.next()?;
            Some(Resolution::Advanced {
                from: lead.from,
                to: lead.to,
                pushed: steps.collect(),
            })
        }
        Err(reason) => {
            let body = bodies.get_mut(mover)?;
            if body.facing() != direction {
                body.turn_toward(direction, now);
            }
            Some(Resolution::Blocked(reason))
        }
    }
}

/// Collects the movables that a step from `origin` toward `direction` displaces.
///
/// Fails when any member of the chain faces a wall or the grid edge, or when the
/// chain reaches a movable it already contains.
fn plan_chain<F>(
    grid: &Grid,
    mover: MovableId,
    origin: CellCoord,
    direction: Direction,
    occupant: F,
) -> Result<Vec<Displacement>, BlockReason>
where
    F: Fn(CellCoord) -> Option<MovableId>,
{
    let mut chain = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = mover;
    let mut from = origin;

    loop {
        if !seen.insert(current) {
            debug!(?current, "push chain revisited a movable");
            return Err(BlockReason::Cycle);
        }

        let Some(to) = from.neighbor(direction).filter(|cell| grid.contains(*cell)) else {
            warn!(
                column = from.column(),
                row = from.row(),
                ?direction,
                "push chain stepped off the grid"
            );
            return Err(BlockReason::OutOfBounds);
        };

        if grid.cell_kind(to) == CellKind::Wall {
            return Err(BlockReason::Wall);
        }

        chain.push(Displacement {
            movable: current,
            from,
            to,
        });

        match occupant(to) {
            Some(next) => {
                current = next;
                from = to;
            }
            None => return Ok(chain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temporal_bot_core::{BoxColor, BoxId, Placement, RobotId};

    fn open_grid() -> Grid {
        use CellKind::{Floor as F, Wall as W};
        Grid::from_rows(vec![
            vec![W, W, W, W, W, W],
            vec![W, F, F, F, F, W],
            vec![W, F, F, F, F, W],
            vec![W, W, W, W, W, W],
        ])
        .expect("valid grid")
    }

    fn robot(id: u32, column: u32, row: u32) -> Robot {
        Robot::founder(
            RobotId::new(id),
            Placement {
                cell: CellCoord::new(column, row),
                facing: Direction::Down,
            },
        )
    }

    fn crate_at(id: u32, column: u32, row: u32) -> PushBox {
        PushBox::new(BoxId::new(id), CellCoord::new(column, row), BoxColor::Yellow)
    }

    fn step(
        robots: &mut [Robot],
        boxes: &mut [PushBox],
        direction: Direction,
    ) -> Option<Resolution> {
        let grid = open_grid();
        let mover = MovableId::Robot(robots[0].id);
        let mut bodies = Bodies { robots, boxes };
        resolve(
            &mut bodies,
            &grid,
            mover,
            Intent::Move(direction),
            Duration::ZERO,
        )
    }

    #[test]
    fn wall_blocks_and_reorients() {
        let mut robots = vec![robot(0, 1, 1)];
        let mut boxes = Vec::new();

        let resolution = step(&mut robots, &mut boxes, Direction::Up);

        assert_eq!(resolution, Some(Resolution::Blocked(BlockReason::Wall)));
        assert_eq!(robots[0].body.cell(), CellCoord::new(1, 1));
        assert_eq!(robots[0].body.facing(), Direction::Up);
        assert!(robots[0].body.presentation().turning);
        assert!(!robots[0].body.presentation().moving);
    }

    #[test]
    fn single_box_moves_with_robot() {
        let mut robots = vec![robot(0, 1, 1)];
        let mut boxes = vec![crate_at(0, 2, 1)];

        let resolution = step(&mut robots, &mut boxes, Direction::Right);

        assert_eq!(
            resolution,
            Some(Resolution::Advanced {
                from: CellCoord::new(1, 1),
                to: CellCoord::new(2, 1),
                pushed: vec![Displacement {
                    movable: MovableId::Box(BoxId::new(0)),
                    from: CellCoord::new(2, 1),
                    to: CellCoord::new(3, 1),
                }],
            })
        );
        assert_eq!(robots[0].body.cell(), CellCoord::new(2, 1));
        assert_eq!(boxes[0].body.cell(), CellCoord::new(3, 1));
        assert_eq!(boxes[0].body.facing(), Direction::Up, "pushed boxes keep facing");
    }

    #[test]
    fn blocked_box_moves_nothing() {
        let mut robots = vec![robot(0, 2, 1)];
        let mut boxes = vec![crate_at(0, 3, 1), crate_at(1, 4, 1)];

        let resolution = step(&mut robots, &mut boxes, Direction::Right);

        assert_eq!(resolution, Some(Resolution::Blocked(BlockReason::Wall)));
        assert_eq!(robots[0].body.cell(), CellCoord::new(2, 1));
        assert_eq!(boxes[0].body.cell(), CellCoord::new(3, 1));
        assert_eq!(boxes[1].body.cell(), CellCoord::new(4, 1));
    }

    #[test]
    fn chain_of_boxes_advances_together() {
        let mut robots = vec![robot(0, 1, 2)];
        let mut boxes = vec![crate_at(0, 2, 2), crate_at(1, 3, 2)];

        let resolution = step(&mut robots, &mut boxes, Direction::Right);

        let Some(Resolution::Advanced { pushed, .. }) = resolution else {
            panic!("expected the chain to advance, got {resolution:?}");
        };
        assert_eq!(pushed.len(), 2);
        assert_eq!(boxes[0].body.cell(), CellCoord::new(3, 2));
        assert_eq!(boxes[1].body.cell(), CellCoord::new(4, 2));
    }

    #[test]
    fn robot_pushes_robot_without_turning_it() {
        let mut robots = vec![robot(0, 1, 1), robot(1, 2, 1)];
        let mut boxes = Vec::new();

        let resolution = step(&mut robots, &mut boxes, Direction::Right);

        assert!(matches!(
            resolution,
            Some(Resolution::Advanced { ref pushed, .. }) if pushed.len() == 1
        ));
        assert_eq!(robots[0].body.cell(), CellCoord::new(2, 1));
        assert_eq!(robots[0].body.facing(), Direction::Right);
        assert_eq!(robots[1].body.cell(), CellCoord::new(3, 1));
        assert_eq!(robots[1].body.facing(), Direction::Down);
        assert!(!robots[1].body.presentation().turning);
    }

    #[test]
    fn hidden_movables_do_not_block() {
        let mut robots = vec![robot(0, 1, 1), robot(1, 2, 1)];
        let mut boxes = Vec::new();
        robots[1].body.vanish();

        let resolution = step(&mut robots, &mut boxes, Direction::Right);

        assert!(matches!(
            resolution,
            Some(Resolution::Advanced { ref pushed, .. }) if pushed.is_empty()
        ));
        assert_eq!(robots[1].body.cell(), CellCoord::new(2, 1));
    }

    #[test]
    fn rewind_vanishes_without_consulting_grid() {
        let mut robots = vec![robot(0, 1, 1)];
        let mut boxes = Vec::new();
        let grid = open_grid();
        let mut bodies = Bodies {
            robots: &mut robots,
            boxes: &mut boxes,
        };

        let resolution = resolve(
            &mut bodies,
            &grid,
            MovableId::Robot(RobotId::new(0)),
            Intent::Rewind,
            Duration::ZERO,
        );

        assert_eq!(
            resolution,
            Some(Resolution::Vanished {
                cell: CellCoord::new(1, 1)
            })
        );
        assert!(!robots[0].body.visible());
    }

    #[test]
    fn revisiting_a_movable_blocks_the_chain() {
        let grid = open_grid();
        let mover = MovableId::Robot(RobotId::new(0));
        let looping = MovableId::Box(BoxId::new(0));

        let chain = plan_chain(&grid, mover, CellCoord::new(1, 1), Direction::Right, |cell| {
            if cell == CellCoord::new(2, 1) {
                Some(looping)
            } else {
                Some(mover)
            }
        });

        assert_eq!(chain, Err(BlockReason::Cycle));
    }

    #[test]
    fn stepping_off_the_grid_is_blocked() {
        use CellKind::Floor as F;
        let grid = Grid::from_rows(vec![vec![F, F]]).expect("valid grid");

        let chain = plan_chain(
            &grid,
            MovableId::Robot(RobotId::new(0)),
            CellCoord::new(1, 0),
            Direction::Right,
            |_| None,
        );

        assert_eq!(chain, Err(BlockReason::OutOfBounds));
    }
}

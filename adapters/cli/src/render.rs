//! Plain-text presentation of the board.

use std::fmt::Write as _;

use temporal_bot_core::{BoxColor, CellCoord, CellKind, Direction};
use temporal_bot_system_scoring::format_time;
use temporal_bot_world::{query, World};

const WALL: char = '#';
const FLOOR: char = '.';
const REPLAY_ROBOT: char = '@';
const COVERED_TARGET: char = '*';

/// Draws the board one row per line.
///
/// The active robot is an arrow showing its facing, replayed robots are `@`,
/// boxes are lowercase color letters and uncovered targets uppercase ones. A
/// box resting on a target of its color is drawn as `*`.
pub(crate) fn board(world: &World) -> String {
    let grid = query::grid(world);
    let mut tiles: Vec<Vec<char>> = (0..grid.rows())
        .map(|row| {
            (0..grid.columns())
                .map(|column| match grid.cell_kind(CellCoord::new(column, row)) {
                    CellKind::Wall => WALL,
                    CellKind::Floor | CellKind::PushTarget => FLOOR,
                })
                .collect()
        })
        .collect();
    let mut paint = |cell: CellCoord, tile: char| {
        if let Some(slot) = tiles
            .get_mut(cell.row() as usize)
            .and_then(|row| row.get_mut(cell.column() as usize))
        {
            *slot = tile;
        }
    };

    for target in query::targets(world) {
        paint(target.cell(), color_letter(target.color()).to_ascii_uppercase());
    }
    for pushable in query::boxes(world).into_iter().filter(|pushable| pushable.visible) {
        let covered = query::targets(world)
            .iter()
            .any(|target| target.cell() == pushable.cell && target.color() == pushable.color);
        let tile = if covered {
            COVERED_TARGET
        } else {
            color_letter(pushable.color)
        };
        paint(pushable.cell, tile);
    }

    let active = query::active_robot(world).map(|robot| robot.id);
    for robot in query::robots(world).into_iter().filter(|robot| robot.visible) {
        let tile = if Some(robot.id) == active {
            facing_arrow(robot.facing)
        } else {
            REPLAY_ROBOT
        };
        paint(robot.cell, tile);
    }

    let mut out = String::new();
    for row in tiles {
        out.extend(row);
        out.push('\n');
    }
    out
}

/// One-line summary of the clock, robots and target coverage.
pub(crate) fn status(world: &World) -> String {
    let (covered, total) = query::target_coverage(world);
    let mut line = format!(
        "time {}  robots {}  targets {covered}/{total}",
        format_time(query::elapsed_time(world)),
        query::robots(world).len(),
    );
    if query::can_rewind(world) {
        line.push_str("  [rewind ready]");
    }
    if let Some(result) = query::result(world) {
        let _ = write!(
            line,
            "  solved in {} with {} robot(s)",
            format_time(result.timeline_time),
            result.robot_count
        );
    }
    line
}

fn color_letter(color: BoxColor) -> char {
    match color {
        BoxColor::Yellow => 'a',
        BoxColor::Red => 'b',
        BoxColor::Blue => 'c',
        BoxColor::Green => 'd',
    }
}

fn facing_arrow(facing: Direction) -> char {
    match facing {
        Direction::Up => '^',
        Direction::Right => '>',
        Direction::Down => 'v',
        Direction::Left => '<',
    }
}

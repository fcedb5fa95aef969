#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure win evaluator that matches pushable boxes against colored target cells.

use temporal_bot_core::{BoxSnapshot, TargetCell};

/// Reports whether every target holds a visible box of the same color.
///
/// Matching is purely positional: boxes are not bound to a particular target,
/// so one box per target cell is enough regardless of ordering.
#[must_use]
pub fn is_won(targets: &[TargetCell], boxes: &[BoxSnapshot]) -> bool {
    targets.iter().all(|target| is_covered(target, boxes))
}

/// Counts satisfied targets, returned as `(covered, total)`.
#[must_use]
pub fn coverage(targets: &[TargetCell], boxes: &[BoxSnapshot]) -> (usize, usize) {
    let covered = targets
        .iter()
        .filter(|target| is_covered(target, boxes))
        .count();
    (covered, targets.len())
}

fn is_covered(target: &TargetCell, boxes: &[BoxSnapshot]) -> bool {
    boxes.iter().any(|pushable| {
        pushable.visible && pushable.cell == target.cell() && pushable.color == target.color()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use temporal_bot_core::{BoxColor, BoxId, CellCoord, Presentation};

    fn pushable(id: u32, column: u32, row: u32, color: BoxColor) -> BoxSnapshot {
        let cell = CellCoord::new(column, row);
        BoxSnapshot {
            id: BoxId::new(id),
            cell,
            color,
            visible: true,
            presentation: Presentation {
                view_position: Vec2::new(column as f32, row as f32),
                view_facing: 0.0,
                progress: 1.0,
                moving: false,
                turning: false,
            },
        }
    }

    #[test]
    fn matching_box_on_target_wins() {
        let targets = [TargetCell::new(CellCoord::new(2, 2), BoxColor::Yellow)];
        let boxes = [pushable(0, 2, 2, BoxColor::Yellow)];
        assert!(is_won(&targets, &boxes));
    }

    #[test]
    fn moving_box_off_target_clears_win() {
        let targets = [TargetCell::new(CellCoord::new(2, 2), BoxColor::Yellow)];
        let boxes = [pushable(0, 2, 3, BoxColor::Yellow)];
        assert!(!is_won(&targets, &boxes));
    }

    #[test]
    fn color_must_match() {
        let targets = [TargetCell::new(CellCoord::new(1, 1), BoxColor::Red)];
        let boxes = [pushable(0, 1, 1, BoxColor::Blue)];
        assert!(!is_won(&targets, &boxes));
    }

    #[test]
    fn same_colored_boxes_cover_targets_in_any_order() {
        let targets = [
            TargetCell::new(CellCoord::new(1, 1), BoxColor::Green),
            TargetCell::new(CellCoord::new(3, 1), BoxColor::Green),
        ];
        let boxes = [
            pushable(0, 3, 1, BoxColor::Green),
            pushable(1, 1, 1, BoxColor::Green),
        ];
        assert!(is_won(&targets, &boxes));
        assert_eq!(coverage(&targets, &boxes), (2, 2));
    }

    #[test]
    fn coverage_counts_partial_progress() {
        let targets = [
            TargetCell::new(CellCoord::new(1, 1), BoxColor::Yellow),
            TargetCell::new(CellCoord::new(2, 1), BoxColor::Red),
        ];
        let boxes = [pushable(0, 1, 1, BoxColor::Yellow)];
        assert_eq!(coverage(&targets, &boxes), (1, 2));
        assert!(!is_won(&targets, &boxes));
    }

    #[test]
    fn level_without_targets_is_trivially_won() {
        assert!(is_won(&[], &[]));
    }
}

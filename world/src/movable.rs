//! Logical and presentation state shared by every displaceable entity.

use std::time::Duration;

use glam::Vec2;
use temporal_bot_core::{
    BoxColor, BoxId, BoxSnapshot, CellCoord, Direction, Placement, Presentation,
};

/// Authoritative state consulted by gameplay decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pose {
    pub(crate) cell: CellCoord,
    pub(crate) facing: Direction,
    pub(crate) visible: bool,
}

/// Animation bookkeeping derived from pose changes and the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Motion {
    started_at: Duration,
    progress: f32,
    moving: bool,
    turning: bool,
    origin_position: Vec2,
    origin_facing: f32,
    view_position: Vec2,
    view_facing: f32,
}

impl Motion {
    fn at_rest(pose: Pose) -> Self {
        let facing = f32::from(pose.facing.quarter_turns());
        Self {
            started_at: Duration::ZERO,
            progress: 1.0,
            moving: false,
            turning: false,
            origin_position: pose.cell.as_vec2(),
            origin_facing: facing,
            view_position: pose.cell.as_vec2(),
            view_facing: facing,
        }
    }
}

/// Entity that occupies a grid cell and can be displaced.
#[derive(Clone, Debug)]
pub(crate) struct Movable {
    initial: Pose,
    pose: Pose,
    motion: Motion,
}

impl Movable {
    pub(crate) fn new(initial: Pose) -> Self {
        Self {
            initial,
            pose: initial,
            motion: Motion::at_rest(initial),
        }
    }

    pub(crate) fn cell(&self) -> CellCoord {
        self.pose.cell
    }

    pub(crate) fn facing(&self) -> Direction {
        self.pose.facing
    }

    pub(crate) fn visible(&self) -> bool {
        self.pose.visible
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.motion.moving || self.motion.turning
    }

    /// Moves into `to`, optionally turning toward `direction` first.
    pub(crate) fn advance_to(
        &mut self,
        to: CellCoord,
        direction: Direction,
        reorient: bool,
        now: Duration,
    ) {
        if reorient {
            self.turn_toward(direction, now);
        } else {
            // unfinished animation continues from where it is drawn
            self.motion.origin_facing = self.motion.view_facing;
        }

        self.motion.origin_position = self.motion.view_position;
        self.motion.moving = true;
        self.motion.progress = 0.0;
        self.motion.started_at = now;
        self.pose.cell = to;
    }

    /// Turns toward `direction` without leaving the cell.
    pub(crate) fn turn_toward(&mut self, direction: Direction, now: Duration) {
        let target = f32::from(direction.quarter_turns());
        let delta = target - self.motion.view_facing;
        // shortest way round
        if delta > 2.0 {
            self.motion.view_facing += 4.0;
        } else if delta < -2.0 {
            self.motion.view_facing -= 4.0;
        }

        self.motion.origin_facing = self.motion.view_facing;
        self.motion.turning = true;
        self.motion.progress = 0.0;
        self.motion.started_at = now;
        self.pose.facing = direction;
    }

    /// Leaves the board. The entity keeps its cell but no longer occupies it.
    pub(crate) fn vanish(&mut self) {
        self.pose.visible = false;
        self.settle();
    }

    /// Makes a hidden entity occupy its cell again.
    pub(crate) fn appear(&mut self) {
        self.pose.visible = true;
        self.settle();
    }

    /// Recomputes presentation state for the provided clock value.
    pub(crate) fn advance_animation(&mut self, now: Duration, animation_length: Duration) {
        if !self.is_animating() {
            return;
        }

        let elapsed = now.saturating_sub(self.motion.started_at);
        let progress = elapsed.as_secs_f32() / animation_length.as_secs_f32().max(f32::EPSILON);
        if progress >= 1.0 {
            self.settle();
            return;
        }

        self.motion.progress = progress;
        if self.motion.moving {
            let destination = self.pose.cell.as_vec2();
            self.motion.view_position = self
                .motion
                .origin_position
                .lerp(destination, progress);
        }
        if self.motion.turning {
            let destination = f32::from(self.pose.facing.quarter_turns());
            self.motion.view_facing = self.motion.origin_facing
                + (destination - self.motion.origin_facing) * progress;
        }
    }

    /// Restores the pose captured at creation and clears every animation.
    pub(crate) fn reset(&mut self) {
        self.pose = self.initial;
        self.motion = Motion::at_rest(self.initial);
    }

    pub(crate) fn presentation(&self) -> Presentation {
        Presentation {
            view_position: self.motion.view_position,
            view_facing: self.motion.view_facing,
            progress: self.motion.progress,
            moving: self.motion.moving,
            turning: self.motion.turning,
        }
    }

    fn settle(&mut self) {
        self.motion = Motion {
            started_at: self.motion.started_at,
            ..Motion::at_rest(self.pose)
        };
    }
}

/// Colored box that moves only when pushed.
#[derive(Clone, Debug)]
pub(crate) struct PushBox {
    /// Position in the level's box list.
    pub(crate) id: BoxId,
    /// Matched against target colors by the victory check.
    pub(crate) color: BoxColor,
    /// Pose and animation on the board.
    pub(crate) body: Movable,
}

impl PushBox {
    pub(crate) fn new(id: BoxId, cell: CellCoord, color: BoxColor) -> Self {
        Self {
            id,
            color,
            body: Movable::new(Pose {
                cell,
                facing: Direction::Up,
                visible: true,
            }),
        }
    }

    pub(crate) fn snapshot(&self) -> BoxSnapshot {
        BoxSnapshot {
            id: self.id,
            cell: self.body.cell(),
            color: self.color,
            visible: self.body.visible(),
            presentation: self.body.presentation(),
        }
    }
}

pub(crate) fn pose_from_placement(placement: Placement, visible: bool) -> Pose {
    Pose {
        cell: placement.cell,
        facing: placement.facing,
        visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANIMATION: Duration = Duration::from_millis(100);

    fn robot_at(column: u32, row: u32, facing: Direction) -> Movable {
        Movable::new(Pose {
            cell: CellCoord::new(column, row),
            facing,
            visible: true,
        })
    }

    #[test]
    fn advance_interpolates_then_snaps() {
        let mut movable = robot_at(1, 1, Direction::Right);
        movable.advance_to(CellCoord::new(2, 1), Direction::Right, false, Duration::ZERO);
        assert!(movable.presentation().moving);

        movable.advance_animation(Duration::from_millis(50), ANIMATION);
        let halfway = movable.presentation();
        assert!((halfway.view_position.x - 1.5).abs() < 1e-4);
        assert!((halfway.progress - 0.5).abs() < 1e-4);

        movable.advance_animation(Duration::from_millis(100), ANIMATION);
        let settled = movable.presentation();
        assert!(!settled.is_animating());
        assert_eq!(settled.view_position, Vec2::new(2.0, 1.0));
        assert_eq!(movable.cell(), CellCoord::new(2, 1));
    }

    #[test]
    fn turn_takes_the_short_way_round() {
        let mut movable = robot_at(1, 1, Direction::Left);
        movable.turn_toward(Direction::Up, Duration::ZERO);
        movable.advance_animation(Duration::from_millis(50), ANIMATION);
        let halfway = movable.presentation().view_facing;
        assert!((halfway + 0.5).abs() < 1e-4, "expected -0.5, got {halfway}");

        movable.advance_animation(Duration::from_millis(150), ANIMATION);
        assert_eq!(movable.presentation().view_facing, 0.0);
        assert_eq!(movable.facing(), Direction::Up);
    }

    #[test]
    fn move_during_a_turn_continues_from_the_drawn_facing() {
        let mut movable = robot_at(1, 1, Direction::Up);
        movable.turn_toward(Direction::Right, Duration::ZERO);
        movable.advance_animation(Duration::from_millis(50), ANIMATION);
        let drawn = movable.presentation().view_facing;
        assert!((drawn - 0.5).abs() < 1e-4, "expected 0.5, got {drawn}");

        let restart = Duration::from_millis(50);
        movable.advance_to(CellCoord::new(2, 1), Direction::Right, false, restart);
        movable.advance_animation(restart + Duration::from_millis(1), ANIMATION);
        let next = movable.presentation().view_facing;
        assert!(next >= drawn, "facing jumped back from {drawn} to {next}");
        assert!(next <= 1.0);

        movable.advance_animation(restart + ANIMATION, ANIMATION);
        assert_eq!(movable.presentation().view_facing, 1.0);
    }

    #[test]
    fn reset_restores_initial_pose_and_clears_animation() {
        let mut movable = robot_at(1, 1, Direction::Down);
        movable.advance_to(CellCoord::new(1, 2), Direction::Down, true, Duration::ZERO);
        movable.vanish();
        movable.reset();

        assert_eq!(movable.cell(), CellCoord::new(1, 1));
        assert!(movable.visible());
        assert!(!movable.is_animating());
    }

    #[test]
    fn vanish_stops_animation() {
        let mut movable = robot_at(1, 1, Direction::Down);
        movable.turn_toward(Direction::Up, Duration::ZERO);
        movable.vanish();
        assert!(!movable.visible());
        assert!(!movable.is_animating());
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Temporal Bot engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Read access goes through immutable snapshots so that
//! presentation never observes partially updated state.

mod grid;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use grid::{BoxPlacement, CellKind, Grid, LayoutError, LevelLayout, Placement};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Temporal Bot.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the active level and performs a full restart.
    LoadLevel {
        /// Pre-parsed level to install.
        layout: LevelLayout,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Appends a directional move to the active robot's command log.
    IssueMove {
        /// Direction the player requested.
        direction: Direction,
    },
    /// Freezes the active robot's history and spawns a new active robot.
    IssueRewind,
    /// Rewinds once more and replays every recorded robot from time zero.
    RestartTimeline,
    /// Discards every robot and returns the level to its initial configuration.
    Restart,
    /// Opens or closes the pause gate. Ticks are ignored while paused.
    SetRunning {
        /// Whether ticks should advance the simulation.
        running: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a level was installed.
    LevelLoaded {
        /// Number of grid columns.
        columns: u32,
        /// Number of grid rows.
        rows: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an intent was appended to a robot's command log.
    IntentQueued {
        /// Robot that received the intent.
        robot: RobotId,
        /// Recorded intent.
        intent: Intent,
        /// Clock value at which the intent becomes due.
        execute_at: Duration,
    },
    /// Confirms that a robot executed a move and left its cell.
    Moved {
        /// Robot that issued the move.
        robot: RobotId,
        /// Cell the robot occupied before moving.
        from: CellCoord,
        /// Cell the robot occupies after moving.
        to: CellCoord,
    },
    /// Confirms that a movable was displaced by a push chain.
    Pushed {
        /// Movable that was displaced.
        movable: MovableId,
        /// Cell the movable occupied before the push.
        from: CellCoord,
        /// Cell the movable occupies after the push.
        to: CellCoord,
    },
    /// Reports that a robot's move was blocked.
    MoveBlocked {
        /// Robot whose move failed.
        robot: RobotId,
        /// Direction of the failed move.
        direction: Direction,
        /// Why the chain could not advance.
        reason: BlockReason,
    },
    /// Reports that a robot executed its rewind marker and left the board.
    RobotVanished {
        /// Robot that vanished.
        robot: RobotId,
        /// Cell the robot vacated.
        cell: CellCoord,
    },
    /// Confirms that the rewind protocol spawned a new active robot.
    RobotSpawned {
        /// Identifier of the new robot.
        robot: RobotId,
        /// Cell the robot will occupy.
        cell: CellCoord,
        /// Clock value at which the robot entered the timeline.
        spawned_at: Duration,
    },
    /// Confirms that a replayed robot appeared on the board at its spawn time.
    RobotMaterialized {
        /// Robot that appeared.
        robot: RobotId,
        /// Cell the robot occupies.
        cell: CellCoord,
    },
    /// Reports that a rewind request was refused without mutating state.
    RewindRejected {
        /// Why the rewind was refused.
        reason: RewindRejection,
    },
    /// Confirms that the clock returned to zero while keeping recorded robots.
    TimelineRestarted {
        /// Number of robots that will replay.
        robots: usize,
    },
    /// Confirms that the level returned to its initial single-robot state.
    LevelRestarted,
    /// Announces that the pause gate changed.
    RunningChanged {
        /// Whether ticks now advance the simulation.
        running: bool,
    },
    /// Announces that every target is covered by a matching box.
    LevelCompleted {
        /// Summary handed to score persistence.
        result: GameResult,
    },
}

/// Cardinal directions a robot can be commanded toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing column indices.
    Right,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
}

impl Direction {
    /// All directions in clockwise order starting at [`Direction::Up`].
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit offset as `(column, row)` deltas.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    /// Clockwise quarter turns from [`Direction::Up`].
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }
}

/// Entry of a robot's command log: a move or the rewind marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Step one cell in the provided direction, pushing whatever is in the way.
    Move(Direction),
    /// Vacate the board; the robot's timeline ends here.
    Rewind,
}

/// Timestamped intent recorded in a robot's command log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScheduledIntent {
    /// Recorded intent.
    pub intent: Intent,
    /// Clock value at which the intent becomes due.
    pub execute_at: Duration,
    /// Whether the intent already ran in the current timeline pass.
    pub executed: bool,
}

/// Unique identifier assigned to a robot. Identifiers follow spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RobotId(u32);

impl RobotId {
    /// Creates a new robot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a pushable box. Identifiers follow level order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(u32);

impl BoxId {
    /// Creates a new box identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifies any entity that occupies a cell and can be displaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MovableId {
    /// A controllable or replaying robot.
    Robot(RobotId),
    /// A pushable box.
    Box(BoxId),
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Adjacent cell in the provided direction, or `None` when it would leave
    /// the non-negative coordinate space.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        let (column_delta, row_delta) = direction.offset();
        let column = self.column.checked_add_signed(column_delta)?;
        let row = self.row.checked_add_signed(row_delta)?;
        Some(Self::new(column, row))
    }

    /// Cell center as a floating point position for presentation.
    #[must_use]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32)
    }
}

/// Color tag shared by pushable boxes and target cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoxColor {
    /// Yellow box or target.
    Yellow,
    /// Red box or target.
    Red,
    /// Blue box or target.
    Blue,
    /// Green box or target.
    Green,
}

/// Fixed colored cell that must hold a same-colored box for the level to be won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetCell {
    cell: CellCoord,
    color: BoxColor,
}

impl TargetCell {
    /// Creates a target at the provided cell.
    #[must_use]
    pub const fn new(cell: CellCoord, color: BoxColor) -> Self {
        Self { cell, color }
    }

    /// Cell the target occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Color a box must carry to satisfy the target.
    #[must_use]
    pub const fn color(&self) -> BoxColor {
        self.color
    }
}

/// Why a push chain failed to advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockReason {
    /// The last movable in the chain faced a wall.
    Wall,
    /// The chain would have stepped outside the grid.
    OutOfBounds,
    /// The chain revisited a movable it already contained.
    Cycle,
}

/// Reasons a rewind request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewindRejection {
    /// The level is already won.
    LevelWon,
    /// A visible movable occupies the start cell.
    SpawnOccupied,
    /// The active robot has not appeared on the board yet.
    ActiveRobotAbsent,
}

/// Summary emitted once per win for score persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameResult {
    /// Whether the level was completed. Always true for emitted results.
    pub completed: bool,
    /// Clock value at the winning tick.
    pub elapsed_time: Duration,
    /// Sum over robots of their last recorded command time.
    pub timeline_time: Duration,
    /// Number of robots used, the active one included.
    pub robot_count: u32,
}

/// Presentation state derived from logical state and the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Presentation {
    /// Interpolated position in cell units.
    pub view_position: Vec2,
    /// Interpolated facing in clockwise quarter turns from up. May leave `0..4`
    /// while a turn wraps around.
    pub view_facing: f32,
    /// Progress of the current animation in `0.0..=1.0`.
    pub progress: f32,
    /// Whether a move animation is in flight.
    pub moving: bool,
    /// Whether a turn animation is in flight.
    pub turning: bool,
}

impl Presentation {
    /// Reports whether any animation is in flight.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.moving || self.turning
    }
}

/// Immutable representation of a single robot used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotSnapshot {
    /// Identifier assigned at spawn.
    pub id: RobotId,
    /// Logical cell.
    pub cell: CellCoord,
    /// Logical facing.
    pub facing: Direction,
    /// Whether the robot currently occupies its cell.
    pub visible: bool,
    /// Whether the robot has entered the current timeline pass.
    pub materialized: bool,
    /// Clock value at which the robot entered the timeline.
    pub spawned_at: Duration,
    /// Number of recorded intents.
    pub recorded: usize,
    /// Derived animation state.
    pub presentation: Presentation,
}

/// Immutable representation of a single pushable box used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSnapshot {
    /// Identifier assigned at level load.
    pub id: BoxId,
    /// Logical cell.
    pub cell: CellCoord,
    /// Color tag matched against targets.
    pub color: BoxColor,
    /// Whether the box currently occupies its cell.
    pub visible: bool,
    /// Derived animation state.
    pub presentation: Presentation,
}

/// Cosmetic trail marker left by a rewind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSnapshot {
    /// Cell the rewinding robot stood on.
    pub cell: CellCoord,
    /// Clock value when the particle appeared.
    pub spawned_at: Duration,
    /// Fade progress in `0.0..=1.0`.
    pub progress: f32,
}

/// Timing parameters of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    tick_period: Duration,
    animation_length: Duration,
    particle_lifetime: Duration,
}

impl SimulationConfig {
    /// Period at which drivers are expected to tick by default.
    pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(5);
    /// Length of a move or turn animation by default.
    pub const DEFAULT_ANIMATION_LENGTH: Duration = Duration::from_millis(100);
    /// Lifetime of a rewind particle by default.
    pub const DEFAULT_PARTICLE_LIFETIME: Duration = Duration::from_millis(500);

    /// Creates a configuration, rejecting zero tick periods and animation lengths.
    pub fn new(
        tick_period: Duration,
        animation_length: Duration,
        particle_lifetime: Duration,
    ) -> Result<Self, ConfigError> {
        if tick_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if animation_length.is_zero() {
            return Err(ConfigError::ZeroAnimationLength);
        }
        Ok(Self {
            tick_period,
            animation_length,
            particle_lifetime,
        })
    }

    /// Period at which drivers should issue [`Command::Tick`].
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Duration of a single move or turn animation.
    #[must_use]
    pub const fn animation_length(&self) -> Duration {
        self.animation_length
    }

    /// Duration a rewind particle stays on the board.
    #[must_use]
    pub const fn particle_lifetime(&self) -> Duration {
        self.particle_lifetime
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period: Self::DEFAULT_TICK_PERIOD,
            animation_length: Self::DEFAULT_ANIMATION_LENGTH,
            particle_lifetime: Self::DEFAULT_PARTICLE_LIFETIME,
        }
    }
}

/// Reasons a [`SimulationConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Ticks must advance the clock.
    #[error("tick period must be greater than zero")]
    ZeroTickPeriod,
    /// Animations must take time to complete.
    #[error("animation length must be greater than zero")]
    ZeroAnimationLength,
}

//! Command logs and the robots that replay them.

use std::time::Duration;

use temporal_bot_core::{Intent, Placement, RobotId, RobotSnapshot, ScheduledIntent};

use crate::movable::{pose_from_placement, Movable};

/// Append-only, chronologically ordered log of a robot's intents.
#[derive(Clone, Debug, Default)]
pub(crate) struct CommandLog {
    entries: Vec<ScheduledIntent>,
}

impl CommandLog {
    pub(crate) fn record(&mut self, intent: Intent, execute_at: Duration) {
        self.entries.push(ScheduledIntent {
            intent,
            execute_at,
            executed: false,
        });
    }

    /// Marks and returns the earliest pending intent that is due at `now`.
    pub(crate) fn take_due(&mut self, now: Duration) -> Option<Intent> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| !entry.executed && entry.execute_at <= now)?;
        entry.executed = true;
        Some(entry.intent)
    }

    /// Clears every executed flag so the log replays from the beginning.
    pub(crate) fn rearm(&mut self) {
        for entry in &mut self.entries {
            entry.executed = false;
        }
    }

    pub(crate) fn last(&self) -> Option<&ScheduledIntent> {
        self.entries.last()
    }

    /// Execute time of the rewind marker, if one was recorded.
    pub(crate) fn rewind_mark(&self) -> Option<Duration> {
        self.entries
            .iter()
            .find(|entry| entry.intent == Intent::Rewind)
            .map(|entry| entry.execute_at)
    }

    pub(crate) fn entries(&self) -> &[ScheduledIntent] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Controllable entity with its own command log.
#[derive(Clone, Debug)]
pub(crate) struct Robot {
    /// Creation order, also the index into the world's robot list.
    pub(crate) id: RobotId,
    /// Pose and animation on the board.
    pub(crate) body: Movable,
    /// Moves and the rewind marker this robot replays after a restart.
    pub(crate) log: CommandLog,
    spawned_at: Duration,
    founder: bool,
    materialized: bool,
}

impl Robot {
    /// Robot placed by the level itself, present from time zero.
    pub(crate) fn founder(id: RobotId, placement: Placement) -> Self {
        Self {
            id,
            body: Movable::new(pose_from_placement(placement, true)),
            log: CommandLog::default(),
            spawned_at: Duration::ZERO,
            founder: true,
            materialized: true,
        }
    }

    /// Robot created by the rewind protocol at `at`.
    ///
    /// It is visible right away, but after a timeline restart it waits hidden
    /// until the clock reaches `at` again.
    pub(crate) fn spawn(id: RobotId, placement: Placement, at: Duration) -> Self {
        let mut body = Movable::new(pose_from_placement(placement, false));
        body.appear();
        Self {
            id,
            body,
            log: CommandLog::default(),
            spawned_at: at,
            founder: false,
            materialized: true,
        }
    }

    pub(crate) fn spawned_at(&self) -> Duration {
        self.spawned_at
    }

    /// Whether the robot occupies the board and may execute intents.
    pub(crate) fn is_present(&self) -> bool {
        self.materialized && self.body.visible()
    }

    /// Whether the robot is waiting to re-enter the timeline at `now`.
    pub(crate) fn is_due_to_materialize(&self, now: Duration) -> bool {
        !self.materialized && now >= self.spawned_at
    }

    pub(crate) fn materialize(&mut self) {
        self.materialized = true;
        self.body.appear();
    }

    /// Returns to the spawn pose and rearms the log for another pass.
    pub(crate) fn reset(&mut self) {
        self.body.reset();
        self.log.rearm();
        self.materialized = self.founder;
    }

    pub(crate) fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot {
            id: self.id,
            cell: self.body.cell(),
            facing: self.body.facing(),
            visible: self.body.visible(),
            materialized: self.materialized,
            spawned_at: self.spawned_at,
            recorded: self.log.len(),
            presentation: self.body.presentation(),
        }
    }
}

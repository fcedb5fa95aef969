//! Rewind markers that fade out after a fixed lifetime.

use std::time::Duration;

use temporal_bot_core::{CellCoord, ParticleSnapshot};

/// Cosmetic marker left where a robot rewound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Particle {
    cell: CellCoord,
    spawned_at: Duration,
}

impl Particle {
    pub(crate) const fn new(cell: CellCoord, spawned_at: Duration) -> Self {
        Self { cell, spawned_at }
    }

    pub(crate) fn is_expired(&self, now: Duration, lifetime: Duration) -> bool {
        now.saturating_sub(self.spawned_at) >= lifetime
    }

    pub(crate) fn snapshot(&self, now: Duration, lifetime: Duration) -> ParticleSnapshot {
        let age = now.saturating_sub(self.spawned_at);
        let progress = if lifetime.is_zero() {
            1.0
        } else {
            (age.as_secs_f32() / lifetime.as_secs_f32()).min(1.0)
        };
        ParticleSnapshot {
            cell: self.cell,
            spawned_at: self.spawned_at,
            progress,
        }
    }
}

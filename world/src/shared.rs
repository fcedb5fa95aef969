//! Thread-safe handle that serializes commands against one world.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use temporal_bot_core::{Command, Event};

use crate::{apply, World};

/// Cloneable handle that serializes every command and aggregate read on one lock.
///
/// A driver thread ticking the clock and an input thread issuing commands can
/// share a world through clones of the same handle.
#[derive(Clone, Debug)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    /// Wraps the provided world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Applies a command under the lock and returns the emitted events.
    pub fn apply(&self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut *self.lock(), command, &mut events);
        events
    }

    /// Reads the world and applies a command without releasing the lock in between.
    ///
    /// Input adapters use this to stamp a command with the clock value it was
    /// applied at while a driver thread keeps ticking.
    pub fn observe_and_apply<R>(
        &self,
        observe: impl FnOnce(&World) -> R,
        command: Command,
    ) -> (R, Vec<Event>) {
        let mut world = self.lock();
        let observed = observe(&*world);
        let mut events = Vec::new();
        apply(&mut *world, command, &mut events);
        (observed, events)
    }

    /// Runs `read` against a consistent view of the world.
    pub fn read<R>(&self, read: impl FnOnce(&World) -> R) -> R {
        let world = self.lock();
        read(&*world)
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

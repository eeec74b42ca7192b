//! Single-slot poll timer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

/// Holds at most one armed timer task.
///
/// Each arm gets a fresh generation number. When a timer fires it must
/// [`claim`](Self::claim) its generation before doing work, which removes
/// it from the slot without aborting it. A later `disarm` therefore never
/// cancels a poll that is already running.
#[derive(Debug, Default)]
pub(crate) struct PollTimer {
    slot: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    next_generation: u64,
    armed: Option<ArmedTimer>,
}

#[derive(Debug)]
struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl PollTimer {
    /// Aborts the armed timer, if any.
    pub(crate) fn disarm(&self) {
        if let Some(timer) = self.slot().armed.take() {
            timer.handle.abort();
        }
    }

    /// Replaces the armed timer with the task built by `spawn`.
    ///
    /// `spawn` receives the generation the task must claim when it fires.
    pub(crate) fn arm<F>(&self, spawn: F)
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        let mut slot = self.slot();
        if let Some(previous) = slot.armed.take() {
            previous.handle.abort();
        }
        let generation = slot.next_generation;
        slot.next_generation = slot.next_generation.wrapping_add(1);
        slot.armed = Some(ArmedTimer {
            generation,
            handle: spawn(generation),
        });
    }

    /// Takes the slot for a firing timer. Returns `false` if the timer was
    /// replaced or disarmed in the meantime.
    pub(crate) fn claim(&self, generation: u64) -> bool {
        let mut slot = self.slot();
        match &slot.armed {
            Some(timer) if timer.generation == generation => {
                slot.armed = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.slot().armed.is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

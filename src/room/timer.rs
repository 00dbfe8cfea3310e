//! Per-room turn timer.
//!
//! Each arming advances a generation counter and spawns a fresh task stamped
//! with the new generation. Cancellation is cooperative: cancelling only
//! advances the counter, and a stale task observes the mismatch on its next
//! wake and exits without touching room state. At most one generation is
//! current per room at any time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{Outbox, Room};

/// Sleep slice; short enough to observe cancellation promptly.
const POLL_SLICE: Duration = Duration::from_millis(100);
/// Slices per broadcast tick (one second between `TIMER_UPDATE`s).
const SLICES_PER_TICK: u32 = 10;

#[derive(Debug, Default)]
pub(crate) struct TurnTimer {
    generation: AtomicU64,
}

impl TurnTimer {
    /// Invalidate the current generation and return the new one. Used both
    /// to cancel (nothing is spawned for the new generation) and to arm.
    pub(crate) fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }
}

/// Outcome of one timer wake, produced under the room lock.
pub(crate) enum TimerTick {
    /// Time remains; deliver the update and keep ticking.
    Continue(Outbox),
    /// The deadline passed; the turn was swapped and a new generation armed.
    Expired(Outbox),
    /// This generation was cancelled (or the game stopped); exit silently.
    Stale,
}

pub(super) fn spawn(room: Arc<Room>, generation: u64) {
    tokio::spawn(run(room, generation));
}

async fn run(room: Arc<Room>, generation: u64) {
    loop {
        for _ in 0..SLICES_PER_TICK {
            tokio::time::sleep(POLL_SLICE).await;
            if !room.timer.is_current(generation) {
                return;
            }
        }
        match room.timer_tick(generation).await {
            TimerTick::Continue(outbox) => outbox.dispatch(),
            TimerTick::Expired(outbox) => {
                outbox.dispatch();
                return;
            }
            TimerTick::Stale => return,
        }
    }
}

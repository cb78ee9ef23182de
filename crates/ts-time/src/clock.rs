//! `TimeManager` — wraps [`ts_core::WorldClock`] with the bookkeeping the
//! engine's tick loop needs: the last instant a decay pass ran, so
//! `elapsed_minutes` is measured against the wall clock rather than the tick
//! count (spec.md §4.5).

use chrono::{DateTime, Utc};
use ts_core::{WorldClock, WorldTime};

/// Real-clock driven world time plus decay-pass bookkeeping.
pub struct TimeManager {
    clock: WorldClock,
    last_decay_at: DateTime<Utc>,
}

impl TimeManager {
    /// Build a manager anchored at `clock`, with the first decay pass
    /// measured from `started_at` (normally `Utc::now()` at boot, or the
    /// restored `serverStartTime` on a warm restart).
    pub fn new(clock: WorldClock, started_at: DateTime<Utc>) -> Self {
        Self { clock, last_decay_at: started_at }
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// `WorldTime` for `now`, formatted in the configured timezone.
    pub fn world_time_at(&self, now: DateTime<Utc>) -> WorldTime {
        self.clock.world_time_at(now)
    }

    /// Minutes elapsed since the last call to this method (or since
    /// construction), and advance the internal cursor to `now`.
    ///
    /// Calling this twice with the same `now` returns `0.0` the second time
    /// — it is a consuming read, matching the engine's "measure elapsed
    /// since the last decay pass" tick step (spec.md §4.5, §4.10 step 2).
    pub fn consume_elapsed_minutes(&mut self, now: DateTime<Utc>) -> f64 {
        let elapsed = self.clock.elapsed_minutes(self.last_decay_at, now);
        self.last_decay_at = now;
        elapsed.max(0.0)
    }
}

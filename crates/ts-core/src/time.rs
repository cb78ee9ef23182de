//! World time model: wall-clock-derived `WorldTime` and the clock that
//! produces it.
//!
//! # Design
//!
//! World time is tied directly to the real wall clock in a fixed IANA
//! timezone rather than to an integer tick count: `day` is
//! `floor((now - serverStart)/24h)+1`, and `hour`/`minute` come straight from
//! `now`'s local representation. A simulation tick still exists (the
//! engine's fixed-rate loop) but it drives *polling frequency*, not the
//! meaning of time — two ticks a millisecond apart can observe the same
//! `WorldTime`, and a restart after a long pause jumps `day` forward exactly
//! as much real time elapsed.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// A point in simulated wall-clock time.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldTime {
    pub hour: u8,
    pub minute: u8,
    /// 1-based day count since `serverStartTime`.
    pub day: u64,
}

impl WorldTime {
    pub const ZERO: WorldTime = WorldTime { hour: 0, minute: 0, day: 1 };

    /// Minutes since midnight, `[0, 1440)`.
    #[inline]
    pub fn minutes_of_day(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    /// `true` if `self` falls within `[start, end)` as hour-of-day bounds,
    /// wrapping past midnight when `start > end` (overnight shifts).
    pub fn hour_in_range(&self, start: u8, end: u8) -> bool {
        if start <= end {
            self.hour >= start && self.hour < end
        } else {
            self.hour >= start || self.hour < end
        }
    }
}

impl std::fmt::Display for WorldTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {} {:02}:{:02}", self.day, self.hour, self.minute)
    }
}

/// Converts real wall-clock instants into [`WorldTime`] in a fixed timezone,
/// anchored at a sticky `serverStartTime` that continues across restarts
/// rather than resetting the day count.
#[derive(Clone, Debug)]
pub struct WorldClock {
    /// The instant `day = 1` began. Set once at first boot and persisted;
    /// never recomputed on restart.
    pub server_start: DateTime<Utc>,
    pub timezone: Tz,
}

impl WorldClock {
    pub fn new(server_start: DateTime<Utc>, timezone: Tz) -> Self {
        Self { server_start, timezone }
    }

    /// Derive [`WorldTime`] for `now` (normally `Utc::now()`; parameterized
    /// for deterministic tests).
    pub fn world_time_at(&self, now: DateTime<Utc>) -> WorldTime {
        let local = now.with_timezone(&self.timezone);
        let elapsed = now.signed_duration_since(self.server_start);
        let day = (elapsed.num_seconds().max(0) / 86_400) as u64 + 1;
        WorldTime {
            hour: local.hour() as u8,
            minute: local.minute() as u8,
            day,
        }
    }

    /// Minutes elapsed between two wall-clock instants, as an `f64` so
    /// sub-minute deltas are not truncated to zero by the decay pipeline.
    pub fn elapsed_minutes(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        to.signed_duration_since(from).num_milliseconds() as f64 / 60_000.0
    }
}

/// Parse an IANA timezone name (e.g. `"America/Los_Angeles"`) from
/// `WorldConfig`. Falls back to UTC and logs a warning on an unrecognized
/// name rather than failing boot — a typo'd timezone should not prevent the
/// simulation from starting.
pub fn parse_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(timezone = name, "unrecognized IANA timezone, falling back to UTC");
            chrono_tz::UTC
        }
    }
}

/// Day-rollover detector: compares the `day` component of two consecutive
/// `WorldTime` reads so caches keyed by day can be cleared and reloaded.
pub fn day_rolled_over(previous: &WorldTime, current: &WorldTime) -> bool {
    current.day > previous.day
}

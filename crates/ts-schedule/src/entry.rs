//! `ScheduleEntry` and `ActionHistoryEntry` — the two row shapes
//! `ScheduleManager` caches (spec.md §3, §4.6).

use ts_core::{ActionId, FacilityId};

use crate::error::{ScheduleError, ScheduleResult};

/// One planned activity in a character's day. Ordered by `time` within a
/// schedule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleEntry {
    /// Wall-clock time-of-day, `"HH:MM"`.
    pub time: String,
    pub activity: ActionId,
    pub facility_id: Option<FacilityId>,
    pub reason: Option<String>,
}

impl ScheduleEntry {
    /// Minutes since midnight, for sort/compare purposes. Returns an error
    /// if `time` isn't a valid `"HH:MM"`.
    pub fn minutes_of_day(&self) -> ScheduleResult<u32> {
        parse_hhmm(&self.time)
    }
}

/// Parse `"HH:MM"` into minutes-since-midnight.
pub fn parse_hhmm(s: &str) -> ScheduleResult<u32> {
    let (h, m) = s.split_once(':').ok_or_else(|| ScheduleError::BadTime(s.to_string()))?;
    let h: u32 = h.parse().map_err(|_| ScheduleError::BadTime(s.to_string()))?;
    let m: u32 = m.parse().map_err(|_| ScheduleError::BadTime(s.to_string()))?;
    if h > 23 || m > 59 {
        return Err(ScheduleError::BadTime(s.to_string()));
    }
    Ok(h * 60 + m)
}

/// One row of the append-only per-day action history (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionHistoryEntry {
    /// Wall-clock time-of-day the action started, `"HH:MM"`.
    pub time: String,
    pub action_id: ActionId,
    pub target: Option<String>,
    pub duration_minutes: Option<u32>,
    pub reason: Option<String>,
    /// Back-filled asynchronously by conversation post-processing
    /// (spec.md §9 open question (c): treated as best-effort, keyed by
    /// `(characterId, day, time)`).
    pub episode: Option<String>,
}

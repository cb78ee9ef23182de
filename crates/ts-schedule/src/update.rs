//! `ScheduleUpdate` — the three mutations `applyScheduleUpdate` accepts
//! (spec.md §4.6).

use crate::entry::ScheduleEntry;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScheduleUpdate {
    /// Insert `entry`, then stable-sort the day's schedule by time.
    Add(ScheduleEntry),
    /// Remove the entry matching `(time, activity)`. A miss is a logged
    /// no-op, never an error.
    Remove { time: String, activity: ts_core::ActionId },
    /// Replace the entry matching `time` with `entry`. A miss inserts
    /// `entry` and re-sorts, same as `Add`.
    Modify { time: String, entry: ScheduleEntry },
}

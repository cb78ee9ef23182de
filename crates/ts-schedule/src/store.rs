//! `ScheduleStore` — the narrow persistence capability `ScheduleManager`
//! write-throughs to.
//!
//! Defined here (the consumer) rather than in `ts-persistence` (the
//! implementer) so this crate never depends on a concrete store, the same
//! dependency-inversion shape as `ts_spatial::Router` /
//! `ts_behavior::BehaviorModel`. `ts-persistence::SqliteStore` and
//! `ts-persistence::InMemoryStore` both implement it as one facet of the
//! larger `StateStore` capability list (spec.md §4.9).

use ts_core::CharacterId;

use crate::entry::{ActionHistoryEntry, ScheduleEntry};
use crate::error::ScheduleResult;

pub trait ScheduleStore: Send + Sync {
    fn save_schedule(
        &self,
        character: &CharacterId,
        day: u64,
        entries: &[ScheduleEntry],
    ) -> ScheduleResult<()>;

    fn load_schedule(
        &self,
        character: &CharacterId,
        day: u64,
    ) -> ScheduleResult<Option<Vec<ScheduleEntry>>>;

    fn delete_schedule(&self, character: &CharacterId, day: u64) -> ScheduleResult<()>;

    fn append_history(
        &self,
        character: &CharacterId,
        day: u64,
        entry: &ActionHistoryEntry,
    ) -> ScheduleResult<()>;

    fn load_history(
        &self,
        character: &CharacterId,
        day: u64,
    ) -> ScheduleResult<Vec<ActionHistoryEntry>>;

    /// Best-effort back-fill of `episode` on the most recent history row for
    /// `(character, day, time)` (spec.md §9 open question (c)).
    fn backfill_episode(
        &self,
        character: &CharacterId,
        day: u64,
        time: &str,
        episode: &str,
    ) -> ScheduleResult<()>;
}

/// An in-memory `ScheduleStore` that keeps nothing — every read misses,
/// every write is a silent no-op. Useful for tests that only exercise the
/// cache layer.
pub struct NullScheduleStore;

impl ScheduleStore for NullScheduleStore {
    fn save_schedule(&self, _: &CharacterId, _: u64, _: &[ScheduleEntry]) -> ScheduleResult<()> {
        Ok(())
    }

    fn load_schedule(&self, _: &CharacterId, _: u64) -> ScheduleResult<Option<Vec<ScheduleEntry>>> {
        Ok(None)
    }

    fn delete_schedule(&self, _: &CharacterId, _: u64) -> ScheduleResult<()> {
        Ok(())
    }

    fn append_history(&self, _: &CharacterId, _: u64, _: &ActionHistoryEntry) -> ScheduleResult<()> {
        Ok(())
    }

    fn load_history(&self, _: &CharacterId, _: u64) -> ScheduleResult<Vec<ActionHistoryEntry>> {
        Ok(Vec::new())
    }

    fn backfill_episode(&self, _: &CharacterId, _: u64, _: &str, _: &str) -> ScheduleResult<()> {
        Ok(())
    }
}

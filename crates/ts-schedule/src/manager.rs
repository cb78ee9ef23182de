//! `ScheduleManager` — per-`(characterId, day)` schedule and action-history
//! caches with write-through to a [`ScheduleStore`] (spec.md §4.6).

use std::collections::HashMap;

use ts_core::{ActionId, CharacterId};

use crate::entry::{parse_hhmm, ActionHistoryEntry, ScheduleEntry};
use crate::store::ScheduleStore;
use crate::update::ScheduleUpdate;
use crate::error::ScheduleResult;

type DayKey = (CharacterId, u64);

/// Caches schedules and histories for every character/day pair touched this
/// process lifetime, backed by a durable [`ScheduleStore`].
///
/// Read order (spec.md §4.6): cache → durable store → per-character
/// defaults (from `WorldConfig`'s character bundle). Writes go to the cache
/// immediately and to the store write-through; store failures are logged,
/// never propagated as a cache inconsistency.
pub struct ScheduleManager {
    schedule_cache: HashMap<DayKey, Vec<ScheduleEntry>>,
    history_cache: HashMap<DayKey, Vec<ActionHistoryEntry>>,
    defaults: HashMap<CharacterId, Vec<ScheduleEntry>>,
}

impl ScheduleManager {
    pub fn new(defaults: HashMap<CharacterId, Vec<ScheduleEntry>>) -> Self {
        Self { schedule_cache: HashMap::new(), history_cache: HashMap::new(), defaults }
    }

    /// The schedule for `(character, day)`, resolved cache → store →
    /// defaults, in that order. The resolved value is installed in the
    /// cache before returning so subsequent reads are O(1).
    pub fn schedule_for(
        &mut self,
        character: &CharacterId,
        day: u64,
        store: &dyn ScheduleStore,
    ) -> ScheduleResult<&[ScheduleEntry]> {
        let key = (character.clone(), day);
        if !self.schedule_cache.contains_key(&key) {
            let resolved = match store.load_schedule(character, day)? {
                Some(entries) => entries,
                None => self.defaults.get(character).cloned().unwrap_or_default(),
            };
            self.schedule_cache.insert(key.clone(), resolved);
        }
        Ok(self.schedule_cache.get(&key).expect("just inserted"))
    }

    /// Apply an `add | remove | modify` mutation (spec.md §4.6) and write
    /// the resulting schedule through to `store`.
    pub fn apply_schedule_update(
        &mut self,
        character: &CharacterId,
        day: u64,
        update: ScheduleUpdate,
        store: &dyn ScheduleStore,
    ) -> ScheduleResult<()> {
        // Ensure the cache is warm before mutating.
        self.schedule_for(character, day, store)?;
        let key = (character.clone(), day);
        let entries = self.schedule_cache.get_mut(&key).expect("warmed above");

        match update {
            ScheduleUpdate::Add(entry) => {
                entries.push(entry);
                sort_by_time(entries);
            }
            ScheduleUpdate::Remove { time, activity } => {
                let before = entries.len();
                entries.retain(|e| !(e.time == time && e.activity == activity));
                if entries.len() == before {
                    tracing::debug!(
                        character = %character,
                        day,
                        time = %time,
                        activity = %activity,
                        "schedule remove: no matching entry, no-op"
                    );
                }
            }
            ScheduleUpdate::Modify { time, entry } => {
                match entries.iter_mut().find(|e| e.time == time) {
                    Some(slot) => *slot = entry,
                    None => {
                        entries.push(entry);
                        sort_by_time(entries);
                    }
                }
            }
        }

        let snapshot = entries.clone();
        if let Err(e) = store.save_schedule(character, day, &snapshot) {
            tracing::warn!(character = %character, day, error = %e, "schedule write-through failed");
        }
        Ok(())
    }

    /// Append a row to `(character, day)`'s action history and write it
    /// through to `store`.
    pub fn record_action_history(
        &mut self,
        character: &CharacterId,
        day: u64,
        entry: ActionHistoryEntry,
        store: &dyn ScheduleStore,
    ) {
        let key = (character.clone(), day);
        self.history_cache.entry(key).or_default().push(entry.clone());
        if let Err(e) = store.append_history(character, day, &entry) {
            tracing::warn!(character = %character, day, error = %e, "action history write-through failed");
        }
    }

    /// The action history for `(character, day)`, cache → store.
    pub fn history_for(
        &mut self,
        character: &CharacterId,
        day: u64,
        store: &dyn ScheduleStore,
    ) -> ScheduleResult<&[ActionHistoryEntry]> {
        let key = (character.clone(), day);
        if !self.history_cache.contains_key(&key) {
            let rows = store.load_history(character, day)?;
            self.history_cache.insert(key.clone(), rows);
        }
        Ok(self.history_cache.get(&key).expect("just inserted"))
    }

    /// Clear both caches (day-rollover handling, spec.md §4.10: "On day
    /// rollover ... clear schedule and history caches; reload from store").
    pub fn clear_caches(&mut self) {
        self.schedule_cache.clear();
        self.history_cache.clear();
    }

    /// Best-effort back-fill of an `episode` label onto the most recent
    /// history row for `(character, day, time)`.
    pub fn backfill_episode(
        &mut self,
        character: &CharacterId,
        day: u64,
        time: &str,
        episode: &str,
        store: &dyn ScheduleStore,
    ) {
        let key = (character.clone(), day);
        if let Some(rows) = self.history_cache.get_mut(&key) {
            if let Some(row) = rows.iter_mut().rev().find(|r| r.time == time) {
                row.episode = Some(episode.to_string());
            }
        }
        if let Err(e) = store.backfill_episode(character, day, time, episode) {
            tracing::warn!(character = %character, day, error = %e, "episode back-fill failed");
        }
    }

    /// The next unfinished entry on or after the current time-of-day, used
    /// by `BehaviorDecider`'s rules fallback (spec.md §4.7).
    pub fn next_unfinished(
        entries: &[ScheduleEntry],
        completed_activities: &[ActionId],
        now_minutes: u32,
    ) -> Option<&ScheduleEntry> {
        entries
            .iter()
            .filter(|e| !completed_activities.contains(&e.activity))
            .find(|e| parse_hhmm(&e.time).map(|m| m >= now_minutes).unwrap_or(false))
            .or_else(|| entries.iter().find(|e| !completed_activities.contains(&e.activity)))
    }
}

fn sort_by_time(entries: &mut [ScheduleEntry]) {
    entries.sort_by(|a, b| a.time.cmp(&b.time));
}

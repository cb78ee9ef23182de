//! `InMemoryStore` — a deep-copy-on-every-call [`StateStore`] (plus
//! `ScheduleStore`/`ConversationStore`), for tests and local dev (spec.md
//! §4.9 "two implementations: (a) in-memory ... (b) durable embedded SQL").

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use ts_conversation::{
    ConversationResult, ConversationStore, ConversationSummaryEntry, MidTermMemory, NpcDynamicState,
};
use ts_core::{CharacterId, MapId, NpcId, WorldTime};
use ts_schedule::{ActionHistoryEntry, ScheduleEntry, ScheduleResult, ScheduleStore};

use crate::error::PersistenceResult;
use crate::record::CharacterRecord;
use crate::snapshot::StateSnapshot;
use crate::store::StateStore;

#[derive(Default)]
struct Inner {
    characters: HashMap<CharacterId, CharacterRecord>,
    time: Option<WorldTime>,
    current_map_id: Option<MapId>,
    server_start_time: Option<DateTime<Utc>>,
    schedules: HashMap<(CharacterId, u64), Vec<ScheduleEntry>>,
    history: HashMap<(CharacterId, u64), Vec<ActionHistoryEntry>>,
    npc_states: HashMap<NpcId, NpcDynamicState>,
    summaries: HashMap<(CharacterId, NpcId), Vec<ConversationSummaryEntry>>,
    memories: HashMap<CharacterId, Vec<MidTermMemory>>,
}

pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("in-memory store mutex poisoned")
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStore {
    fn save_state(&self, snapshot: &StateSnapshot) -> PersistenceResult<()> {
        let mut inner = self.lock();
        let keep: std::collections::HashSet<CharacterId> =
            snapshot.characters.iter().map(|c| c.id.clone()).collect();
        inner.characters.retain(|id, _| keep.contains(id));
        for record in &snapshot.characters {
            inner.characters.insert(record.id.clone(), record.clone());
        }
        for npc in &snapshot.npcs {
            inner.npc_states.insert(npc.npc_id.clone(), npc.clone());
        }
        inner.time = Some(snapshot.time);
        inner.current_map_id = snapshot.current_map_id.clone();
        inner.server_start_time = Some(snapshot.server_start_time);
        Ok(())
    }

    fn load_state(&self) -> PersistenceResult<Option<StateSnapshot>> {
        let inner = self.lock();
        let Some(server_start_time) = inner.server_start_time else {
            return Ok(None);
        };
        Ok(Some(StateSnapshot {
            time: inner.time.unwrap_or(WorldTime::ZERO),
            current_map_id: inner.current_map_id.clone(),
            server_start_time,
            characters: inner.characters.values().cloned().collect(),
            npcs: inner.npc_states.values().cloned().collect(),
        }))
    }

    fn save_character(&self, record: &CharacterRecord) -> PersistenceResult<()> {
        self.lock().characters.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn load_character(&self, id: &CharacterId) -> PersistenceResult<Option<CharacterRecord>> {
        Ok(self.lock().characters.get(id).cloned())
    }

    fn load_all_characters(&self) -> PersistenceResult<Vec<CharacterRecord>> {
        Ok(self.lock().characters.values().cloned().collect())
    }

    fn delete_character(&self, id: &CharacterId) -> PersistenceResult<()> {
        self.lock().characters.remove(id);
        Ok(())
    }

    fn save_time(&self, time: WorldTime) -> PersistenceResult<()> {
        self.lock().time = Some(time);
        Ok(())
    }

    fn load_time(&self) -> PersistenceResult<Option<WorldTime>> {
        Ok(self.lock().time)
    }

    fn save_current_map_id(&self, map_id: Option<&MapId>) -> PersistenceResult<()> {
        self.lock().current_map_id = map_id.cloned();
        Ok(())
    }

    fn load_current_map_id(&self) -> PersistenceResult<Option<MapId>> {
        Ok(self.lock().current_map_id.clone())
    }

    fn save_server_start_time(&self, at: DateTime<Utc>) -> PersistenceResult<()> {
        self.lock().server_start_time = Some(at);
        Ok(())
    }

    fn load_server_start_time(&self) -> PersistenceResult<Option<DateTime<Utc>>> {
        Ok(self.lock().server_start_time)
    }
}

impl ScheduleStore for InMemoryStore {
    fn save_schedule(&self, character: &CharacterId, day: u64, entries: &[ScheduleEntry]) -> ScheduleResult<()> {
        self.lock().schedules.insert((character.clone(), day), entries.to_vec());
        Ok(())
    }

    fn load_schedule(&self, character: &CharacterId, day: u64) -> ScheduleResult<Option<Vec<ScheduleEntry>>> {
        Ok(self.lock().schedules.get(&(character.clone(), day)).cloned())
    }

    fn delete_schedule(&self, character: &CharacterId, day: u64) -> ScheduleResult<()> {
        self.lock().schedules.remove(&(character.clone(), day));
        Ok(())
    }

    fn append_history(&self, character: &CharacterId, day: u64, entry: &ActionHistoryEntry) -> ScheduleResult<()> {
        self.lock().history.entry((character.clone(), day)).or_default().push(entry.clone());
        Ok(())
    }

    fn load_history(&self, character: &CharacterId, day: u64) -> ScheduleResult<Vec<ActionHistoryEntry>> {
        Ok(self.lock().history.get(&(character.clone(), day)).cloned().unwrap_or_default())
    }

    fn backfill_episode(&self, character: &CharacterId, day: u64, time: &str, episode: &str) -> ScheduleResult<()> {
        let mut inner = self.lock();
        if let Some(rows) = inner.history.get_mut(&(character.clone(), day)) {
            if let Some(row) = rows.iter_mut().rev().find(|r| r.time == time) {
                row.episode = Some(episode.to_string());
            }
        }
        Ok(())
    }
}

impl ConversationStore for InMemoryStore {
    fn save_npc_state(&self, state: &NpcDynamicState) -> ConversationResult<()> {
        self.lock().npc_states.insert(state.npc_id.clone(), state.clone());
        Ok(())
    }

    fn load_npc_state(&self, npc_id: &NpcId) -> ConversationResult<Option<NpcDynamicState>> {
        Ok(self.lock().npc_states.get(npc_id).cloned())
    }

    fn save_conversation_summary(&self, entry: &ConversationSummaryEntry) -> ConversationResult<()> {
        self.lock()
            .summaries
            .entry((entry.character_id.clone(), entry.npc_id.clone()))
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    fn recent_conversation_summaries(
        &self,
        character_id: &CharacterId,
        npc_id: &NpcId,
        limit: u32,
    ) -> ConversationResult<Vec<ConversationSummaryEntry>> {
        let inner = self.lock();
        let mut entries = inner
            .summaries
            .get(&(character_id.clone(), npc_id.clone()))
            .cloned()
            .unwrap_or_default();
        entries.reverse();
        entries.truncate(limit as usize);
        Ok(entries)
    }

    fn append_memory(&self, memory: &MidTermMemory) -> ConversationResult<()> {
        self.lock().memories.entry(memory.character_id.clone()).or_default().push(memory.clone());
        Ok(())
    }

    fn active_memories(&self, character_id: &CharacterId, current_day: u64) -> ConversationResult<Vec<MidTermMemory>> {
        Ok(self
            .lock()
            .memories
            .get(character_id)
            .map(|m| m.iter().filter(|m| m.is_active(current_day)).cloned().collect())
            .unwrap_or_default())
    }

    fn purge_expired_memories(&self, current_day: u64) -> ConversationResult<u64> {
        let mut inner = self.lock();
        let mut removed = 0u64;
        for memories in inner.memories.values_mut() {
            let before = memories.len();
            memories.retain(|m| m.is_active(current_day));
            removed += (before - memories.len()) as u64;
        }
        Ok(removed)
    }
}

//! `ConversationStore` — the narrow persistence capability this crate
//! write-throughs to: NPC dynamic state, conversation summaries, and
//! mid-term memories (spec.md §4.8, §4.9).
//!
//! Defined here (the consumer) rather than in `ts-persistence`, the same
//! dependency-inversion shape as `ts_schedule::ScheduleStore` — neither
//! `ts-conversation` nor `ts-schedule` depend on a concrete store;
//! `ts-persistence` depends on both and implements their traits as facets of
//! the larger `StateStore` capability list.

use chrono::{DateTime, Utc};
use ts_core::{CharacterId, NpcId};
use ts_world::NpcMood;

use crate::error::ConversationResult;
use crate::memory::MidTermMemory;

/// The persisted slice of an [`ts_world::Npc`] — dynamic conversation state
/// only. Placement (map/node/position/direction) is static, loaded once
/// from the NPC bundle at boot, not round-tripped through this store.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcDynamicState {
    pub npc_id: NpcId,
    pub affinity: i32,
    pub mood: NpcMood,
    pub facts: Vec<String>,
    pub conversation_count: u32,
    pub last_conversation: Option<DateTime<Utc>>,
}

impl NpcDynamicState {
    pub fn from_npc(npc: &ts_world::Npc) -> Self {
        Self {
            npc_id: npc.id.clone(),
            affinity: npc.affinity,
            mood: npc.mood,
            facts: npc.facts.clone(),
            conversation_count: npc.conversation_count,
            last_conversation: npc.last_conversation,
        }
    }

    /// Apply this state onto a freshly-bootstrapped `Npc` (static fields
    /// already populated from the NPC bundle).
    pub fn apply_to(&self, npc: &mut ts_world::Npc) {
        npc.affinity = self.affinity;
        npc.mood = self.mood;
        npc.facts = self.facts.clone();
        npc.conversation_count = self.conversation_count;
        npc.last_conversation = self.last_conversation;
    }
}

/// One closed conversation's post-processed summary (spec.md §4.8).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversationSummaryEntry {
    pub character_id: CharacterId,
    pub npc_id: NpcId,
    pub day: u64,
    pub summary: String,
    pub topics_discussed: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub trait ConversationStore: Send + Sync {
    fn save_npc_state(&self, state: &NpcDynamicState) -> ConversationResult<()>;
    fn load_npc_state(&self, npc_id: &NpcId) -> ConversationResult<Option<NpcDynamicState>>;

    fn save_conversation_summary(&self, entry: &ConversationSummaryEntry) -> ConversationResult<()>;

    /// Most recent `limit` summaries between `character` and `npc`, newest
    /// first — `BehaviorDecider`'s "recent conversation summaries" input
    /// (spec.md §4.7).
    fn recent_conversation_summaries(
        &self,
        character_id: &CharacterId,
        npc_id: &NpcId,
        limit: u32,
    ) -> ConversationResult<Vec<ConversationSummaryEntry>>;

    fn append_memory(&self, memory: &MidTermMemory) -> ConversationResult<()>;

    /// Active (`expiresDay >= currentDay`) memories for `character`.
    fn active_memories(
        &self,
        character_id: &CharacterId,
        current_day: u64,
    ) -> ConversationResult<Vec<MidTermMemory>>;

    /// Purge expired memories from the store; returns the count removed.
    fn purge_expired_memories(&self, current_day: u64) -> ConversationResult<u64>;
}

/// A `ConversationStore` that keeps nothing — every read misses, every
/// write is a silent no-op. Mirrors `ts_schedule::NullScheduleStore`'s role
/// for tests that only exercise the session/executor layer.
pub struct NullConversationStore;

impl ConversationStore for NullConversationStore {
    fn save_npc_state(&self, _: &NpcDynamicState) -> ConversationResult<()> {
        Ok(())
    }

    fn load_npc_state(&self, _: &NpcId) -> ConversationResult<Option<NpcDynamicState>> {
        Ok(None)
    }

    fn save_conversation_summary(&self, _: &ConversationSummaryEntry) -> ConversationResult<()> {
        Ok(())
    }

    fn recent_conversation_summaries(
        &self,
        _: &CharacterId,
        _: &NpcId,
        _: u32,
    ) -> ConversationResult<Vec<ConversationSummaryEntry>> {
        Ok(Vec::new())
    }

    fn append_memory(&self, _: &MidTermMemory) -> ConversationResult<()> {
        Ok(())
    }

    fn active_memories(&self, _: &CharacterId, _: u64) -> ConversationResult<Vec<MidTermMemory>> {
        Ok(Vec::new())
    }

    fn purge_expired_memories(&self, _: u64) -> ConversationResult<u64> {
        Ok(0)
    }
}

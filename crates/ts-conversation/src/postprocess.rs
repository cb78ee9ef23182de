//! Post-conversation extraction (spec.md §4.8 step 6): one more LLM call
//! over the closed message list, producing a summary, an affinity delta,
//! updated facts, mood, topics discussed, and zero or more mid-term
//! memories — then applying all of that onto the NPC and the stores.

use std::sync::Arc;

use serde::Deserialize;
use ts_behavior::{BehaviorError, GenerateObjectRequest, LLMClient, SchemaKind};
use ts_core::{CharacterId, NpcId};
use ts_world::{Npc, NpcMood, WorldState};
use tracing::warn;

use crate::error::ConversationResult;
use crate::memory::{Importance, MidTermMemory};
use crate::session::ConversationSession;
use crate::store::{ConversationStore, ConversationSummaryEntry, NpcDynamicState};

/// Affinity is clamped to `[-20, 20]` per extraction, then the NPC's
/// running total is clamped to `[-100, 100]` (spec.md §4.8, mirroring
/// `ts_world::npc::clamp_affinity`).
pub const MAX_AFFINITY_CHANGE: i32 = 20;

#[derive(Clone, Debug, Deserialize)]
pub struct ExtractedMemory {
    pub content: String,
    pub importance: Importance,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConversationExtraction {
    pub summary: String,
    pub affinity_change: i32,
    pub updated_facts: Vec<String>,
    pub mood: NpcMood,
    pub topics_discussed: Vec<String>,
    #[serde(default)]
    pub memories: Vec<ExtractedMemory>,
}

pub struct ConversationPostProcessor {
    llm: Arc<dyn LLMClient>,
}

impl ConversationPostProcessor {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Runs the extraction LLM call over a closed session's transcript.
    /// Called from within the conversation's own background task, never
    /// from the tick loop — it touches no `WorldState`.
    pub async fn extract(
        &self,
        session: &ConversationSession,
        npc: &Npc,
    ) -> Result<ConversationExtraction, BehaviorError> {
        let transcript = session
            .messages
            .iter()
            .map(|m| format!("{}: {}", m.name, m.utterance))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Conversation between a character and {npc}, goal: \"{goal}\" (success: \"{criteria}\").\n\
             Known facts about {npc}: {facts:?}\n\
             Transcript:\n{transcript}\n\
             Summarize the conversation, estimate the affinity change this conversation had on \
             {npc} toward the character (-{max}..{max}), list updated facts {npc} now knows, \
             {npc}'s resulting mood, the topics discussed, and any memories worth remembering.",
            npc = npc.name,
            goal = session.goal.goal,
            criteria = session.goal.success_criteria,
            facts = npc.facts,
            max = MAX_AFFINITY_CHANGE,
        );

        let request = GenerateObjectRequest {
            prompt,
            schema: SchemaKind::ConversationExtraction,
            system: None,
        };
        let value = self.llm.generate_object(request).await?;
        serde_json::from_value(value)
            .map_err(|e| BehaviorError::SchemaMismatch("conversation-extraction", e.to_string()))
    }
}

/// Applies a completed extraction: mutates the NPC in `world`, persists its
/// dynamic state and the conversation summary, appends any memories, and
/// returns the clamped affinity delta actually applied.
///
/// Store failures are logged and swallowed — the in-memory world state is
/// the source of truth for the running simulation; persistence lagging
/// behind for one conversation is not fatal (mirrors
/// `ts_schedule::ScheduleManager::record_action_history`'s "store is
/// best-effort" stance).
pub fn apply_extraction(
    world: &mut WorldState,
    store: &dyn ConversationStore,
    character_id: &CharacterId,
    npc_id: &NpcId,
    day: u64,
    created_at: chrono::DateTime<chrono::Utc>,
    extraction: &ConversationExtraction,
) -> ConversationResult<i32> {
    let clamped_change = extraction
        .affinity_change
        .clamp(-MAX_AFFINITY_CHANGE, MAX_AFFINITY_CHANGE);

    let npc = world.get_npc_mut(npc_id)?;
    npc.affinity = (npc.affinity + clamped_change).clamp(-100, 100);
    npc.mood = extraction.mood;
    npc.facts = extraction.updated_facts.clone();
    npc.conversation_count += 1;
    npc.last_conversation = Some(created_at);

    let dynamic_state = NpcDynamicState::from_npc(npc);
    if let Err(e) = store.save_npc_state(&dynamic_state) {
        warn!(npc_id = %npc_id, error = %e, "failed to persist npc dynamic state");
    }

    let summary_entry = ConversationSummaryEntry {
        character_id: character_id.clone(),
        npc_id: npc_id.clone(),
        day,
        summary: extraction.summary.clone(),
        topics_discussed: extraction.topics_discussed.clone(),
        created_at,
    };
    if let Err(e) = store.save_conversation_summary(&summary_entry) {
        warn!(npc_id = %npc_id, error = %e, "failed to persist conversation summary");
    }

    for (idx, m) in extraction.memories.iter().enumerate() {
        let memory = MidTermMemory {
            id: ts_core::MemoryId::new(format!("{character_id}-{day}-{idx}")),
            character_id: character_id.clone(),
            content: m.content.clone(),
            importance: m.importance,
            created_day: day,
            expires_day: day + m.importance.expiry_offset_days(),
            source_npc_id: Some(npc_id.clone()),
        };
        if let Err(e) = store.append_memory(&memory) {
            warn!(npc_id = %npc_id, error = %e, "failed to persist mid-term memory");
        }
    }

    Ok(clamped_change)
}

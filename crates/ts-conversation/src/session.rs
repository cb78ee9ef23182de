//! `ConversationSession` and its message/goal shapes (spec.md §3, §4.8).

use chrono::{DateTime, Utc};
use ts_core::{CharacterId, NpcId, SessionId};

/// What the character is trying to accomplish by talking to the NPC, and
/// how the LLM (or the post-processor, in `goalAchieved` extraction) knows
/// it succeeded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Goal {
    pub goal: String,
    pub success_criteria: String,
}

/// Who spoke a given [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Speaker {
    Character,
    Npc,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub speaker: Speaker,
    pub name: String,
    pub utterance: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Default `maxTurns` (spec.md §3).
pub const MAX_TURNS: u32 = 10;

/// A running (or just-closed) conversation between one character and one
/// NPC. `ts-world::Character::conversation` only points at one of these by
/// id — the full message history lives here, owned by
/// [`crate::manager::ConversationManager`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversationSession {
    pub id: SessionId,
    pub character_id: CharacterId,
    pub npc_id: NpcId,
    pub goal: Goal,
    pub messages: Vec<Message>,
    pub max_turns: u32,
    pub start_time: DateTime<Utc>,
    pub status: SessionStatus,
    pub goal_achieved: bool,
}

impl ConversationSession {
    /// `currentTurn = ⌊messages.length / 2⌋` (spec.md §3, §8 property 3).
    pub fn current_turn(&self) -> u32 {
        (self.messages.len() / 2) as u32
    }
}

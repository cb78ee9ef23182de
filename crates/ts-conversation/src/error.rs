//! Conversation-subsystem error type.

use thiserror::Error;
use ts_core::{CharacterId, NpcId};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("character {0} has no active conversation session")]
    NoActiveSession(CharacterId),

    #[error("character {0} is already in a conversation")]
    AlreadyInConversation(CharacterId),

    #[error("npc {0} is already in a conversation")]
    NpcBusy(NpcId),

    #[error(transparent)]
    World(#[from] ts_world::WorldError),

    #[error(transparent)]
    Llm(#[from] ts_behavior::BehaviorError),

    #[error("store error: {0}")]
    Store(String),
}

pub type ConversationResult<T> = Result<T, ConversationError>;

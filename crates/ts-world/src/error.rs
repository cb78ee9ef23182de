use thiserror::Error;
use ts_core::{CharacterId, NpcId};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("character {0} not found")]
    CharacterNotFound(CharacterId),

    #[error("character {0} already exists")]
    CharacterAlreadyExists(CharacterId),

    #[error("npc {0} not found")]
    NpcNotFound(NpcId),

    #[error("character {0} is already moving")]
    AlreadyMoving(CharacterId),

    #[error("character {0} has no active navigation to advance")]
    NoActiveNavigation(CharacterId),

    #[error("character {0} has no active cross-map navigation")]
    NoActiveCrossMapNav(CharacterId),

    #[error("character {0} has no active transition")]
    NoActiveTransition(CharacterId),

    #[error("npc {0} is already in a conversation")]
    NpcAlreadyInConversation(NpcId),
}

pub type WorldResult<T> = Result<T, WorldError>;

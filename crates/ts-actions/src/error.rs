//! Action-subsystem error type.

use thiserror::Error;

use ts_core::{ActionId, CharacterId};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("character {0} not found")]
    CharacterNotFound(CharacterId),

    #[error("unknown action {0}")]
    UnknownAction(ActionId),

    #[error("character {0} has no current action")]
    NoCurrentAction(CharacterId),

    #[error(transparent)]
    World(#[from] ts_world::WorldError),
}

pub type ActionResult<T> = Result<T, ActionError>;

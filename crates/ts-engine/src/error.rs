//! `EngineError` — the umbrella error this crate's public API returns.
//!
//! Plays the role `dt-sim`'s own error type plays for the teacher: one type
//! light enough for a binary's `main` to propagate with `?` straight into
//! an `anyhow::Result`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    World(#[from] ts_world::WorldError),

    #[error(transparent)]
    Mobility(#[from] ts_mobility::MobilityError),

    #[error(transparent)]
    Action(#[from] ts_actions::ActionError),

    #[error(transparent)]
    Schedule(#[from] ts_schedule::ScheduleError),

    #[error(transparent)]
    Conversation(#[from] ts_conversation::ConversationError),

    #[error(transparent)]
    Persistence(#[from] ts_persistence::PersistenceError),

    #[error(transparent)]
    Core(#[from] ts_core::CoreError),

    #[error("bootstrap failed: {0}")]
    Bootstrap(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

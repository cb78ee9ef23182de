//! Persistence-subsystem error type.

use thiserror::Error;
use ts_core::CharacterId;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("character {0} not found")]
    CharacterNotFound(CharacterId),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl From<PersistenceError> for ts_schedule::ScheduleError {
    fn from(err: PersistenceError) -> Self {
        ts_schedule::ScheduleError::Store(err.to_string())
    }
}

impl From<PersistenceError> for ts_conversation::ConversationError {
    fn from(err: PersistenceError) -> Self {
        ts_conversation::ConversationError::Store(err.to_string())
    }
}

//! Behavior-subsystem error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("LLM client unavailable")]
    LlmUnavailable,

    #[error("LLM call timed out")]
    LlmTimeout,

    #[error("LLM response did not match the {0} schema: {1}")]
    SchemaMismatch(&'static str, String),

    #[error("LLM request failed: {0}")]
    LlmRequestFailed(String),

    #[error(transparent)]
    World(#[from] ts_world::WorldError),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;

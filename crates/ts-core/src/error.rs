//! Shared error type for `ts-core` and a common base other crates convert into.

use thiserror::Error;

use crate::{CharacterId, MapId, NodeId};

/// The top-level error type for `ts-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("character {0} not found")]
    CharacterNotFound(CharacterId),

    #[error("map {0} not found")]
    MapNotFound(MapId),

    #[error("node {0} not found on map {1}")]
    NodeNotFound(NodeId, MapId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ts-core`.
pub type CoreResult<T> = Result<T, CoreError>;

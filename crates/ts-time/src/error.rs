//! Time-subsystem error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("unknown stat name {0:?} in action per-minute effects")]
    UnknownStat(String),
}

pub type TimeResult<T> = Result<T, TimeError>;

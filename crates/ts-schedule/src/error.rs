use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("malformed time {0:?}, expected \"HH:MM\"")]
    BadTime(String),

    #[error("store error: {0}")]
    Store(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

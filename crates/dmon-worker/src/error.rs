//! Worker error types.

use thiserror::Error;

use dmon_api::ApiError;
use dmon_notifier::NotifierError;
use dmon_tracker::TrackerError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid detection record: {0}")]
    InvalidRecord(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Notifier error: {0}")]
    Notifier(#[from] NotifierError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }
}

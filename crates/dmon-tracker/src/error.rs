//! Tracker error types.

use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid track rule '{expression}': {reason}")]
    RuleCompile { expression: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),
}

impl TrackerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

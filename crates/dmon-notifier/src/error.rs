//! Notifier error types.

use thiserror::Error;

pub type NotifierResult<T> = Result<T, NotifierError>;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifierError {
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn enrichment(msg: impl Into<String>) -> Self {
        Self::Enrichment(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

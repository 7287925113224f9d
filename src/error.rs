//! Error types for Focus Sentinel

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by session lifecycle operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Monitoring already active")]
    AlreadyActive,

    #[error("Monitoring not active")]
    NotActive,

    #[error("Frame timestamp {observed} is older than last recorded time {last}")]
    InvalidTimestamp {
        observed: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("Session mismatch: active session is {expected:?}, got {got:?}")]
    SessionMismatch {
        expected: Option<String>,
        got: Option<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

//! Error types for chatstamp-core

use thiserror::Error;

/// Main error type for the chatstamp-core library
#[derive(Error, Debug)]
pub enum Error {
    /// A timestamp that could not be turned into an instant
    #[error("invalid timestamp {raw:?}: {message}")]
    Timestamp { raw: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn timestamp(raw: &str, message: impl Into<String>) -> Self {
        Error::Timestamp {
            raw: raw.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for chatstamp-core
pub type Result<T> = std::result::Result<T, Error>;

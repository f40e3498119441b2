//! Error types for the learning loop
//!
//! The library surfaces a single [`LearnError`]; the binary wraps it in
//! `anyhow` like the rest of the application layer.

use std::path::PathBuf;

/// Input that the store or materializer refuses to accept
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Language code was empty or whitespace
    #[error("language code must not be empty")]
    EmptyLanguage,

    /// Language code that cannot be used as a directory name
    #[error("invalid language code {0:?}")]
    InvalidLanguage(String),

    /// Utterance with no words in it
    #[error("utterance must not be empty")]
    EmptyUtterance,

    /// Utterances and answers are stored one per line
    #[error("{kind} must be a single line: {value:?}")]
    MultiLine { kind: &'static str, value: String },
}

/// Errors that can occur while learning or materializing utterances
#[derive(Debug, thiserror::Error)]
pub enum LearnError {
    /// Malformed input
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// File system failure, with the path that failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings backend failure
    #[error("settings error: {0}")]
    Settings(String),

    /// Settings document could not be (de)serialized
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LearnError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LearnError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for library results
pub type Result<T> = std::result::Result<T, LearnError>;

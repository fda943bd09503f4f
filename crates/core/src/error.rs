//! Error types shared by every PolicyQA crate.
//!
//! `AppError` covers the collaborator-level failures (configuration, I/O,
//! completion service, document storage, templates). The retrieval pipeline
//! layers its own stage-tagged error on top and converts back into this type
//! at the binary boundary.

use thiserror::Error;

/// Unified error type for PolicyQA collaborators.
///
/// All fallible functions return `Result<T, AppError>`; nothing panics on
/// bad input or remote failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion service errors (transport, HTTP status, decoding)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Policy query pipeline errors
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation was cancelled before it completed
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

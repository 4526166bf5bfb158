// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Rendering and title extraction are total and have no error type; the
//! notification normalizer is the only core component allowed to fail.

use thiserror::Error;

/// Why a notification payload could not be normalized.
///
/// Each variant names the shape the normalizer was looking for, so the
/// boundary layer can pick a response without re-inspecting the payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("verification_token is present but is not a string")]
    InvalidVerificationToken,

    #[error("'{container}' container yielded no usable events ({rejected} element(s) rejected)")]
    EmptyBatch {
        container: &'static str,
        rejected: usize,
    },

    #[error("event is missing its {missing}")]
    IncompleteEvent { missing: &'static str },

    #[error("payload matched none of the expected shapes: {}", expected.join(", "))]
    UnrecognizedShape { expected: Vec<&'static str> },

    #[error("notification containers nest deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Malformed notification: {0}")]
    MalformedNotification(#[from] NormalizeError),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Failed to fetch entity '{id}': {cause}")]
    SourceFailed { id: String, cause: String },

    #[error("Failed to store snapshot for '{id}': {cause}")]
    StoreFailed { id: String, cause: String },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Allow converting from anyhow::Error, preserving error chain
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError {
            message: "Background task failed".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

//! # Blob Store Errors

use thiserror::Error;

/// Result type for blob store operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Blob store errors
#[derive(Debug, Clone, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Listing keys under '{prefix}' failed: {reason}")]
    ListFailed { prefix: String, reason: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(String),
}

//! # Document Store Errors

use thiserror::Error;

/// Result type for document store operations
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum DocumentStoreError {
    #[error("Failed to read collection '{collection}': {reason}")]
    CollectionRead { collection: String, reason: String },

    #[error("Write batch is full ({staged} operations staged)")]
    BatchFull { staged: usize },

    #[error("Batch commit failed: {0}")]
    CommitFailed(String),

    #[error("Failed to delete '{collection}/{id}': {reason}")]
    DeleteFailed {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(String),
}

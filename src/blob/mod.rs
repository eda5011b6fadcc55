//! Blob store abstraction
//!
//! Backup snapshots are persisted as immutable blobs in an external object
//! store. [`BlobStore`] captures the five operations the backup engine
//! needs: upload, download, list-by-prefix, metadata read, and delete.
//!
//! Uploads are all-or-nothing at the blob layer; a partially written blob
//! must never be observable under its final key.

mod errors;
mod local;

pub use errors::{BlobError, BlobResult};
pub use local::LocalBlobStore;

use chrono::{DateTime, Utc};

/// Server-side metadata for a stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobMetadata {
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub size: u64,
    pub download_url: String,
    pub created: DateTime<Utc>,
}

/// Object storage as consumed by the backup engine.
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Upload `bytes` at `key`, replacing any existing blob.
    fn upload(&self, key: &str, bytes: &[u8]) -> BlobResult<UploadReceipt>;

    /// Download the blob at `key`. Fails with [`BlobError::NotFound`] if
    /// absent.
    fn download(&self, key: &str) -> BlobResult<Vec<u8>>;

    /// List every key starting with `prefix`.
    fn list_keys(&self, prefix: &str) -> BlobResult<Vec<String>>;

    /// Read size and creation time for the blob at `key`.
    fn get_metadata(&self, key: &str) -> BlobResult<BlobMetadata>;

    /// A URL or handle from which the blob at `key` can be fetched.
    fn download_url(&self, key: &str) -> BlobResult<String>;

    /// Delete the blob at `key`. Fails with [`BlobError::NotFound`] if
    /// absent.
    fn delete(&self, key: &str) -> BlobResult<()>;
}

//! # Backup Service Errors
//!
//! One variant per caller-visible failure condition. Conditions a caller
//! may want to branch on (missing backup, corrupt blob, failed
//! validation, partial restore) are distinct variants, never collapsed
//! into a generic error.

use thiserror::Error;

/// Result type for backup service operations
pub type BackupResult<T> = Result<T, BackupError>;

/// Backup service errors
#[derive(Debug, Clone, Error)]
pub enum BackupError {
    /// A collection read failed during export. No partial snapshot is
    /// ever returned.
    #[error("Export failed reading collection '{collection}': {reason}")]
    Export { collection: String, reason: String },

    /// Blob upload failed. The document store is unaffected; the export
    /// may be retried without re-reading it.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The blob-store list call itself failed. Zero backups found or
    /// unparseable keys are success, not this.
    #[error("Listing backups failed: {0}")]
    List(String),

    /// The referenced backup does not exist.
    #[error("Backup not found: {0}")]
    NotFound(String),

    /// Blob delete failed for a reason other than absence.
    #[error("Deleting backup '{name}' failed: {reason}")]
    Delete { name: String, reason: String },

    /// Blob download failed in transport, distinct from a corrupt blob.
    #[error("Downloading backup '{name}' failed: {reason}")]
    Download { name: String, reason: String },

    /// The downloaded blob is not valid snapshot JSON.
    #[error("Backup '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    /// The snapshot parsed but failed structural validation.
    #[error("Snapshot failed validation: {0}")]
    Validation(String),

    /// A delete or batch commit failed mid-restore. Batches committed
    /// before the failure remain committed; `documents_restored` reports
    /// how far the restore got so operators can remediate.
    #[error("Restore failed after {documents_restored} documents: {reason}")]
    Restore {
        documents_restored: usize,
        reason: String,
    },

    /// Restore cancelled at a batch boundary. Committed batches remain.
    #[error("Restore cancelled after {documents_restored} documents")]
    Cancelled { documents_restored: usize },

    /// A restore is already running against this service.
    #[error("Another restore is already in progress")]
    RestoreInProgress,
}

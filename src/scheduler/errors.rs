//! # Scheduler Errors

use thiserror::Error;

use crate::service::BackupError;

/// Result type for scheduler operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Scheduler errors
#[derive(Debug, Clone, Error)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("Failed to read schedule file: {0}")]
    Load(String),

    #[error("Failed to write schedule file: {0}")]
    Save(String),

    #[error("Scheduled backup failed: {0}")]
    Backup(#[from] BackupError),
}

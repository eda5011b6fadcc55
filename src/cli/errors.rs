//! # CLI Errors

use thiserror::Error;

use crate::scheduler::ScheduleError;
use crate::service::BackupError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Backup(#[from] BackupError),

    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Server failed: {0}")]
    Server(String),
}

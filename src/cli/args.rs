//! CLI argument definitions using clap
//!
//! Commands:
//! - ledgervault export --data-dir <dir> --out <file>
//! - ledgervault backup --data-dir <dir> --blob-root <dir>
//! - ledgervault list --blob-root <dir>
//! - ledgervault details --blob-root <dir> <name>
//! - ledgervault delete --blob-root <dir> <name>
//! - ledgervault restore --data-dir <dir> --blob-root <dir> <name>
//! - ledgervault serve --data-dir <dir> --blob-root <dir>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ledgervault - snapshot backup and restore for a document ledger
#[derive(Parser, Debug)]
#[command(name = "ledgervault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export a snapshot of the local data directory to a file
    Export {
        /// Document store data directory
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Path for the exported snapshot JSON
        #[arg(long)]
        out: PathBuf,

        /// Optional description embedded in the snapshot
        #[arg(long)]
        description: Option<String>,
    },

    /// Export a snapshot and upload it to the blob store
    Backup {
        /// Document store data directory
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Blob store root directory
        #[arg(long, default_value = "./blobs")]
        blob_root: PathBuf,

        /// Optional description embedded in the snapshot
        #[arg(long)]
        description: Option<String>,
    },

    /// List stored backups, newest first
    List {
        /// Blob store root directory
        #[arg(long, default_value = "./blobs")]
        blob_root: PathBuf,
    },

    /// Show exact per-collection counts for one stored backup
    Details {
        /// Blob store root directory
        #[arg(long, default_value = "./blobs")]
        blob_root: PathBuf,

        /// Backup file name (as shown by `list`)
        name: String,
    },

    /// Delete one stored backup
    Delete {
        /// Blob store root directory
        #[arg(long, default_value = "./blobs")]
        blob_root: PathBuf,

        /// Backup file name (as shown by `list`)
        name: String,
    },

    /// Restore a stored backup into the data directory
    Restore {
        /// Document store data directory
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Blob store root directory
        #[arg(long, default_value = "./blobs")]
        blob_root: PathBuf,

        /// Backup file name (as shown by `list`)
        name: String,

        /// Clear each target collection before restoring
        #[arg(long)]
        delete_existing: bool,

        /// Restore only these collections (comma-separated)
        #[arg(long, value_delimiter = ',')]
        collections: Option<Vec<String>>,
    },

    /// Serve the backup HTTP API and the auto-backup scheduler
    Serve {
        /// Document store data directory
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Blob store root directory
        #[arg(long, default_value = "./blobs")]
        blob_root: PathBuf,

        /// Schedule record file
        #[arg(long, default_value = "./schedule.json")]
        schedule_file: PathBuf,

        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(long, default_value_t = 8710)]
        port: u16,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

//! Backup blob naming
//!
//! Stored backups follow a bit-exact naming convention so existing blobs
//! written by earlier versions of the application remain addressable:
//!
//! ```text
//! backups/backup-<YYYY-MM-DD>-<backupId>.json
//! ```
//!
//! Keys under the prefix that do not match the pattern are tolerated and
//! skipped during listing; the namespace may contain unrelated or legacy
//! objects.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Key prefix under which all backup blobs live.
pub const BACKUP_KEY_PREFIX: &str = "backups/";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^backup-(\d{4}-\d{2}-\d{2})-([A-Za-z0-9_-]+)\.json$")
            .expect("backup name pattern is valid")
    })
}

/// File name for a backup exported on `date` with the given id.
pub fn backup_file_name(date: NaiveDate, backup_id: &str) -> String {
    format!("backup-{}-{}.json", date.format("%Y-%m-%d"), backup_id)
}

/// Full blob key for a backup file name.
pub fn backup_blob_key(file_name: &str) -> String {
    format!("{BACKUP_KEY_PREFIX}{file_name}")
}

/// Parse a file name against the backup naming pattern.
///
/// Returns the export date and backup id, or `None` when the name does
/// not match (callers skip such keys rather than fail).
pub fn parse_backup_file_name(file_name: &str) -> Option<(NaiveDate, String)> {
    let captures = name_pattern().captures(file_name)?;
    let date = NaiveDate::parse_from_str(&captures[1], "%Y-%m-%d").ok()?;
    Some((date, captures[2].to_string()))
}

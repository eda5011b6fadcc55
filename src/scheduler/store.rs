//! # Schedule Store
//!
//! Durable storage for the auto-backup schedule: one small JSON record
//! holding the cron expression plus last-run and next-run timestamps.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{ScheduleError, ScheduleResult};
use super::BackupSchedule;

/// JSON file-based schedule store.
#[derive(Debug)]
pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the stored schedule, or the default when no file exists yet.
    pub fn load(&self) -> ScheduleResult<BackupSchedule> {
        if !self.path.exists() {
            return Ok(BackupSchedule::default());
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| ScheduleError::Load(e.to_string()))?;
        if contents.trim().is_empty() {
            return Ok(BackupSchedule::default());
        }

        serde_json::from_str(&contents).map_err(|e| ScheduleError::Load(e.to_string()))
    }

    /// Persist the schedule.
    pub fn save(&self, schedule: &BackupSchedule) -> ScheduleResult<()> {
        let contents = serde_json::to_string_pretty(schedule)
            .map_err(|e| ScheduleError::Save(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ScheduleError::Save(e.to_string()))?;
        }

        // Temp sibling plus rename, so a crash mid-save cannot leave a
        // half-written record that poisons every later load.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|e| ScheduleError::Save(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| ScheduleError::Save(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_default() {
        let temp = TempDir::new().unwrap();
        let store = FileScheduleStore::new(temp.path().join("schedule.json"));

        let schedule = store.load().unwrap();
        assert!(!schedule.enabled);
        assert!(schedule.last_run.is_none());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = FileScheduleStore::new(temp.path().join("schedule.json"));

        let mut schedule = BackupSchedule::default();
        schedule.enabled = true;
        schedule.cron = "0 3 * * *".to_string();
        store.save(&schedule).unwrap();

        assert_eq!(store.load().unwrap(), schedule);
    }

    #[test]
    fn test_repeated_save_replaces_cleanly() {
        let temp = TempDir::new().unwrap();
        let store = FileScheduleStore::new(temp.path().join("schedule.json"));

        store.save(&BackupSchedule::default()).unwrap();
        let mut schedule = BackupSchedule::default();
        schedule.enabled = true;
        store.save(&schedule).unwrap();

        assert_eq!(store.load().unwrap(), schedule);
        assert!(!temp.path().join("schedule.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_load_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("schedule.json");
        fs::write(&path, "nope").unwrap();

        let store = FileScheduleStore::new(&path);
        assert!(matches!(store.load(), Err(ScheduleError::Load(_))));
    }
}

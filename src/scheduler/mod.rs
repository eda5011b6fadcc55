//! Auto-backup scheduling
//!
//! Orchestration around the backup service: a cron-style schedule held in
//! a small persisted JSON record, and a polling loop that triggers
//! export-and-upload when the next-run timestamp is due.
//!
//! The scheduler is deliberately outside the backup core; it only calls
//! [`BackupService::backup_to_cloud`] and records when it did.

mod errors;
mod store;

pub use errors::{ScheduleError, ScheduleResult};
pub use store::FileScheduleStore;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use serde::{Deserialize, Serialize};

use crate::observability::Logger;
use crate::service::{BackupService, CloudBackupDescriptor};

/// Default schedule: daily at 02:00.
const DEFAULT_CRON: &str = "0 2 * * *";

/// The persisted auto-backup schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSchedule {
    pub enabled: bool,
    pub cron: String,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

impl Default for BackupSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: DEFAULT_CRON.to_string(),
            last_run: None,
            next_run: None,
        }
    }
}

impl BackupSchedule {
    /// Compute the next occurrence of the cron expression after `now`.
    pub fn next_occurrence_after(&self, now: DateTime<Utc>) -> ScheduleResult<DateTime<Utc>> {
        let cron = Cron::new(&self.cron)
            .parse()
            .map_err(|e| ScheduleError::InvalidCron {
                expression: self.cron.clone(),
                reason: e.to_string(),
            })?;
        cron.find_next_occurrence(&now, false)
            .map_err(|e| ScheduleError::InvalidCron {
                expression: self.cron.clone(),
                reason: e.to_string(),
            })
    }

    /// True when the schedule is enabled and its next-run time has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match (self.enabled, self.next_run) {
            (true, Some(next)) => now >= next,
            _ => false,
        }
    }
}

/// Polls the persisted schedule and runs cloud backups when due.
#[derive(Debug)]
pub struct AutoBackupScheduler {
    service: Arc<BackupService>,
    store: FileScheduleStore,
    poll_interval: Duration,
}

impl AutoBackupScheduler {
    pub fn new(service: Arc<BackupService>, store: FileScheduleStore) -> Self {
        Self {
            service,
            store,
            poll_interval: Duration::from_secs(60),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// One scheduling step at time `now`.
    ///
    /// Seeds `next_run` on first sight of an enabled schedule, runs a
    /// cloud backup when due, and persists updated timestamps. Returns
    /// the descriptor when a backup ran.
    pub fn tick(&self, now: DateTime<Utc>) -> ScheduleResult<Option<CloudBackupDescriptor>> {
        let mut schedule = self.store.load()?;
        if !schedule.enabled {
            return Ok(None);
        }

        if schedule.next_run.is_none() {
            schedule.next_run = Some(schedule.next_occurrence_after(now)?);
            self.store.save(&schedule)?;
            return Ok(None);
        }

        if !schedule.is_due(now) {
            return Ok(None);
        }

        let descriptor = self
            .service
            .backup_to_cloud(Some("scheduled backup".to_string()))?;

        schedule.last_run = Some(now);
        schedule.next_run = Some(schedule.next_occurrence_after(now)?);
        self.store.save(&schedule)?;

        Logger::info(
            "scheduled_backup_completed",
            &[
                ("backup_id", &descriptor.id),
                ("name", &descriptor.name),
            ],
        );
        Ok(Some(descriptor))
    }

    /// Run the polling loop until the process exits.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick(Utc::now()) {
                Logger::error("scheduled_backup_failed", &[("reason", &e.to_string())]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::LocalBlobStore;
    use crate::document::MemoryDocumentStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn scheduler(temp: &TempDir) -> AutoBackupScheduler {
        let documents = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(LocalBlobStore::new(temp.path().join("blobs")));
        let service = Arc::new(BackupService::new(documents, blobs));
        let store = FileScheduleStore::new(temp.path().join("schedule.json"));
        AutoBackupScheduler::new(service, store)
    }

    #[test]
    fn test_disabled_schedule_never_runs() {
        let temp = TempDir::new().unwrap();
        let scheduler = scheduler(&temp);

        let ran = scheduler.tick(Utc::now()).unwrap();
        assert!(ran.is_none());
    }

    #[test]
    fn test_first_tick_seeds_next_run() {
        let temp = TempDir::new().unwrap();
        let scheduler = scheduler(&temp);
        let store = FileScheduleStore::new(temp.path().join("schedule.json"));

        let mut schedule = BackupSchedule::default();
        schedule.enabled = true;
        store.save(&schedule).unwrap();

        let ran = scheduler.tick(Utc::now()).unwrap();
        assert!(ran.is_none());
        assert!(store.load().unwrap().next_run.is_some());
    }

    #[test]
    fn test_due_schedule_runs_and_advances() {
        let temp = TempDir::new().unwrap();
        let scheduler = scheduler(&temp);
        let store = FileScheduleStore::new(temp.path().join("schedule.json"));

        let past = Utc.with_ymd_and_hms(2026, 8, 27, 2, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 9, 30, 0).unwrap();

        let mut schedule = BackupSchedule::default();
        schedule.enabled = true;
        schedule.next_run = Some(past);
        store.save(&schedule).unwrap();

        let ran = scheduler.tick(now).unwrap();
        assert!(ran.is_some());

        let updated = store.load().unwrap();
        assert_eq!(updated.last_run, Some(now));
        assert!(updated.next_run.unwrap() > now);
    }

    #[test]
    fn test_invalid_cron_is_rejected() {
        let schedule = BackupSchedule {
            enabled: true,
            cron: "not a cron".to_string(),
            last_run: None,
            next_run: None,
        };
        assert!(matches!(
            schedule.next_occurrence_after(Utc::now()),
            Err(ScheduleError::InvalidCron { .. })
        ));
    }

    #[test]
    fn test_next_occurrence_daily_at_two() {
        let schedule = BackupSchedule::default();
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 9, 30, 0).unwrap();

        let next = schedule.next_occurrence_after(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 8, 28, 2, 0, 0).unwrap());
    }
}

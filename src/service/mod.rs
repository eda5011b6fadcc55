//! Backup service
//!
//! Stateless façade over a [`DocumentStore`] and a [`BlobStore`] that
//! produces, persists, enumerates, validates, and restores whole-database
//! snapshots. The service owns no persistent state of its own; the only
//! in-process state is an advisory guard preventing two restores from
//! interleaving writes against the same store.
//!
//! Concurrent export against a store that is being restored is a
//! documented hazard, not a supported scenario.

mod errors;
mod restore;

pub use errors::{BackupError, BackupResult};
pub use restore::{CancelFlag, RestoreOptions, RestoreReport};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::blob::{BlobError, BlobStore};
use crate::document::DocumentStore;
use crate::observability::Logger;
use crate::registry::COLLECTIONS;
use crate::snapshot::{
    backup_blob_key, backup_file_name, generate_backup_id, parse_backup_file_name,
    BackupSnapshot, SnapshotMetadata, BACKUP_KEY_PREFIX, SNAPSHOT_VERSION,
};

/// Version placeholder used in listing-time descriptors before the full
/// snapshot has been fetched.
const VERSION_UNKNOWN: &str = "unknown";

/// Snapshot metadata carried on a descriptor.
///
/// A descriptor built by [`BackupService::list_backups`] has
/// `total_documents = 0` and `version = "unknown"`: listing reads only
/// blob metadata, never the snapshot body. The values are reconciled when
/// [`BackupService::backup_details`] downloads the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorMetadata {
    pub total_documents: usize,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Listing-time view of a stored backup blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudBackupDescriptor {
    /// Backup id parsed from the blob name.
    pub id: String,
    /// Blob file name (without the key prefix).
    pub name: String,
    /// Blob size in bytes.
    pub size: u64,
    /// Server-side creation time of the blob.
    pub upload_date: DateTime<Utc>,
    /// URL or handle from which the blob can be fetched.
    pub download_url: String,
    pub metadata: DescriptorMetadata,
}

/// A descriptor reconciled against the full snapshot body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDetails {
    pub descriptor: CloudBackupDescriptor,
    pub per_collection_counts: BTreeMap<String, usize>,
}

/// Export, persist, list, validate, and restore database snapshots.
#[derive(Debug)]
pub struct BackupService {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    restore_guard: Mutex<()>,
}

impl BackupService {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            documents,
            blobs,
            restore_guard: Mutex::new(()),
        }
    }

    /// Export every registry collection into a fresh snapshot.
    ///
    /// Any collection read failure aborts the whole export; no partial
    /// snapshot is ever returned.
    pub fn export_snapshot(&self, description: Option<String>) -> BackupResult<BackupSnapshot> {
        let mut collections = BTreeMap::new();
        let mut total_documents = 0usize;

        for name in COLLECTIONS {
            let docs =
                self.documents
                    .read_all(name)
                    .map_err(|e| BackupError::Export {
                        collection: name.to_string(),
                        reason: e.to_string(),
                    })?;
            total_documents += docs.len();
            collections.insert(name.to_string(), docs);
        }

        let backup_id = generate_backup_id();
        Logger::info(
            "snapshot_exported",
            &[
                ("backup_id", &backup_id),
                ("total_documents", &total_documents.to_string()),
            ],
        );

        Ok(BackupSnapshot {
            collections,
            metadata: SnapshotMetadata {
                export_date: Utc::now(),
                version: SNAPSHOT_VERSION.to_string(),
                total_documents,
                backup_id,
                description,
            },
        })
    }

    /// Serialize `snapshot` and upload it under the backup key prefix.
    ///
    /// The blob name is derived from the export date and backup id, so the
    /// stored key is reproducible from the snapshot alone.
    pub fn persist_snapshot(
        &self,
        snapshot: &BackupSnapshot,
    ) -> BackupResult<CloudBackupDescriptor> {
        let name = backup_file_name(
            snapshot.metadata.export_date.date_naive(),
            &snapshot.metadata.backup_id,
        );
        let json = snapshot
            .to_json()
            .map_err(|e| BackupError::Upload(e.to_string()))?;

        let receipt = self
            .blobs
            .upload(&backup_blob_key(&name), json.as_bytes())
            .map_err(|e| BackupError::Upload(e.to_string()))?;

        Logger::info(
            "snapshot_uploaded",
            &[
                ("backup_id", &snapshot.metadata.backup_id),
                ("name", &name),
                ("size_bytes", &receipt.size.to_string()),
            ],
        );

        Ok(CloudBackupDescriptor {
            id: snapshot.metadata.backup_id.clone(),
            name,
            size: receipt.size,
            upload_date: receipt.created,
            download_url: receipt.download_url,
            metadata: DescriptorMetadata {
                total_documents: snapshot.metadata.total_documents,
                version: snapshot.metadata.version.clone(),
                description: snapshot.metadata.description.clone(),
            },
        })
    }

    /// Export and upload in one step.
    pub fn backup_to_cloud(
        &self,
        description: Option<String>,
    ) -> BackupResult<CloudBackupDescriptor> {
        let snapshot = self.export_snapshot(description)?;
        self.persist_snapshot(&snapshot)
    }

    /// Enumerate stored backups, newest first.
    ///
    /// Keys under the prefix that do not match the backup naming pattern
    /// are skipped with a warning; the namespace may hold unrelated or
    /// legacy objects. Only a failure of the underlying list call itself
    /// is an error.
    pub fn list_backups(&self) -> BackupResult<Vec<CloudBackupDescriptor>> {
        let keys = self
            .blobs
            .list_keys(BACKUP_KEY_PREFIX)
            .map_err(|e| BackupError::List(e.to_string()))?;

        let mut descriptors = Vec::new();
        for key in keys {
            let name = match key.strip_prefix(BACKUP_KEY_PREFIX) {
                Some(name) => name,
                None => continue,
            };
            let Some((_, backup_id)) = parse_backup_file_name(name) else {
                Logger::warn("backup_key_skipped", &[("key", &key)]);
                continue;
            };

            let meta = self
                .blobs
                .get_metadata(&key)
                .map_err(|e| BackupError::List(e.to_string()))?;
            let download_url = self
                .blobs
                .download_url(&key)
                .map_err(|e| BackupError::List(e.to_string()))?;

            descriptors.push(CloudBackupDescriptor {
                id: backup_id,
                name: name.to_string(),
                size: meta.size,
                upload_date: meta.created,
                download_url,
                metadata: DescriptorMetadata {
                    total_documents: 0,
                    version: VERSION_UNKNOWN.to_string(),
                    description: None,
                },
            });
        }

        descriptors.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(descriptors)
    }

    /// Delete the stored backup named `name`.
    ///
    /// Deleting a backup that does not exist surfaces as
    /// [`BackupError::NotFound`], distinct from success.
    pub fn delete_backup(&self, name: &str) -> BackupResult<()> {
        self.blobs
            .delete(&backup_blob_key(name))
            .map_err(|e| match e {
                BlobError::NotFound(_) => BackupError::NotFound(name.to_string()),
                other => BackupError::Delete {
                    name: name.to_string(),
                    reason: other.to_string(),
                },
            })?;

        Logger::info("backup_deleted", &[("name", name)]);
        Ok(())
    }

    /// Download and parse the stored backup named `name`.
    ///
    /// A blob that exists but does not parse as snapshot JSON is
    /// [`BackupError::Corrupt`], a distinct condition from transport
    /// failure.
    pub fn download_snapshot(&self, name: &str) -> BackupResult<BackupSnapshot> {
        let bytes = self
            .blobs
            .download(&backup_blob_key(name))
            .map_err(|e| match e {
                BlobError::NotFound(_) => BackupError::NotFound(name.to_string()),
                other => BackupError::Download {
                    name: name.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let json = String::from_utf8(bytes).map_err(|e| BackupError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        BackupSnapshot::from_json(&json).map_err(|e| BackupError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Restore the stored backup named `name` into the document store.
    ///
    /// Download and validation failures abort before any store mutation.
    /// Once batches start committing, a failure leaves earlier batches
    /// committed; see [`BackupError::Restore`].
    pub fn restore(&self, name: &str, options: &RestoreOptions) -> BackupResult<RestoreReport> {
        let _guard = self
            .restore_guard
            .try_lock()
            .map_err(|_| BackupError::RestoreInProgress)?;

        let snapshot = self.download_snapshot(name)?;
        if !snapshot.validate() {
            return Err(BackupError::Validation(format!(
                "snapshot '{name}' is missing registry collections or has a document count mismatch"
            )));
        }

        Logger::info(
            "restore_started",
            &[
                ("backup_id", &snapshot.metadata.backup_id),
                ("name", name),
                (
                    "delete_existing_data",
                    if options.delete_existing_data {
                        "true"
                    } else {
                        "false"
                    },
                ),
            ],
        );

        let result = restore::run_restore(self.documents.as_ref(), &snapshot, options);
        match &result {
            Ok(report) => Logger::info(
                "restore_completed",
                &[
                    ("backup_id", &report.backup_id),
                    ("documents_restored", &report.documents_restored.to_string()),
                    ("documents_deleted", &report.documents_deleted.to_string()),
                ],
            ),
            Err(e) => Logger::error("restore_failed", &[("name", name), ("reason", &e.to_string())]),
        }
        result
    }

    /// Fetch the full snapshot behind a listed backup and reconcile its
    /// descriptor with exact per-collection counts.
    ///
    /// The backup must appear in [`BackupService::list_backups`] to be
    /// addressable here; a blob that exists under the prefix but was not
    /// listed (for example, with a non-conforming name) is reported as
    /// not found.
    pub fn backup_details(&self, name: &str) -> BackupResult<BackupDetails> {
        let mut descriptor = self
            .list_backups()?
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| BackupError::NotFound(name.to_string()))?;

        let snapshot = self.download_snapshot(name)?;
        descriptor.metadata = DescriptorMetadata {
            total_documents: snapshot.metadata.total_documents,
            version: snapshot.metadata.version.clone(),
            description: snapshot.metadata.description.clone(),
        };

        Ok(BackupDetails {
            descriptor,
            per_collection_counts: snapshot.per_collection_counts(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::LocalBlobStore;
    use crate::document::MemoryDocumentStore;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn service_with(temp: &TempDir) -> (Arc<MemoryDocumentStore>, BackupService) {
        let documents = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(LocalBlobStore::new(temp.path().to_path_buf()));
        let service = BackupService::new(documents.clone(), blobs);
        (documents, service)
    }

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_export_covers_full_registry() {
        let temp = TempDir::new().unwrap();
        let (documents, service) = service_with(&temp);
        documents.insert("customers", "c1", fields(&[("name", json!("Dana"))]));

        let snapshot = service.export_snapshot(None).unwrap();

        assert_eq!(snapshot.collections.len(), COLLECTIONS.len());
        assert_eq!(snapshot.metadata.total_documents, 1);
        assert!(snapshot.validate());
    }

    #[test]
    fn test_export_aborts_on_read_failure() {
        let temp = TempDir::new().unwrap();
        let (documents, service) = service_with(&temp);
        documents.fail_reads_for("payments");

        let err = service.export_snapshot(None).unwrap_err();
        match err {
            BackupError::Export { collection, .. } => assert_eq!(collection, "payments"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_persist_then_download_is_equal() {
        let temp = TempDir::new().unwrap();
        let (documents, service) = service_with(&temp);
        documents.insert("orders", "o1", fields(&[("total", json!(45))]));

        let snapshot = service.export_snapshot(Some("weekly".to_string())).unwrap();
        let descriptor = service.persist_snapshot(&snapshot).unwrap();

        assert_eq!(descriptor.id, snapshot.metadata.backup_id);
        assert_eq!(descriptor.metadata.total_documents, 1);
        assert_eq!(descriptor.metadata.description.as_deref(), Some("weekly"));

        let downloaded = service.download_snapshot(&descriptor.name).unwrap();
        assert_eq!(downloaded, snapshot);
    }

    #[test]
    fn test_listing_is_lazy_and_sorted() {
        let temp = TempDir::new().unwrap();
        let (_, service) = service_with(&temp);

        let first = service.export_snapshot(None).unwrap();
        service.persist_snapshot(&first).unwrap();
        let second = service.export_snapshot(None).unwrap();
        service.persist_snapshot(&second).unwrap();

        let listed = service.list_backups().unwrap();
        assert_eq!(listed.len(), 2);
        // Placeholder until details are fetched.
        assert_eq!(listed[0].metadata.total_documents, 0);
        assert!(listed[0].upload_date >= listed[1].upload_date);
    }

    #[test]
    fn test_listing_skips_unrelated_keys() {
        let temp = TempDir::new().unwrap();
        let (_, service) = service_with(&temp);
        let blobs = LocalBlobStore::new(temp.path().to_path_buf());
        blobs.upload("backups/readme.txt", b"not a backup").unwrap();

        let snapshot = service.export_snapshot(None).unwrap();
        service.persist_snapshot(&snapshot).unwrap();

        let listed = service.list_backups().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, snapshot.metadata.backup_id);
    }

    #[test]
    fn test_delete_missing_backup_is_not_found() {
        let temp = TempDir::new().unwrap();
        let (_, service) = service_with(&temp);

        let err = service
            .delete_backup("backup-2026-01-01-ghost.json")
            .unwrap_err();
        assert!(matches!(err, BackupError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_blob_is_distinct_from_missing() {
        let temp = TempDir::new().unwrap();
        let (_, service) = service_with(&temp);
        let blobs = LocalBlobStore::new(temp.path().to_path_buf());
        blobs
            .upload("backups/backup-2026-01-01-abc123def.json", b"{ not json")
            .unwrap();

        let err = service
            .download_snapshot("backup-2026-01-01-abc123def.json")
            .unwrap_err();
        assert!(matches!(err, BackupError::Corrupt { .. }));

        let err = service.download_snapshot("backup-2026-01-01-nope.json").unwrap_err();
        assert!(matches!(err, BackupError::NotFound(_)));
    }

    #[test]
    fn test_restore_rejects_invalid_snapshot() {
        let temp = TempDir::new().unwrap();
        let (_, service) = service_with(&temp);

        let mut snapshot = service.export_snapshot(None).unwrap();
        snapshot.metadata.total_documents = 99;
        let json = snapshot.to_json().unwrap();
        let blobs = LocalBlobStore::new(temp.path().to_path_buf());
        blobs
            .upload("backups/backup-2026-01-01-badcount1.json", json.as_bytes())
            .unwrap();

        let err = service
            .restore(
                "backup-2026-01-01-badcount1.json",
                &RestoreOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, BackupError::Validation(_)));
    }

    #[test]
    fn test_second_restore_while_one_runs_is_rejected() {
        use std::sync::Barrier;
        use std::thread;

        let temp = TempDir::new().unwrap();
        let (documents, source) = service_with(&temp);
        documents.insert("customers", "c1", Map::new());
        let snapshot = source.export_snapshot(None).unwrap();
        let name = source.persist_snapshot(&snapshot).unwrap().name;

        let target_docs = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(LocalBlobStore::new(temp.path().to_path_buf()));
        let target = Arc::new(BackupService::new(target_docs.clone(), blobs));

        // Hold the first restore's commit mid-flight so the guard is
        // provably held when the second call arrives.
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        target_docs.gate_next_commit(entered.clone(), release.clone());

        let running = {
            let target = target.clone();
            let name = name.clone();
            thread::spawn(move || target.restore(&name, &RestoreOptions::default()))
        };

        entered.wait();
        let err = target.restore(&name, &RestoreOptions::default()).unwrap_err();
        assert!(matches!(err, BackupError::RestoreInProgress));

        release.wait();
        assert!(running.join().unwrap().is_ok());
    }

    #[test]
    fn test_details_reconcile_counts() {
        let temp = TempDir::new().unwrap();
        let (documents, service) = service_with(&temp);
        documents.insert("customers", "c1", Map::new());
        documents.insert("customers", "c2", Map::new());

        let snapshot = service.export_snapshot(None).unwrap();
        let descriptor = service.persist_snapshot(&snapshot).unwrap();

        let details = service.backup_details(&descriptor.name).unwrap();
        assert_eq!(details.descriptor.metadata.total_documents, 2);
        assert_eq!(details.per_collection_counts["customers"], 2);
        assert_eq!(details.per_collection_counts["orders"], 0);
    }

    #[test]
    fn test_details_requires_listing_presence() {
        let temp = TempDir::new().unwrap();
        let (_, service) = service_with(&temp);

        let err = service.backup_details("backup-2026-01-01-ghost.json").unwrap_err();
        assert!(matches!(err, BackupError::NotFound(_)));
    }
}

//! Restore semantics: overwrite vs merge, destructive pre-clear, batch
//! chunking, and partial-failure accounting.

use std::sync::Arc;

use ledgervault::blob::LocalBlobStore;
use ledgervault::document::{DocumentStore, MemoryDocumentStore};
use ledgervault::service::{BackupError, BackupService, RestoreOptions};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn setup(temp: &TempDir) -> (Arc<MemoryDocumentStore>, BackupService) {
    let documents = Arc::new(MemoryDocumentStore::new());
    let blobs = Arc::new(LocalBlobStore::new(temp.path().to_path_buf()));
    let service = BackupService::new(documents.clone(), blobs);
    (documents, service)
}

/// Export and persist the source store's state, returning the stored
/// backup name. Target services created over the same temp dir share the
/// blob root and can restore it.
fn persist_from(source: &BackupService) -> String {
    let snapshot = source.export_snapshot(None).unwrap();
    source.persist_snapshot(&snapshot).unwrap().name
}

#[test]
fn restore_is_full_overwrite_not_merge() {
    let temp = TempDir::new().unwrap();
    let (source_docs, source) = setup(&temp);
    source_docs.insert("customers", "A", fields(&[("y", json!(2))]));
    let name = persist_from(&source);

    let (target_docs, target) = setup(&temp);
    target_docs.insert("customers", "A", fields(&[("x", json!(1))]));

    target.restore(&name, &RestoreOptions::default()).unwrap();

    let doc = target_docs.document("customers", "A").unwrap();
    assert_eq!(doc, fields(&[("y", json!(2))]));
    assert!(doc.get("x").is_none(), "restore must not merge old fields");
}

#[test]
fn additive_restore_leaves_unrelated_documents() {
    let temp = TempDir::new().unwrap();
    let (source_docs, source) = setup(&temp);
    source_docs.insert("customers", "A", Map::new());
    let name = persist_from(&source);

    let (target_docs, target) = setup(&temp);
    target_docs.insert("customers", "B", Map::new());

    let report = target.restore(&name, &RestoreOptions::default()).unwrap();

    // Union of existing and restored state.
    assert_eq!(report.documents_restored, 1);
    assert!(target_docs.document("customers", "A").is_some());
    assert!(target_docs.document("customers", "B").is_some());
}

#[test]
fn destructive_restore_removes_documents_absent_from_snapshot() {
    let temp = TempDir::new().unwrap();
    let (source_docs, source) = setup(&temp);
    source_docs.insert("customers", "A", Map::new());
    let name = persist_from(&source);

    let (target_docs, target) = setup(&temp);
    target_docs.insert("customers", "B", Map::new());

    let options = RestoreOptions {
        delete_existing_data: true,
        ..Default::default()
    };
    let report = target.restore(&name, &options).unwrap();

    assert_eq!(report.documents_deleted, 1);
    assert!(target_docs.document("customers", "A").is_some());
    assert!(target_docs.document("customers", "B").is_none());
}

#[test]
fn twelve_hundred_documents_commit_as_500_500_200() {
    let temp = TempDir::new().unwrap();
    let (source_docs, source) = setup(&temp);
    for i in 0..1200 {
        source_docs.insert("orders", &format!("o{i:04}"), fields(&[("n", json!(i))]));
    }
    let name = persist_from(&source);

    let (target_docs, target) = setup(&temp);
    let report = target.restore(&name, &RestoreOptions::default()).unwrap();

    assert_eq!(report.documents_restored, 1200);
    assert_eq!(target_docs.committed_batch_sizes(), vec![500, 500, 200]);
    assert_eq!(target_docs.read_all("orders").unwrap().len(), 1200);
}

#[test]
fn commit_failure_keeps_earlier_batches_and_reports_progress() {
    let temp = TempDir::new().unwrap();
    let (source_docs, source) = setup(&temp);
    for i in 0..1200 {
        source_docs.insert("orders", &format!("o{i:04}"), Map::new());
    }
    let name = persist_from(&source);

    let (target_docs, target) = setup(&temp);
    target_docs.fail_commits_after(2);

    let err = target
        .restore(&name, &RestoreOptions::default())
        .unwrap_err();

    match err {
        BackupError::Restore {
            documents_restored,
            ..
        } => assert_eq!(documents_restored, 1000),
        other => panic!("unexpected error: {other}"),
    }
    // The first two batches stay committed; nothing is rolled back.
    assert_eq!(target_docs.read_all("orders").unwrap().len(), 1000);
}

#[test]
fn restore_of_missing_backup_mutates_nothing() {
    let temp = TempDir::new().unwrap();
    let (target_docs, target) = setup(&temp);
    target_docs.insert("customers", "keep", Map::new());

    let err = target
        .restore("backup-2026-01-01-missing1.json", &RestoreOptions::default())
        .unwrap_err();

    assert!(matches!(err, BackupError::NotFound(_)));
    assert!(target_docs.document("customers", "keep").is_some());
    assert!(target_docs.committed_batch_sizes().is_empty());
}

#[test]
fn subset_restore_ignores_other_collections() {
    let temp = TempDir::new().unwrap();
    let (source_docs, source) = setup(&temp);
    source_docs.insert("customers", "c1", Map::new());
    source_docs.insert("suppliers", "s1", Map::new());
    let name = persist_from(&source);

    let (target_docs, target) = setup(&temp);
    let options = RestoreOptions {
        collections: Some(["customers".to_string()].into_iter().collect()),
        ..Default::default()
    };
    let report = target.restore(&name, &options).unwrap();

    assert_eq!(report.documents_restored, 1);
    assert!(target_docs.document("customers", "c1").is_some());
    assert!(target_docs.document("suppliers", "s1").is_none());
}

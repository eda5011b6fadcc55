//! Restore engine
//!
//! Applies a validated snapshot back into the document store through
//! bounded atomic batches.
//!
//! # Failure model
//!
//! Restore is NOT transactional across the whole operation, only within
//! each committed batch. A commit failure aborts the remaining work and
//! leaves earlier batches committed, so a failed restore can leave the
//! store in a mixed pre/post-restore state. The returned error carries
//! the number of documents committed before the failure.
//!
//! Cancellation is honored only at batch boundaries; a batch commit in
//! flight always completes (commits are atomic at the store level, so
//! interrupting one is not meaningful).

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::document::{DocumentStore, MAX_BATCH_OPERATIONS};
use crate::registry::COLLECTIONS;
use crate::snapshot::BackupSnapshot;

use super::errors::{BackupError, BackupResult};

/// Cooperative cancellation flag, checked at batch boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options controlling a restore invocation.
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Clear each target collection before writing the snapshot's
    /// documents. Without this, restore is additive: documents sharing an
    /// id are fully overwritten, others are left untouched.
    pub delete_existing_data: bool,

    /// Restrict the restore to these collections. `None` restores the
    /// full registry.
    pub collections: Option<BTreeSet<String>>,

    /// Cancellation flag shared with the caller.
    pub cancel: CancelFlag,
}

/// Summary of a completed restore.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub backup_id: String,
    pub documents_restored: usize,
    pub documents_deleted: usize,
    pub collections: Vec<String>,
}

/// Stage every selected collection's documents into 500-operation batches
/// and commit them in order.
///
/// The batch accumulator spans collections: a batch is committed only
/// when it reaches the ceiling or as the final flush, so a snapshot with
/// 1200 documents commits exactly 500/500/200.
pub(super) fn run_restore(
    store: &dyn DocumentStore,
    snapshot: &BackupSnapshot,
    options: &RestoreOptions,
) -> BackupResult<RestoreReport> {
    let mut restored = 0usize;
    let mut deleted = 0usize;
    let mut touched = Vec::new();

    let mut batch = store.begin_batch();

    for name in COLLECTIONS {
        if let Some(subset) = &options.collections {
            if !subset.contains(name) {
                continue;
            }
        }
        let Some(docs) = snapshot.collections.get(name) else {
            continue;
        };

        if options.cancel.is_cancelled() {
            return Err(BackupError::Cancelled {
                documents_restored: restored,
            });
        }

        if options.delete_existing_data {
            // Deletes are intentionally unbatched. A failure here leaves
            // the collection partially cleared; that is reported, not
            // rolled back.
            let existing = store.read_all(name).map_err(|e| BackupError::Restore {
                documents_restored: restored,
                reason: format!("reading '{name}' before clear: {e}"),
            })?;
            for doc in existing {
                store
                    .delete_document(name, &doc.id)
                    .map_err(|e| BackupError::Restore {
                        documents_restored: restored,
                        reason: format!("clearing '{name}/{}': {e}", doc.id),
                    })?;
                deleted += 1;
            }
        }

        touched.push(name.to_string());

        for doc in docs {
            batch
                .set(name, &doc.id, doc.fields.clone())
                .map_err(|e| BackupError::Restore {
                    documents_restored: restored,
                    reason: e.to_string(),
                })?;

            if batch.len() == MAX_BATCH_OPERATIONS {
                let size = batch.len();
                batch.commit().map_err(|e| BackupError::Restore {
                    documents_restored: restored,
                    reason: e.to_string(),
                })?;
                restored += size;

                if options.cancel.is_cancelled() {
                    return Err(BackupError::Cancelled {
                        documents_restored: restored,
                    });
                }
                batch = store.begin_batch();
            }
        }
    }

    if !batch.is_empty() {
        let size = batch.len();
        batch.commit().map_err(|e| BackupError::Restore {
            documents_restored: restored,
            reason: e.to_string(),
        })?;
        restored += size;
    }

    Ok(RestoreReport {
        backup_id: snapshot.metadata.backup_id.clone(),
        documents_restored: restored,
        documents_deleted: deleted,
        collections: touched,
    })
}

//! # In-Memory Document Store
//!
//! Reference implementation of [`DocumentStore`] backed by nested
//! `BTreeMap`s. Used by the test suites, which additionally rely on its
//! commit instrumentation and failure injection to exercise chunking and
//! partial-restore behavior.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Barrier, Mutex, RwLock};

use serde_json::{Map, Value};

use super::errors::{DocumentStoreError, DocumentStoreResult};
use super::{Document, DocumentStore, WriteBatch, MAX_BATCH_OPERATIONS};

type Collections = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// In-memory document store.
///
/// `BTreeMap` keys give the ordered-by-id reads the store contract
/// requires without an explicit sort.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    committed_batch_sizes: Mutex<Vec<usize>>,
    failing_reads: RwLock<HashSet<String>>,
    commits_before_failure: Mutex<Option<usize>>,
    commit_gate: Mutex<Option<(Arc<Barrier>, Arc<Barrier>)>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing the batch machinery.
    pub fn insert(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Fetch one document's field map, if present.
    pub fn document(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        let collections = self.collections.read().unwrap();
        collections.get(collection)?.get(id).cloned()
    }

    /// Sizes of every batch committed so far, in commit order.
    pub fn committed_batch_sizes(&self) -> Vec<usize> {
        self.committed_batch_sizes.lock().unwrap().clone()
    }

    /// Make every subsequent `read_all` of `collection` fail.
    pub fn fail_reads_for(&self, collection: &str) {
        self.failing_reads
            .write()
            .unwrap()
            .insert(collection.to_string());
    }

    /// Let the next `n` batch commits succeed, then fail every commit
    /// after that.
    pub fn fail_commits_after(&self, n: usize) {
        *self.commits_before_failure.lock().unwrap() = Some(n);
    }

    /// Park the next batch commit: it waits on `entered`, then on
    /// `release`, before applying its ops. Lets a test hold a commit
    /// mid-flight while exercising a concurrent caller.
    pub fn gate_next_commit(&self, entered: Arc<Barrier>, release: Arc<Barrier>) {
        *self.commit_gate.lock().unwrap() = Some((entered, release));
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read_all(&self, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        if self.failing_reads.read().unwrap().contains(collection) {
            return Err(DocumentStoreError::CollectionRead {
                collection: collection.to_string(),
                reason: "injected read failure".to_string(),
            });
        }

        let collections = self.collections.read().unwrap();
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    fn begin_batch(&self) -> Box<dyn WriteBatch + '_> {
        Box::new(MemoryBatch {
            store: self,
            ops: Vec::new(),
        })
    }

    fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let mut collections = self.collections.write().unwrap();
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

struct MemoryBatch<'a> {
    store: &'a MemoryDocumentStore,
    ops: Vec<(String, String, Map<String, Value>)>,
}

impl WriteBatch for MemoryBatch<'_> {
    fn set(
        &mut self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> DocumentStoreResult<()> {
        if self.ops.len() >= MAX_BATCH_OPERATIONS {
            return Err(DocumentStoreError::BatchFull {
                staged: self.ops.len(),
            });
        }
        self.ops
            .push((collection.to_string(), id.to_string(), fields));
        Ok(())
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    fn commit(self: Box<Self>) -> DocumentStoreResult<()> {
        let MemoryBatch { store, ops } = *self;

        {
            let committed = store.committed_batch_sizes.lock().unwrap().len();
            let limit = *store.commits_before_failure.lock().unwrap();
            if let Some(n) = limit {
                if committed >= n {
                    return Err(DocumentStoreError::CommitFailed(
                        "injected commit failure".to_string(),
                    ));
                }
            }
        }

        let gate = store.commit_gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.wait();
            release.wait();
        }

        // All-or-nothing: the write lock is held across every staged op.
        let mut collections = store.collections.write().unwrap();
        let size = ops.len();
        for (collection, id, fields) in ops {
            collections.entry(collection).or_default().insert(id, fields);
        }
        drop(collections);

        store.committed_batch_sizes.lock().unwrap().push(size);
        Ok(())
    }
}

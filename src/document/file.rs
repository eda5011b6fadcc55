//! # File-Backed Document Store
//!
//! One JSON file per collection under a data directory:
//! `<data_dir>/<collection>.json` holding `{ "<id>": { ...fields }, ... }`.
//!
//! This is what the CLI operates against when no remote store is in play.
//! Writes go through a temp file followed by a rename, so a crashed commit
//! never leaves a half-written collection file behind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::errors::{DocumentStoreError, DocumentStoreResult};
use super::{Document, DocumentStore, WriteBatch, MAX_BATCH_OPERATIONS};

type CollectionFile = BTreeMap<String, Map<String, Value>>;

/// Document store persisted as one JSON file per collection.
#[derive(Debug)]
pub struct FileDocumentStore {
    data_dir: PathBuf,
}

impl FileDocumentStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    fn load_collection(&self, collection: &str) -> DocumentStoreResult<CollectionFile> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(CollectionFile::new());
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| DocumentStoreError::CollectionRead {
                collection: collection.to_string(),
                reason: e.to_string(),
            })?;
        if contents.trim().is_empty() {
            return Ok(CollectionFile::new());
        }

        serde_json::from_str(&contents).map_err(|e| DocumentStoreError::CollectionRead {
            collection: collection.to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the collection's new contents to its temp sibling, returning
    /// the temp path. The caller renames it into place.
    fn stage_collection(
        &self,
        collection: &str,
        docs: &CollectionFile,
    ) -> DocumentStoreResult<PathBuf> {
        fs::create_dir_all(&self.data_dir).map_err(|e| DocumentStoreError::Io(e.to_string()))?;

        let json = serde_json::to_string_pretty(docs)
            .map_err(|e| DocumentStoreError::Io(e.to_string()))?;

        let tmp = self.data_dir.join(format!(".{collection}.json.tmp"));
        fs::write(&tmp, json).map_err(|e| DocumentStoreError::Io(e.to_string()))?;
        Ok(tmp)
    }

    fn store_collection(
        &self,
        collection: &str,
        docs: &CollectionFile,
    ) -> DocumentStoreResult<()> {
        let tmp = self.stage_collection(collection, docs)?;
        fs::rename(&tmp, self.collection_path(collection))
            .map_err(|e| DocumentStoreError::Io(e.to_string()))
    }
}

impl DocumentStore for FileDocumentStore {
    fn read_all(&self, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let docs = self.load_collection(collection)?;
        Ok(docs
            .into_iter()
            .map(|(id, fields)| Document::new(id, fields))
            .collect())
    }

    fn begin_batch(&self) -> Box<dyn WriteBatch + '_> {
        Box::new(FileBatch {
            store: self,
            ops: Vec::new(),
        })
    }

    fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let mut docs = self.load_collection(collection)?;
        if docs.remove(id).is_some() {
            self.store_collection(collection, &docs)
                .map_err(|e| DocumentStoreError::DeleteFailed {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

struct FileBatch<'a> {
    store: &'a FileDocumentStore,
    ops: Vec<(String, String, Map<String, Value>)>,
}

impl WriteBatch for FileBatch<'_> {
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
        let FileBatch { store, ops } = *self;

        // Group staged ops per collection so each file is rewritten once.
        let mut by_collection: BTreeMap<String, Vec<(String, Map<String, Value>)>> =
            BTreeMap::new();
        for (collection, id, fields) in ops {
            by_collection.entry(collection).or_default().push((id, fields));
        }

        // Two phases. First every collection's new file is staged to a
        // temp sibling; a failure here removes the staged files and
        // applies nothing. Only then are all of them renamed into place.
        // The rename phase is same-directory renames only and is the one
        // remaining window in which a crash can leave a batch partially
        // applied.
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (collection, ops) in by_collection {
            let result = store.load_collection(&collection).and_then(|mut docs| {
                for (id, fields) in ops {
                    docs.insert(id, fields);
                }
                store.stage_collection(&collection, &docs)
            });
            match result {
                Ok(tmp) => staged.push((tmp, store.collection_path(&collection))),
                Err(e) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(DocumentStoreError::CommitFailed(e.to_string()));
                }
            }
        }

        for (tmp, path) in staged {
            fs::rename(&tmp, &path).map_err(|e| DocumentStoreError::CommitFailed(e.to_string()))?;
        }
        Ok(())
    }
}

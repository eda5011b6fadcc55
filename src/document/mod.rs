//! Document store abstraction
//!
//! The backup engine treats the application's database as a generic
//! document store: named collections of JSON documents addressed by id.
//! Everything the engine needs is captured by [`DocumentStore`]:
//!
//! - read every document in a collection, ordered by id
//! - stage writes into an atomic batch (bounded at 500 operations)
//! - delete a single document
//!
//! The engine is agnostic to document shape. Fields are an arbitrary
//! JSON object; no schema is enforced here.

mod errors;
mod file;
mod memory;

pub use errors::{DocumentStoreError, DocumentStoreResult};
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Hard ceiling on operations staged into a single write batch.
///
/// Document stores with atomic batched writes commonly cap a batch at 500
/// operations. A [`WriteBatch`] refuses to stage past this limit; callers
/// must commit and begin a new batch.
pub const MAX_BATCH_OPERATIONS: usize = 500;

/// A single document: its id plus an arbitrary JSON field map.
///
/// On the wire the fields sit next to the id in one flat object:
/// `{"id": "cust-17", "name": "...", "balance": 1250}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Read/write access to a document database, as consumed by the backup
/// engine.
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Read every document in `collection`, ordered by document id.
    ///
    /// Ordering has no semantic weight but must be stable so repeated
    /// exports of unchanged data are byte-identical.
    fn read_all(&self, collection: &str) -> DocumentStoreResult<Vec<Document>>;

    /// Begin an empty write batch against this store.
    fn begin_batch(&self) -> Box<dyn WriteBatch + '_>;

    /// Delete one document. Deleting an id that does not exist is not an
    /// error.
    fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()>;
}

/// An accumulator of staged document writes, committed atomically.
///
/// A batch is all-or-nothing: either every staged operation is applied or
/// none is. Staging beyond [`MAX_BATCH_OPERATIONS`] fails with
/// [`DocumentStoreError::BatchFull`].
pub trait WriteBatch {
    /// Stage a full-overwrite set of `collection/id` to `fields`.
    ///
    /// Overwrite semantics: after commit the document holds exactly
    /// `fields`, regardless of what it held before. This is not a merge.
    fn set(
        &mut self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> DocumentStoreResult<()>;

    /// Number of operations currently staged.
    fn len(&self) -> usize;

    /// True if no operations are staged.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commit all staged operations atomically.
    fn commit(self: Box<Self>) -> DocumentStoreResult<()>;
}

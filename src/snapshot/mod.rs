//! Snapshot types and serialization
//!
//! A [`BackupSnapshot`] is the unit of persistence: every registry
//! collection's documents plus export metadata, serialized as one JSON
//! blob.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "collections": {
//!     "customers": [ {"id": "c1", "name": "Dana"}, ... ],
//!     ...
//!   },
//!   "metadata": {
//!     "exportDate": "2026-08-27T10:30:00Z",
//!     "version": "1.0.0",
//!     "totalDocuments": 42,
//!     "backupId": "1756290600000-k3x9mq2ab",
//!     "description": "before price update"
//!   }
//! }
//! ```
//!
//! Collections are kept in a `BTreeMap` and documents in id order, so
//! repeated exports of unchanged data serialize byte-identically.

mod naming;

pub use naming::{backup_blob_key, backup_file_name, parse_backup_file_name, BACKUP_KEY_PREFIX};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::registry::COLLECTIONS;

/// Snapshot format version written into every export.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Export metadata embedded in every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub total_documents: usize,
    pub backup_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A complete exported backup: all registry collections plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub collections: BTreeMap<String, Vec<Document>>,
    pub metadata: SnapshotMetadata,
}

impl BackupSnapshot {
    /// Structural validation, the pre-flight gate before restore.
    ///
    /// Returns false when a registry collection is missing from
    /// `collections` or the per-collection counts do not sum to
    /// `metadata.totalDocuments`. Presence and shape of `metadata` itself
    /// is already enforced at decode time by the typed parse.
    ///
    /// This does not inspect individual documents; a snapshot can pass
    /// validation and still hold garbage field values.
    pub fn validate(&self) -> bool {
        for name in COLLECTIONS {
            if !self.collections.contains_key(name) {
                return false;
            }
        }

        let counted: usize = self.collections.values().map(Vec::len).sum();
        counted == self.metadata.total_documents
    }

    /// Documents per collection, in collection-name order.
    pub fn per_collection_counts(&self) -> BTreeMap<String, usize> {
        self.collections
            .iter()
            .map(|(name, docs)| (name.clone(), docs.len()))
            .collect()
    }

    /// Serialize to pretty-printed JSON. Key order is stable, so equal
    /// snapshots serialize to equal bytes.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot from JSON bytes.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Generate a fresh backup id: millisecond timestamp plus nine random
/// alphanumeric characters. The timestamp keeps ids sortable; the suffix
/// makes collisions within one millisecond negligible.
pub fn generate_backup_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

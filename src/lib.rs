//! ledgervault - snapshot backup and restore for a document ledger
//!
//! Exports every tracked collection of a document store into one JSON
//! snapshot, persists snapshots as immutable blobs, and restores them
//! through bounded atomic write batches.

pub mod blob;
pub mod cli;
pub mod document;
pub mod http_server;
pub mod observability;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod snapshot;

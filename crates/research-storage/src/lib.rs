//! Storage layer for the research assistant.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for graph nodes, graph edges, and query history
//! - Time-prefixed query keys for ordered history scans
//! - Atomic whole-graph replacement via WriteBatch

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::QueryKey;

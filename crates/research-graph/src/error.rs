//! Graph error types.

use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Caller passed unusable input (e.g. an empty topic list)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Topic has no node in the graph
    #[error("Topic not found: {0}")]
    NotFound(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] research_storage::StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted graph violates a structural invariant
    #[error("Corrupt graph: {0}")]
    CorruptGraph(String),

    /// A thread panicked while holding the graph lock
    #[error("Graph lock poisoned")]
    LockPoisoned,
}

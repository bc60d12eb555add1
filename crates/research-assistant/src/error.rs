//! Error types for the research pipeline.

use research_graph::GraphError;
use research_storage::StorageError;
use thiserror::Error;

use crate::summarizer::SummarizerError;

/// Error returned by retrieval collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error from research memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error from a research session.
///
/// Collaborator failures pass through unchanged: display and source are the
/// collaborator's own.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Summarizer(#[from] SummarizerError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

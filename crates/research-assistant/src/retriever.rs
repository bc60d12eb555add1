//! Retrieval collaborator contract.
//!
//! Concrete retrievers (paper search, GitHub search) live outside this crate.
//! They are called once per query and are never retried here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use research_types::Document;

use crate::error::RetrievalError;

/// Source of documents for a research query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Short name used in logs (e.g. "papers", "github").
    fn name(&self) -> &str;

    /// Search for documents matching `query`.
    async fn search(&self, query: &str) -> Result<Vec<Document>, RetrievalError>;
}

/// Retriever returning canned documents.
///
/// Useful for testing without network access.
pub struct MockRetriever {
    name: String,
    default: Vec<Document>,
    by_query: HashMap<String, Vec<Document>>,
    failure: Option<RetrievalError>,
    calls: AtomicUsize,
}

impl MockRetriever {
    /// Create a retriever that returns `documents` for every query.
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            default: documents,
            by_query: HashMap::new(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a retriever whose every search fails with `error`.
    pub fn failing(name: impl Into<String>, error: RetrievalError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(name, Vec::new())
        }
    }

    /// Return `documents` for this exact query instead of the default set.
    pub fn with_query(mut self, query: impl Into<String>, documents: Vec<Document>) -> Self {
        self.by_query.insert(query.into(), documents);
        self
    }

    /// Number of searches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<Document>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ref error) = self.failure {
            return Err(error.clone());
        }

        Ok(self
            .by_query
            .get(query)
            .unwrap_or(&self.default)
            .clone())
    }
}

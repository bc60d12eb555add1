//! Concurrency-safe graph accumulator.
//!
//! Wraps a [`Graph`] behind a `RwLock` and normalizes raw topic labels with
//! an injected [`TopicNormalizer`].
//!
//! - `ingest` and `absorb` hold the write lock for the whole update, so
//!   readers never observe a partially ingested document.
//! - `top_neighbors`, `export`, `stats` and `merge` share the read lock.
//!
//! Normalization runs before the lock is taken.

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use research_types::{Document, DocumentId};
use tracing::{debug, info, instrument};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::normalize::{StopWordNormalizer, TopicNormalizer};
use crate::snapshot::GraphSnapshot;
use crate::types::{Edge, GraphStats, IngestOutcome, Node, Topic};

/// Session-scoped topic graph accumulator.
pub struct GraphAccumulator<N: TopicNormalizer = StopWordNormalizer> {
    graph: RwLock<Graph>,
    normalizer: N,
}

impl GraphAccumulator<StopWordNormalizer> {
    /// Create an empty accumulator with the default stop-word normalizer.
    pub fn new() -> Self {
        Self::with_normalizer(StopWordNormalizer::new())
    }
}

impl Default for GraphAccumulator<StopWordNormalizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TopicNormalizer> GraphAccumulator<N> {
    /// Create an empty accumulator with the given normalizer.
    pub fn with_normalizer(normalizer: N) -> Self {
        Self::from_graph(Graph::new(), normalizer)
    }

    /// Start from an existing graph (e.g. one loaded from storage).
    pub fn from_graph(graph: Graph, normalizer: N) -> Self {
        Self {
            graph: RwLock::new(graph),
            normalizer,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Graph>, GraphError> {
        self.graph.read().map_err(|_| GraphError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Graph>, GraphError> {
        self.graph.write().map_err(|_| GraphError::LockPoisoned)
    }

    /// Normalize a raw label with this accumulator's normalizer.
    pub fn normalize(&self, label: &str) -> Option<Topic> {
        self.normalizer.normalize(label)
    }

    /// Ingest a document with its extracted topic labels.
    ///
    /// Labels are normalized; labels that normalize to nothing are dropped
    /// and duplicates collapse. Ingesting the same document id again is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidInput`] if `topics` is empty or no label
    /// survives normalization.
    #[instrument(skip(self, document, topics), fields(document_id = %document.id, source = %document.source))]
    pub fn ingest<S: AsRef<str>>(
        &self,
        document: &Document,
        topics: &[S],
    ) -> Result<IngestOutcome, GraphError> {
        self.ingest_labels(&document.id, topics)
    }

    /// Ingest topic labels for a bare document id.
    pub fn ingest_labels<S: AsRef<str>>(
        &self,
        document_id: &str,
        topics: &[S],
    ) -> Result<IngestOutcome, GraphError> {
        if topics.is_empty() {
            return Err(GraphError::InvalidInput(format!(
                "document '{}' has no topics",
                document_id
            )));
        }

        let normalized: Vec<Topic> = topics
            .iter()
            .filter_map(|label| self.normalizer.normalize(label.as_ref()))
            .collect();

        if normalized.is_empty() {
            return Err(GraphError::InvalidInput(format!(
                "no topic of document '{}' survived normalization",
                document_id
            )));
        }

        if normalized.len() < topics.len() {
            debug!(
                dropped = topics.len() - normalized.len(),
                "Dropped labels that normalized to nothing"
            );
        }

        let mut graph = self.write()?;
        graph.ingest(document_id, &normalized)
    }

    /// Merge the current graph with `other` into a new graph.
    ///
    /// Neither the accumulator nor `other` is modified.
    pub fn merge(&self, other: &Graph) -> Result<Graph, GraphError> {
        Ok(self.read()?.merge(other))
    }

    /// Fold `other` into the accumulator's graph in place.
    #[instrument(skip(self, other), fields(other_nodes = other.node_count(), other_edges = other.edge_count()))]
    pub fn absorb(&self, other: &Graph) -> Result<(), GraphError> {
        let mut graph = self.write()?;
        graph.absorb(other);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Absorbed graph"
        );
        Ok(())
    }

    /// Up to `k` neighbors of the topic named by `label`, heaviest first.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the label has no node (including
    /// labels that normalize to nothing).
    pub fn top_neighbors(&self, label: &str, k: usize) -> Result<Vec<(Topic, usize)>, GraphError> {
        let topic = self
            .normalize(label)
            .ok_or_else(|| GraphError::NotFound(label.to_string()))?;
        self.read()?.top_neighbors(&topic, k)
    }

    /// Documents mentioning the topic named by `label`.
    pub fn documents_for(&self, label: &str) -> Result<BTreeSet<DocumentId>, GraphError> {
        let topic = self
            .normalize(label)
            .ok_or_else(|| GraphError::NotFound(label.to_string()))?;
        self.read()?.documents_for(&topic).cloned()
    }

    /// Copy of the node for `label`, if present.
    pub fn node(&self, label: &str) -> Result<Option<Node>, GraphError> {
        let Some(topic) = self.normalize(label) else {
            return Ok(None);
        };
        Ok(self.read()?.node(&topic).cloned())
    }

    /// Copy of the edge between two labels, if present.
    pub fn edge(&self, a: &str, b: &str) -> Result<Option<Edge>, GraphError> {
        let (Some(a), Some(b)) = (self.normalize(a), self.normalize(b)) else {
            return Ok(None);
        };
        Ok(self.read()?.edge(&a, &b).cloned())
    }

    /// Read-only snapshot for visualization.
    pub fn export(&self) -> Result<GraphSnapshot, GraphError> {
        Ok(self.read()?.export())
    }

    /// Summary counts.
    pub fn stats(&self) -> Result<GraphStats, GraphError> {
        Ok(self.read()?.stats())
    }

    /// Clone of the current graph (for persistence).
    pub fn graph(&self) -> Result<Graph, GraphError> {
        Ok(self.read()?.clone())
    }

    /// Consume the accumulator, returning the graph.
    pub fn into_graph(self) -> Result<Graph, GraphError> {
        self.graph.into_inner().map_err(|_| GraphError::LockPoisoned)
    }
}

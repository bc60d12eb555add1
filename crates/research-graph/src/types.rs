//! Graph data types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use research_types::DocumentId;
use serde::{Deserialize, Serialize};

/// A normalized concept label. Identity is the normalized string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Wrap an already normalized label.
    ///
    /// Normalizers call this; everyone else should go through a
    /// [`TopicNormalizer`](crate::normalize::TopicNormalizer) so identities agree.
    pub fn from_normalized(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The normalized label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Graph vertex: one topic plus where it has been seen.
///
/// The occurrence count is the size of the document-id set, so re-recording
/// a document never double-counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    topic: Topic,
    document_ids: BTreeSet<DocumentId>,
    first_seen: DateTime<Utc>,
}

impl Node {
    /// Create a node with no occurrences yet.
    pub fn new(topic: Topic, first_seen: DateTime<Utc>) -> Self {
        Self {
            topic,
            document_ids: BTreeSet::new(),
            first_seen,
        }
    }

    /// The topic this node represents.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Number of distinct documents mentioning the topic.
    pub fn count(&self) -> usize {
        self.document_ids.len()
    }

    /// Documents mentioning the topic, in id order.
    pub fn document_ids(&self) -> &BTreeSet<DocumentId> {
        &self.document_ids
    }

    /// When the topic was first encountered.
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    /// Record an occurrence. Returns `false` if the document was already recorded.
    pub(crate) fn record(&mut self, document_id: &str) -> bool {
        if self.document_ids.contains(document_id) {
            return false;
        }
        self.document_ids.insert(document_id.to_string())
    }

    /// Fold another node for the same topic into this one.
    pub(crate) fn absorb(&mut self, other: &Node) {
        debug_assert_eq!(self.topic, other.topic);
        self.document_ids
            .extend(other.document_ids.iter().cloned());
        self.first_seen = self.first_seen.min(other.first_seen);
    }
}

/// Canonical key for an unordered topic pair.
///
/// The lexicographically smaller topic is always `low`, so (a, b) and (b, a)
/// map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    low: Topic,
    high: Topic,
}

impl EdgeKey {
    /// Create the canonical key for two topics.
    pub fn new(a: &Topic, b: &Topic) -> Self {
        if a <= b {
            Self {
                low: a.clone(),
                high: b.clone(),
            }
        } else {
            Self {
                low: b.clone(),
                high: a.clone(),
            }
        }
    }

    /// Smaller endpoint.
    pub fn low(&self) -> &Topic {
        &self.low
    }

    /// Larger endpoint.
    pub fn high(&self) -> &Topic {
        &self.high
    }
}

/// Co-occurrence of two distinct topics in one or more documents.
///
/// Weight is the size of the supporting document-id set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    source: Topic,
    target: Topic,
    document_ids: BTreeSet<DocumentId>,
    first_seen: DateTime<Utc>,
}

impl Edge {
    /// Create an edge with no supporting documents yet.
    pub fn new(key: &EdgeKey, first_seen: DateTime<Utc>) -> Self {
        Self {
            source: key.low.clone(),
            target: key.high.clone(),
            document_ids: BTreeSet::new(),
            first_seen,
        }
    }

    /// Canonical key for this edge.
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(&self.source, &self.target)
    }

    /// Smaller endpoint.
    pub fn source(&self) -> &Topic {
        &self.source
    }

    /// Larger endpoint.
    pub fn target(&self) -> &Topic {
        &self.target
    }

    /// Check if this edge joins the given topics (in either order).
    pub fn connects(&self, a: &Topic, b: &Topic) -> bool {
        (self.source == *a && self.target == *b) || (self.source == *b && self.target == *a)
    }

    /// Number of distinct documents where both topics appear.
    pub fn weight(&self) -> usize {
        self.document_ids.len()
    }

    /// Supporting documents, in id order.
    pub fn document_ids(&self) -> &BTreeSet<DocumentId> {
        &self.document_ids
    }

    /// When the pair was first seen together.
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub(crate) fn record(&mut self, document_id: &str) -> bool {
        if self.document_ids.contains(document_id) {
            return false;
        }
        self.document_ids.insert(document_id.to_string())
    }

    pub(crate) fn absorb(&mut self, other: &Edge) {
        debug_assert!(self.connects(&other.source, &other.target));
        self.document_ids
            .extend(other.document_ids.iter().cloned());
        self.first_seen = self.first_seen.min(other.first_seen);
    }
}

/// What a single ingest changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Distinct topics processed after normalization and deduplication
    pub topics: usize,
    /// Nodes created by this ingest
    pub nodes_created: usize,
    /// Edges created by this ingest
    pub edges_created: usize,
    /// Node or edge occurrences newly recorded (0 when re-ingesting a document)
    pub occurrences_recorded: usize,
}

impl IngestOutcome {
    /// True if the ingest left the graph unchanged.
    pub fn is_noop(&self) -> bool {
        self.occurrences_recorded == 0
    }
}

/// Statistics about the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of topic nodes
    pub node_count: usize,
    /// Number of co-occurrence edges
    pub edge_count: usize,
    /// Number of distinct documents ingested
    pub document_count: usize,
}

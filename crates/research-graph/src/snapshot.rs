//! Read-only graph view for visualization collaborators.

use chrono::{DateTime, Utc};
use research_types::DocumentId;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::types::{GraphStats, Topic};

/// Node as exported: counts materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub topic: Topic,
    pub count: usize,
    pub document_ids: Vec<DocumentId>,
    pub first_seen: DateTime<Utc>,
}

/// Edge as exported: weights materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: Topic,
    pub target: Topic,
    pub weight: usize,
    pub document_ids: Vec<DocumentId>,
    pub first_seen: DateTime<Utc>,
}

/// Point-in-time copy of a graph.
///
/// Nodes are ordered by topic, edges by (source, target), so two snapshots
/// of equal graphs serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub stats: GraphStats,
}

impl GraphSnapshot {
    pub(crate) fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|n| NodeView {
                topic: n.topic().clone(),
                count: n.count(),
                document_ids: n.document_ids().iter().cloned().collect(),
                first_seen: n.first_seen(),
            })
            .collect();

        let edges = graph
            .edges()
            .map(|e| EdgeView {
                source: e.source().clone(),
                target: e.target().clone(),
                weight: e.weight(),
                document_ids: e.document_ids().iter().cloned().collect(),
                first_seen: e.first_seen(),
            })
            .collect();

        Self {
            nodes,
            edges,
            stats: graph.stats(),
        }
    }

    /// Find a node view by topic label.
    pub fn node(&self, topic: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.topic.as_str() == topic)
    }

    /// Serialize to pretty JSON for external renderers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

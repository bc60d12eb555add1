//! Topic co-occurrence graph.
//!
//! A [`Graph`] owns every topic node and every co-occurrence edge seen in a
//! session. Nodes and edges carry the set of document ids that support
//! them, so counts and weights are derived from set sizes:
//!
//! - Ingesting the same document twice changes nothing.
//! - Merging two graphs unions the sets, which makes merge associative and
//!   commutative.
//!
//! ## Usage
//!
//! ```rust
//! use research_graph::{Graph, Topic};
//!
//! let t = |s: &str| Topic::from_normalized(s);
//!
//! let mut graph = Graph::new();
//! graph.ingest("doc-1", &[t("transformer"), t("attention")]).unwrap();
//! graph.ingest("doc-2", &[t("transformer"), t("nlp")]).unwrap();
//!
//! let neighbors = graph.top_neighbors(&t("transformer"), 1).unwrap();
//! assert_eq!(neighbors, vec![(t("attention"), 1)]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use research_types::DocumentId;
use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::snapshot::GraphSnapshot;
use crate::types::{Edge, EdgeKey, GraphStats, IngestOutcome, Node, Topic};

/// Mapping from topic identity to node plus unordered topic pair to edge.
///
/// Invariant: both endpoints of every edge exist as nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeMap<Topic, Node>,
    edges: BTreeMap<EdgeKey, Edge>,
    /// topic -> neighboring topics; derived from `edges`
    adjacency: BTreeMap<Topic, BTreeSet<Topic>>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from stored parts, validating the endpoint invariant.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut graph = Graph::new();

        for node in nodes {
            let topic = node.topic().clone();
            if graph.nodes.insert(topic.clone(), node).is_some() {
                return Err(GraphError::CorruptGraph(format!(
                    "duplicate node for topic '{}'",
                    topic
                )));
            }
        }

        for edge in edges {
            let key = edge.key();
            if key.low() == key.high() {
                return Err(GraphError::CorruptGraph(format!(
                    "self edge on topic '{}'",
                    key.low()
                )));
            }
            if edge.source() != key.low() {
                return Err(GraphError::CorruptGraph(format!(
                    "edge {} -- {} is not in canonical order",
                    edge.source(),
                    edge.target()
                )));
            }
            for endpoint in [key.low(), key.high()] {
                if !graph.nodes.contains_key(endpoint) {
                    return Err(GraphError::CorruptGraph(format!(
                        "edge {} -- {} references missing topic '{}'",
                        key.low(),
                        key.high(),
                        endpoint
                    )));
                }
            }
            graph.link(&key);
            graph.edges.insert(key, edge);
        }

        Ok(graph)
    }

    /// Ingest one document's topics, stamping new nodes and edges with now.
    pub fn ingest(
        &mut self,
        document_id: &str,
        topics: &[Topic],
    ) -> Result<IngestOutcome, GraphError> {
        self.ingest_at(document_id, topics, Utc::now())
    }

    /// Ingest one document's topics, stamping new nodes and edges with `at`.
    ///
    /// Duplicate topics are collapsed (first occurrence wins). Every topic
    /// gets the document id added to its node; every unordered pair of
    /// distinct topics gets it added to its edge. Re-ingesting a document is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidInput`] if `topics` is empty.
    #[instrument(skip(self, topics, at), fields(topic_count = topics.len()))]
    pub fn ingest_at(
        &mut self,
        document_id: &str,
        topics: &[Topic],
        at: DateTime<Utc>,
    ) -> Result<IngestOutcome, GraphError> {
        if topics.is_empty() {
            return Err(GraphError::InvalidInput(format!(
                "document '{}' has no topics",
                document_id
            )));
        }

        let mut seen = BTreeSet::new();
        let distinct: Vec<&Topic> = topics.iter().filter(|t| seen.insert(*t)).collect();

        let mut outcome = IngestOutcome {
            topics: distinct.len(),
            ..Default::default()
        };

        for topic in &distinct {
            let node = self.nodes.entry((*topic).clone()).or_insert_with(|| {
                outcome.nodes_created += 1;
                Node::new((*topic).clone(), at)
            });
            if node.record(document_id) {
                outcome.occurrences_recorded += 1;
            }
        }

        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i + 1..] {
                let key = EdgeKey::new(a, b);
                if !self.edges.contains_key(&key) {
                    self.link(&key);
                    outcome.edges_created += 1;
                }
                let edge = self
                    .edges
                    .entry(key)
                    .or_insert_with_key(|key| Edge::new(key, at));
                if edge.record(document_id) {
                    outcome.occurrences_recorded += 1;
                }
            }
        }

        debug!(
            nodes_created = outcome.nodes_created,
            edges_created = outcome.edges_created,
            occurrences = outcome.occurrences_recorded,
            "Ingested document"
        );

        Ok(outcome)
    }

    /// Produce a new graph holding the union of `self` and `other`.
    ///
    /// Document-id sets are unioned and first-seen timestamps take the
    /// earlier value, so merge is associative and commutative. Neither input
    /// is modified.
    pub fn merge(&self, other: &Graph) -> Graph {
        let mut merged = self.clone();
        merged.absorb(other);
        merged
    }

    /// Fold `other` into `self` in place. Same semantics as [`Graph::merge`].
    pub fn absorb(&mut self, other: &Graph) {
        for (topic, node) in &other.nodes {
            match self.nodes.get_mut(topic) {
                Some(existing) => existing.absorb(node),
                None => {
                    self.nodes.insert(topic.clone(), node.clone());
                }
            }
        }

        for (key, edge) in &other.edges {
            match self.edges.get_mut(key) {
                Some(existing) => existing.absorb(edge),
                None => {
                    self.link(key);
                    self.edges.insert(key.clone(), edge.clone());
                }
            }
        }
    }

    /// Up to `k` neighbors of `topic` by descending edge weight.
    ///
    /// Ties are broken by ascending topic so results are deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `topic` has no node.
    pub fn top_neighbors(&self, topic: &Topic, k: usize) -> Result<Vec<(Topic, usize)>, GraphError> {
        if !self.nodes.contains_key(topic) {
            return Err(GraphError::NotFound(topic.to_string()));
        }

        let mut neighbors: Vec<(Topic, usize)> = self
            .adjacency
            .get(topic)
            .into_iter()
            .flatten()
            .filter_map(|neighbor| {
                self.edges
                    .get(&EdgeKey::new(topic, neighbor))
                    .map(|edge| (neighbor.clone(), edge.weight()))
            })
            .collect();

        neighbors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Documents mentioning `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `topic` has no node.
    pub fn documents_for(&self, topic: &Topic) -> Result<&BTreeSet<DocumentId>, GraphError> {
        self.nodes
            .get(topic)
            .map(Node::document_ids)
            .ok_or_else(|| GraphError::NotFound(topic.to_string()))
    }

    /// Look up a node.
    pub fn node(&self, topic: &Topic) -> Option<&Node> {
        self.nodes.get(topic)
    }

    /// Look up the edge between two topics (in either order).
    pub fn edge(&self, a: &Topic, b: &Topic) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    /// All nodes in topic order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in endpoint order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if nothing has been ingested.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Summary counts.
    pub fn stats(&self) -> GraphStats {
        let documents: BTreeSet<&DocumentId> = self
            .nodes
            .values()
            .flat_map(|n| n.document_ids().iter())
            .collect();

        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            document_count: documents.len(),
        }
    }

    /// Read-only, serializable view for visualization.
    pub fn export(&self) -> GraphSnapshot {
        GraphSnapshot::from_graph(self)
    }

    fn link(&mut self, key: &EdgeKey) {
        self.adjacency
            .entry(key.low().clone())
            .or_default()
            .insert(key.high().clone());
        self.adjacency
            .entry(key.high().clone())
            .or_default()
            .insert(key.low().clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn t(s: &str) -> Topic {
        Topic::from_normalized(s)
    }

    fn topics(labels: &[&str]) -> Vec<Topic> {
        labels.iter().map(|l| t(l)).collect()
    }

    fn fixed_time(days_ago: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_706_540_400, 0).unwrap() - chrono::Duration::days(days_ago)
    }

    fn transformer_graph() -> Graph {
        let mut graph = Graph::new();
        graph
            .ingest("1", &topics(&["transformer", "attention"]))
            .unwrap();
        graph.ingest("2", &topics(&["transformer", "nlp"])).unwrap();
        graph
    }

    fn assert_invariants(graph: &Graph) {
        for edge in graph.edges() {
            assert!(graph.node(edge.source()).is_some());
            assert!(graph.node(edge.target()).is_some());
        }
        for node in graph.nodes() {
            assert_eq!(node.count(), node.document_ids().len());
        }
    }

    // ==================== Ingest ====================

    #[test]
    fn test_transformer_scenario() {
        let graph = transformer_graph();

        assert_eq!(graph.node(&t("transformer")).unwrap().count(), 2);
        assert_eq!(graph.node(&t("attention")).unwrap().count(), 1);
        assert_eq!(
            graph
                .edge(&t("transformer"), &t("attention"))
                .unwrap()
                .weight(),
            1
        );
        assert_eq!(graph.edge(&t("transformer"), &t("nlp")).unwrap().weight(), 1);
        assert!(graph.edge(&t("attention"), &t("nlp")).is_none());
        assert_invariants(&graph);
    }

    #[test]
    fn test_ingest_empty_topics_fails() {
        let mut graph = Graph::new();
        let result = graph.ingest("doc-1", &[]);
        assert!(matches!(result, Err(GraphError::InvalidInput(_))));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_ingest_is_idempotent() {
        let mut graph = transformer_graph();
        let before = graph.clone();

        let outcome = graph
            .ingest("1", &topics(&["transformer", "attention"]))
            .unwrap();

        assert!(outcome.is_noop());
        assert_eq!(graph, before);
    }

    #[test]
    fn test_ingest_collapses_duplicate_topics() {
        let mut graph = Graph::new();
        let outcome = graph
            .ingest("doc-1", &topics(&["rust", "memory", "rust", "memory"]))
            .unwrap();

        assert_eq!(outcome.topics, 2);
        assert_eq!(outcome.nodes_created, 2);
        assert_eq!(outcome.edges_created, 1);
        assert_eq!(graph.node(&t("rust")).unwrap().count(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_single_topic_creates_no_edges() {
        let mut graph = Graph::new();
        graph.ingest("doc-1", &topics(&["rust"])).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_all_pairs_linked() {
        let mut graph = Graph::new();
        let outcome = graph
            .ingest("doc-1", &topics(&["a", "b", "c", "d"]))
            .unwrap();
        assert_eq!(outcome.edges_created, 6);
        assert_eq!(graph.edge_count(), 6);
        assert_invariants(&graph);
    }

    #[test]
    fn test_ingest_is_monotonic() {
        let mut graph = transformer_graph();
        let before: BTreeMap<Topic, usize> = graph
            .nodes()
            .map(|n| (n.topic().clone(), n.count()))
            .collect();

        graph
            .ingest("3", &topics(&["attention", "nlp", "bert"]))
            .unwrap();

        for (topic, count) in before {
            assert!(graph.node(&topic).unwrap().count() >= count);
        }
    }

    #[test]
    fn test_reingest_keeps_first_seen() {
        let mut graph = Graph::new();
        graph
            .ingest_at("doc-1", &topics(&["rust", "wasm"]), fixed_time(5))
            .unwrap();
        graph
            .ingest_at("doc-2", &topics(&["rust", "wasm"]), fixed_time(1))
            .unwrap();

        assert_eq!(graph.node(&t("rust")).unwrap().first_seen(), fixed_time(5));
        assert_eq!(
            graph.edge(&t("rust"), &t("wasm")).unwrap().first_seen(),
            fixed_time(5)
        );
    }

    // ==================== Top neighbors ====================

    #[test]
    fn test_top_neighbors_tie_breaks_lexicographically() {
        let graph = transformer_graph();
        let neighbors = graph.top_neighbors(&t("transformer"), 1).unwrap();
        assert_eq!(neighbors, vec![(t("attention"), 1)]);
    }

    #[test]
    fn test_top_neighbors_unknown_topic() {
        let graph = transformer_graph();
        let result = graph.top_neighbors(&t("unknown"), 1);
        assert!(matches!(result, Err(GraphError::NotFound(ref s)) if s == "unknown"));
    }

    #[test]
    fn test_top_neighbors_orders_by_weight() {
        let mut graph = Graph::new();
        graph.ingest("1", &topics(&["main", "zeta"])).unwrap();
        graph.ingest("2", &topics(&["main", "zeta"])).unwrap();
        graph.ingest("3", &topics(&["main", "alpha"])).unwrap();
        graph.ingest("4", &topics(&["beta", "gamma"])).unwrap();

        let neighbors = graph.top_neighbors(&t("main"), 10).unwrap();
        assert_eq!(neighbors, vec![(t("zeta"), 2), (t("alpha"), 1)]);
    }

    #[test]
    fn test_top_neighbors_limit_and_zero() {
        let mut graph = Graph::new();
        let mut labels = vec!["main".to_string()];
        labels.extend((0..10).map(|i| format!("topic-{}", i)));
        let all: Vec<Topic> = labels.iter().map(|l| t(l)).collect();
        graph.ingest("doc", &all).unwrap();

        assert_eq!(graph.top_neighbors(&t("main"), 5).unwrap().len(), 5);
        assert!(graph.top_neighbors(&t("main"), 0).unwrap().is_empty());
    }

    #[test]
    fn test_top_neighbors_isolated_topic() {
        let mut graph = Graph::new();
        graph.ingest("doc", &topics(&["lonely"])).unwrap();
        assert!(graph.top_neighbors(&t("lonely"), 3).unwrap().is_empty());
    }

    // ==================== Merge ====================

    fn graph_a() -> Graph {
        let mut g = Graph::new();
        g.ingest_at("1", &topics(&["transformer", "attention"]), fixed_time(10))
            .unwrap();
        g.ingest_at("2", &topics(&["transformer", "nlp"]), fixed_time(9))
            .unwrap();
        g
    }

    fn graph_b() -> Graph {
        let mut g = Graph::new();
        g.ingest_at("2", &topics(&["transformer", "nlp"]), fixed_time(2))
            .unwrap();
        g.ingest_at("3", &topics(&["nlp", "bert", "attention"]), fixed_time(1))
            .unwrap();
        g
    }

    fn graph_c() -> Graph {
        let mut g = Graph::new();
        g.ingest_at("4", &topics(&["rust", "wasm"]), fixed_time(20))
            .unwrap();
        g.ingest_at("3", &topics(&["bert", "attention"]), fixed_time(30))
            .unwrap();
        g
    }

    #[test]
    fn test_merge_unions_document_sets() {
        let merged = graph_a().merge(&graph_b());

        // Document "2" appears in both inputs but counts once.
        assert_eq!(merged.node(&t("transformer")).unwrap().count(), 2);
        assert_eq!(merged.node(&t("nlp")).unwrap().count(), 2);
        assert_eq!(merged.edge(&t("transformer"), &t("nlp")).unwrap().weight(), 1);
        assert_eq!(merged.edge(&t("nlp"), &t("bert")).unwrap().weight(), 1);
        assert_eq!(
            merged.node(&t("transformer")).unwrap().first_seen(),
            fixed_time(10)
        );
        assert_invariants(&merged);
    }

    #[test]
    fn test_merge_does_not_modify_inputs() {
        let a = graph_a();
        let b = graph_b();
        let (a_before, b_before) = (a.clone(), b.clone());
        let _ = a.merge(&b);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_merge_is_commutative() {
        assert_eq!(graph_a().merge(&graph_b()), graph_b().merge(&graph_a()));
    }

    #[test]
    fn test_merge_is_associative() {
        let (a, b, c) = (graph_a(), graph_b(), graph_c());
        assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = graph_a();
        assert_eq!(a.merge(&a), a);
    }

    #[test]
    fn test_merge_with_empty() {
        let a = graph_a();
        assert_eq!(a.merge(&Graph::new()), a);
        assert_eq!(Graph::new().merge(&a), a);
    }

    #[test]
    fn test_merge_neighbors_updated() {
        let merged = graph_a().merge(&graph_c());
        let neighbors = merged.top_neighbors(&t("attention"), 10).unwrap();
        assert_eq!(neighbors, vec![(t("bert"), 1), (t("transformer"), 1)]);
    }

    #[test]
    fn test_ingest_order_does_not_matter() {
        let docs: Vec<(String, Vec<Topic>)> = (0..20)
            .map(|i| {
                (
                    format!("doc-{}", i),
                    topics(&[["a", "b", "c", "d", "e"][i % 5], ["f", "g", "h"][i % 3], "common"]),
                )
            })
            .collect();

        let mut sequential = Graph::new();
        for (id, ts) in &docs {
            sequential.ingest_at(id, ts, fixed_time(0)).unwrap();
        }

        let mut shuffled_docs = docs.clone();
        shuffled_docs.shuffle(&mut rand::rng());
        let mut shuffled = Graph::new();
        for (id, ts) in &shuffled_docs {
            shuffled.ingest_at(id, ts, fixed_time(0)).unwrap();
        }

        assert_eq!(sequential, shuffled);
    }

    // ==================== Parts & stats ====================

    #[test]
    fn test_from_parts_roundtrip() {
        let graph = graph_a().merge(&graph_b());
        let rebuilt = Graph::from_parts(
            graph.nodes().cloned().collect(),
            graph.edges().cloned().collect(),
        )
        .unwrap();
        assert_eq!(rebuilt, graph);
    }

    #[test]
    fn test_from_parts_rejects_dangling_edge() {
        let graph = transformer_graph();
        let nodes: Vec<Node> = graph
            .nodes()
            .filter(|n| n.topic().as_str() != "nlp")
            .cloned()
            .collect();
        let result = Graph::from_parts(nodes, graph.edges().cloned().collect());
        assert!(matches!(result, Err(GraphError::CorruptGraph(_))));
    }

    #[test]
    fn test_from_parts_rejects_reversed_edge() {
        let graph = transformer_graph();
        let reversed: Edge = serde_json::from_str(
            r#"{"source":"transformer","target":"attention","document_ids":["1"],"first_seen":"2024-01-29T15:00:00Z"}"#,
        )
        .unwrap();
        let result = Graph::from_parts(graph.nodes().cloned().collect(), vec![reversed]);
        assert!(matches!(result, Err(GraphError::CorruptGraph(_))));
    }

    #[test]
    fn test_from_parts_rejects_duplicate_node() {
        let graph = transformer_graph();
        let mut nodes: Vec<Node> = graph.nodes().cloned().collect();
        nodes.push(nodes[0].clone());
        let result = Graph::from_parts(nodes, Vec::new());
        assert!(matches!(result, Err(GraphError::CorruptGraph(_))));
    }

    #[test]
    fn test_stats_and_documents_for() {
        let graph = transformer_graph();
        assert_eq!(
            graph.stats(),
            GraphStats {
                node_count: 3,
                edge_count: 2,
                document_count: 2,
            }
        );

        let docs = graph.documents_for(&t("transformer")).unwrap();
        assert!(docs.contains("1") && docs.contains("2"));
        assert!(matches!(
            graph.documents_for(&t("missing")),
            Err(GraphError::NotFound(_))
        ));
    }
}

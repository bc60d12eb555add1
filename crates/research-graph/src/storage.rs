//! Graph persistence.
//!
//! A session loads its history graph at start and saves the accumulated
//! graph at end through a [`GraphStore`]. Saving merges into whatever is
//! stored, so sessions that overlap on one store all keep their
//! contributions. [`RocksGraphStore`] keeps nodes and edges in their own
//! RocksDB column families.

use std::sync::{Arc, Mutex};

use research_storage::column_families::{CF_GRAPH_EDGES, CF_GRAPH_NODES};
use research_storage::Storage;
use tracing::{debug, info, instrument};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::types::{Edge, EdgeKey, GraphStats, Node, Topic};

/// Persistence collaborator for session graphs.
pub trait GraphStore: Send + Sync {
    /// Load the stored graph, or `None` if nothing has been saved.
    fn load(&self) -> Result<Option<Graph>, GraphError>;

    /// Merge `graph` into the stored graph.
    ///
    /// Returns the stats of the graph now stored.
    fn save(&self, graph: &Graph) -> Result<GraphStats, GraphError>;
}

const NODE_PREFIX: &str = "node:";
const EDGE_PREFIX: &str = "edge:";

/// Key format for nodes: node:{topic}
pub fn node_key(topic: &Topic) -> String {
    format!("{}{}", NODE_PREFIX, topic)
}

/// Key format for edges: edge:{len(low)}:{low}:{high}
///
/// The length prefix keeps keys unique for topics containing ':'.
pub fn edge_key(key: &EdgeKey) -> String {
    format!(
        "{}{}:{}:{}",
        EDGE_PREFIX,
        key.low().as_str().len(),
        key.low(),
        key.high()
    )
}

/// RocksDB-backed graph store.
pub struct RocksGraphStore {
    storage: Arc<Storage>,
}

impl RocksGraphStore {
    /// Create a new graph store wrapper.
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Get underlying storage.
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }
}

impl GraphStore for RocksGraphStore {
    #[instrument(skip(self))]
    fn load(&self) -> Result<Option<Graph>, GraphError> {
        let mut nodes = Vec::new();
        for (_, value) in self
            .storage
            .prefix_iterator(CF_GRAPH_NODES, NODE_PREFIX.as_bytes())?
        {
            let node: Node = serde_json::from_slice(&value)?;
            nodes.push(node);
        }

        if nodes.is_empty() {
            debug!("No stored graph");
            return Ok(None);
        }

        let mut edges = Vec::new();
        for (_, value) in self
            .storage
            .prefix_iterator(CF_GRAPH_EDGES, EDGE_PREFIX.as_bytes())?
        {
            let edge: Edge = serde_json::from_slice(&value)?;
            edges.push(edge);
        }

        let graph = Graph::from_parts(nodes, edges)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph"
        );
        Ok(Some(graph))
    }

    #[instrument(skip(self, graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    fn save(&self, graph: &Graph) -> Result<GraphStats, GraphError> {
        self.storage.exclusive(|| {
            let merged = match self.load()? {
                Some(stored) => stored.merge(graph),
                None => graph.clone(),
            };

            let mut node_entries = Vec::with_capacity(merged.node_count());
            for node in merged.nodes() {
                node_entries.push((
                    node_key(node.topic()).into_bytes(),
                    serde_json::to_vec(node)?,
                ));
            }

            let mut edge_entries = Vec::with_capacity(merged.edge_count());
            for edge in merged.edges() {
                edge_entries.push((edge_key(&edge.key()).into_bytes(), serde_json::to_vec(edge)?));
            }

            self.storage.replace_all(&[
                (CF_GRAPH_NODES, node_entries),
                (CF_GRAPH_EDGES, edge_entries),
            ])?;
            self.storage.flush()?;

            let stats = merged.stats();
            info!(
                stored_nodes = stats.node_count,
                stored_edges = stats.edge_count,
                "Saved graph"
            );
            Ok(stats)
        })
    }
}

/// In-process graph store. Useful for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryGraphStore {
    graph: Mutex<Option<Graph>>,
}

impl MemoryGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `graph`.
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            graph: Mutex::new(Some(graph)),
        }
    }
}

impl GraphStore for MemoryGraphStore {
    fn load(&self) -> Result<Option<Graph>, GraphError> {
        let guard = self.graph.lock().map_err(|_| GraphError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, graph: &Graph) -> Result<GraphStats, GraphError> {
        let mut guard = self.graph.lock().map_err(|_| GraphError::LockPoisoned)?;
        let merged = match guard.take() {
            Some(stored) => stored.merge(graph),
            None => graph.clone(),
        };
        let stats = merged.stats();
        *guard = Some(merged);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn t(s: &str) -> Topic {
        Topic::from_normalized(s)
    }

    fn create_test_store() -> (RocksGraphStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp_dir.path()).unwrap());
        (RocksGraphStore::new(storage), temp_dir)
    }

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.ingest("1", &[t("transformer"), t("attention")]).unwrap();
        graph.ingest("2", &[t("transformer"), t("nlp")]).unwrap();
        graph
    }

    #[test]
    fn test_load_empty_store() {
        let (store, _temp) = create_test_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let (store, _temp) = create_test_store();
        let graph = sample_graph();

        store.save(&graph).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, graph);
        assert_eq!(loaded.node(&t("transformer")).unwrap().count(), 2);
    }

    fn unrelated_graph() -> Graph {
        let mut graph = Graph::new();
        graph.ingest("9", &[t("rust"), t("wasm")]).unwrap();
        graph
    }

    #[test]
    fn test_save_merges_with_stored_graph() {
        let (store, _temp) = create_test_store();
        store.save(&sample_graph()).unwrap();
        let stats = store.save(&unrelated_graph()).unwrap();
        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.edge_count, 3);

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, sample_graph().merge(&unrelated_graph()));
        assert_eq!(loaded.node(&t("transformer")).unwrap().count(), 2);
        assert_eq!(loaded.node(&t("rust")).unwrap().count(), 1);
    }

    #[test]
    fn test_save_is_idempotent() {
        let (store, _temp) = create_test_store();
        let graph = sample_graph();
        store.save(&graph).unwrap();
        store.save(&graph).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), graph);
    }

    #[test]
    fn test_concurrent_saves_keep_every_graph() {
        let (store, _temp) = create_test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut graph = Graph::new();
                    graph
                        .ingest(&format!("doc-{}", i), &[t("shared"), t(&format!("topic {}", i))])
                        .unwrap();
                    store.save(&graph).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.node(&t("shared")).unwrap().count(), 6);
        assert_eq!(loaded.node_count(), 7);
        assert_eq!(loaded.edge_count(), 6);
    }

    #[test]
    fn test_topics_with_colons() {
        let (store, _temp) = create_test_store();
        let mut graph = Graph::new();
        graph.ingest("1", &[t("a:b"), t("c")]).unwrap();
        graph.ingest("2", &[t("a"), t("b:c")]).unwrap();

        store.save(&graph).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.edge_count(), 2);
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_load_rejects_dangling_edge() {
        let (store, _temp) = create_test_store();
        store.save(&sample_graph()).unwrap();
        store
            .storage()
            .delete(CF_GRAPH_NODES, node_key(&t("nlp")).as_bytes())
            .unwrap();

        assert!(matches!(store.load(), Err(GraphError::CorruptGraph(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let (store, _temp) = create_test_store();
        store
            .storage()
            .put(CF_GRAPH_NODES, b"node:broken", b"not json")
            .unwrap();
        assert!(matches!(store.load(), Err(GraphError::Serialization(_))));
    }

    #[test]
    fn test_edge_key_format() {
        let key = EdgeKey::new(&t("nlp"), &t("bert"));
        assert_eq!(edge_key(&key), "edge:4:bert:nlp");
        assert_eq!(node_key(&t("bert")), "node:bert");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryGraphStore::new();
        assert!(store.load().unwrap().is_none());

        let graph = sample_graph();
        store.save(&graph).unwrap();
        assert_eq!(store.load().unwrap(), Some(graph.clone()));

        store.save(&unrelated_graph()).unwrap();
        assert_eq!(
            store.load().unwrap(),
            Some(graph.merge(&unrelated_graph()))
        );

        let preloaded = MemoryGraphStore::with_graph(graph.clone());
        assert_eq!(preloaded.load().unwrap(), Some(graph));
    }
}

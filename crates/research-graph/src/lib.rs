//! # research-graph
//!
//! Query-scoped knowledge graph of research topics.
//!
//! Documents arrive with topic labels extracted by a summarizer. The graph
//! deduplicates topics by normalized identity, links topics that appear in
//! the same document, and merges session graphs so co-occurrence history
//! accumulates across sessions.
//!
//! ## Features
//! - Injected topic normalization (stop-word stripping by default)
//! - Idempotent ingestion keyed by document id
//! - Associative, commutative graph merge
//! - Deterministic top-neighbor queries
//! - Snapshot export for visualization
//! - RocksDB persistence between sessions

pub mod accumulator;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod snapshot;
pub mod storage;
pub mod types;

pub use accumulator::GraphAccumulator;
pub use error::GraphError;
pub use graph::Graph;
pub use normalize::{is_stop_word, IdentityNormalizer, StopWordNormalizer, TopicNormalizer};
pub use snapshot::{EdgeView, GraphSnapshot, NodeView};
pub use storage::{GraphStore, MemoryGraphStore, RocksGraphStore};
pub use types::{Edge, EdgeKey, GraphStats, IngestOutcome, Node, Topic};

//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - graph_nodes: Topic nodes, rewritten wholesale on session save
//! - graph_edges: Co-occurrence edges, rewritten wholesale on session save
//! - queries: Append-only research query history (compressed)

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for topic nodes
pub const CF_GRAPH_NODES: &str = "graph_nodes";

/// Column family name for co-occurrence edges
pub const CF_GRAPH_EDGES: &str = "graph_edges";

/// Column family name for research query history
pub const CF_QUERIES: &str = "queries";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_GRAPH_NODES, CF_GRAPH_EDGES, CF_QUERIES];

/// Create column family options for query history (append-only, compressed)
fn queries_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_GRAPH_NODES, Options::default()),
        ColumnFamilyDescriptor::new(CF_GRAPH_EDGES, Options::default()),
        ColumnFamilyDescriptor::new(CF_QUERIES, queries_options()),
    ]
}

//! RocksDB wrapper for research assistant storage.
//!
//! Provides:
//! - Database open/close with column family setup
//! - Atomic replacement of whole column families (graph save)
//! - Single-key and prefix reads
//! - Time-ordered query history

use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_QUERIES};
use crate::error::StorageError;
use crate::keys::{QueryKey, QUERY_PREFIX};

/// A column family name paired with its complete new contents.
pub type ColumnFamilyContents<'a> = (&'a str, Vec<(Vec<u8>, Vec<u8>)>);

/// Main storage interface for the research assistant
pub struct Storage {
    db: DB,
    /// Serializes read-modify-write cycles such as graph merges.
    write_lock: Mutex<()>,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(2);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, cf_name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    // ===== Generic Column Family Operations =====

    /// Put a value into a specific column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    /// Get a value from a specific column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(cf_name)?;
        let result = self.db.get_cf(cf, key)?;
        Ok(result)
    }

    /// Delete a value from a specific column family.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.delete_cf(cf, key)?;
        Ok(())
    }

    /// Iterate over entries with a given prefix in a column family.
    ///
    /// Returns (key, value) pairs in key order.
    #[allow(clippy::type_complexity)]
    pub fn prefix_iterator(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let cf = self.cf(cf_name)?;

        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            // Stop if we've passed the prefix
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    /// Replace the full contents of one or more column families atomically.
    ///
    /// Every existing key in each named column family is deleted and the
    /// given entries written, all in a single write batch. Readers see either
    /// the old contents or the new contents, never a mix.
    ///
    /// Returns the number of entries written.
    pub fn replace_all(&self, contents: &[ColumnFamilyContents<'_>]) -> Result<usize, StorageError> {
        let mut batch = WriteBatch::default();
        let mut written = 0;
        let mut deleted = 0;

        for (cf_name, entries) in contents {
            let cf = self.cf(cf_name)?;

            for item in self.db.iterator_cf(cf, IteratorMode::Start) {
                let (key, _) = item?;
                batch.delete_cf(cf, &key);
                deleted += 1;
            }

            for (key, value) in entries {
                batch.put_cf(cf, key, value);
                written += 1;
            }
        }

        self.db.write(batch)?;
        debug!(written, deleted, "Replaced column family contents");
        Ok(written)
    }

    /// Run `f` while holding the storage write lock.
    ///
    /// Callers that read, modify and write back the same keys go through
    /// here so concurrent cycles cannot interleave.
    pub fn exclusive<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        f()
    }

    // ===== Query History =====

    /// Store a research query record.
    pub fn put_query(&self, key: &QueryKey, bytes: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(CF_QUERIES)?;
        self.db.put_cf(cf, key.to_bytes(), bytes)?;
        debug!(query_id = %key.query_id(), "Stored query");
        Ok(())
    }

    /// Get all stored queries in time order.
    pub fn get_queries(&self) -> Result<Vec<(QueryKey, Vec<u8>)>, StorageError> {
        self.prefix_iterator(CF_QUERIES, QUERY_PREFIX.as_bytes())?
            .into_iter()
            .map(|(key, value)| Ok((QueryKey::from_bytes(&key)?, value)))
            .collect()
    }

    // ===== Admin Operations =====

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(cf)?;
            }
        }
        Ok(())
    }

    /// Get database statistics.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let mut stats = StorageStats::default();

        if let Some(cf) = self.db.cf_handle(crate::column_families::CF_GRAPH_NODES) {
            stats.node_count = self.count_cf_entries(cf)?;
        }

        if let Some(cf) = self.db.cf_handle(crate::column_families::CF_GRAPH_EDGES) {
            stats.edge_count = self.count_cf_entries(cf)?;
        }

        if let Some(cf) = self.db.cf_handle(CF_QUERIES) {
            stats.query_count = self.count_cf_entries(cf)?;
        }

        Ok(stats)
    }

    fn count_cf_entries(&self, cf: &rocksdb::ColumnFamily) -> Result<u64, StorageError> {
        let mut count = 0u64;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);
        for item in iter {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

/// Statistics about the storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored topic nodes
    pub node_count: u64,
    /// Number of stored co-occurrence edges
    pub edge_count: u64,
    /// Number of recorded queries
    pub query_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_families::{CF_GRAPH_EDGES, CF_GRAPH_NODES};
    use tempfile::TempDir;

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_open_creates_column_families() {
        let (storage, _temp) = create_test_storage();
        for cf_name in ALL_CF_NAMES {
            assert!(
                storage.db.cf_handle(cf_name).is_some(),
                "CF {} should exist",
                cf_name
            );
        }
    }

    #[test]
    fn test_generic_put_get_delete() {
        let (storage, _temp) = create_test_storage();

        storage.put(CF_GRAPH_NODES, b"node:rust", b"{}").unwrap();
        assert_eq!(
            storage.get(CF_GRAPH_NODES, b"node:rust").unwrap(),
            Some(b"{}".to_vec())
        );

        storage.delete(CF_GRAPH_NODES, b"node:rust").unwrap();
        assert!(storage.get(CF_GRAPH_NODES, b"node:rust").unwrap().is_none());
    }

    #[test]
    fn test_unknown_column_family() {
        let (storage, _temp) = create_test_storage();
        let result = storage.put("nope", b"k", b"v");
        assert!(matches!(result, Err(StorageError::ColumnFamilyNotFound(_))));
    }

    #[test]
    fn test_prefix_iterator_stops_at_prefix_end() {
        let (storage, _temp) = create_test_storage();
        storage.put(CF_GRAPH_NODES, b"node:a", b"1").unwrap();
        storage.put(CF_GRAPH_NODES, b"node:b", b"2").unwrap();
        storage.put(CF_GRAPH_NODES, b"other:c", b"3").unwrap();

        let entries = storage.prefix_iterator(CF_GRAPH_NODES, b"node:").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, b"node:a".to_vec());
        assert_eq!(entries[1].0, b"node:b".to_vec());
    }

    #[test]
    fn test_replace_all_removes_stale_keys() {
        let (storage, _temp) = create_test_storage();
        storage.put(CF_GRAPH_NODES, b"node:old", b"x").unwrap();
        storage.put(CF_GRAPH_EDGES, b"edge:old", b"x").unwrap();

        let written = storage
            .replace_all(&[
                (CF_GRAPH_NODES, vec![(b"node:new".to_vec(), b"1".to_vec())]),
                (CF_GRAPH_EDGES, Vec::new()),
            ])
            .unwrap();

        assert_eq!(written, 1);
        assert!(storage.get(CF_GRAPH_NODES, b"node:old").unwrap().is_none());
        assert!(storage.get(CF_GRAPH_NODES, b"node:new").unwrap().is_some());
        assert!(storage.get(CF_GRAPH_EDGES, b"edge:old").unwrap().is_none());
    }

    #[test]
    fn test_replace_all_leaves_other_families_alone() {
        let (storage, _temp) = create_test_storage();
        let key = QueryKey::new(1_706_540_400_000);
        storage.put_query(&key, b"query").unwrap();

        storage
            .replace_all(&[(CF_GRAPH_NODES, Vec::new())])
            .unwrap();

        assert_eq!(storage.get_queries().unwrap().len(), 1);
    }

    #[test]
    fn test_exclusive_serializes_updates() {
        let (storage, _temp) = create_test_storage();
        let storage = std::sync::Arc::new(storage);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = std::sync::Arc::clone(&storage);
                std::thread::spawn(move || {
                    storage
                        .exclusive(|| {
                            let current = storage
                                .get(CF_GRAPH_NODES, b"counter")?
                                .map(|v| v[0])
                                .unwrap_or(0);
                            storage.put(CF_GRAPH_NODES, b"counter", &[current + 1])
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            storage.get(CF_GRAPH_NODES, b"counter").unwrap(),
            Some(vec![8])
        );
    }

    #[test]
    fn test_queries_in_time_order() {
        let (storage, _temp) = create_test_storage();
        let later = QueryKey::new(2_000);
        let earlier = QueryKey::new(1_000);

        storage.put_query(&later, b"second").unwrap();
        storage.put_query(&earlier, b"first").unwrap();

        let queries = storage.get_queries().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].0, earlier);
        assert_eq!(queries[0].1, b"first".to_vec());
        assert_eq!(queries[1].0, later);
    }

    #[test]
    fn test_stats() {
        let (storage, _temp) = create_test_storage();
        storage.put(CF_GRAPH_NODES, b"node:a", b"1").unwrap();
        storage.put(CF_GRAPH_NODES, b"node:b", b"1").unwrap();
        storage.put(CF_GRAPH_EDGES, b"edge:a\0b", b"1").unwrap();
        storage.put_query(&QueryKey::new(1_000), b"q").unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(
            stats,
            StorageStats {
                node_count: 2,
                edge_count: 1,
                query_count: 1,
            }
        );
    }

    #[test]
    fn test_reopen_preserves_data() {
        let temp_dir = TempDir::new().unwrap();
        {
            let storage = Storage::open(temp_dir.path()).unwrap();
            storage.put(CF_GRAPH_NODES, b"node:rust", b"1").unwrap();
            storage.flush().unwrap();
        }
        let storage = Storage::open(temp_dir.path()).unwrap();
        assert!(storage.get(CF_GRAPH_NODES, b"node:rust").unwrap().is_some());
    }
}

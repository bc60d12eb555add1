//! Key encoding and decoding for storage layer.
//!
//! Query key format: `query:{timestamp_ms:013}:{ulid}`
//! - timestamp_ms: milliseconds since Unix epoch, zero-padded to 13 digits
//! - ulid: 26-character ULID for uniqueness within same millisecond
//!
//! This format makes query history iterate in time order.

use std::str::FromStr;

use ulid::Ulid;

use crate::error::StorageError;

/// Prefix shared by all query keys.
pub const QUERY_PREFIX: &str = "query:";

/// Key for research query history
/// Format: query:{timestamp_ms:013}:{ulid}
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryKey {
    /// When the query was issued, in milliseconds
    pub timestamp_ms: i64,
    /// Unique identifier (also serves as query_id)
    pub ulid: Ulid,
}

impl QueryKey {
    /// Create a new query key with given timestamp and fresh ULID
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            ulid: Ulid::new(),
        }
    }

    /// Create a query key from existing timestamp and ULID
    pub fn from_parts(timestamp_ms: i64, ulid: Ulid) -> Self {
        Self { timestamp_ms, ulid }
    }

    /// Create a query key from a query_id string, using the ULID's embedded timestamp
    pub fn from_query_id(query_id: &str) -> Result<Self, StorageError> {
        let ulid: Ulid = query_id
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid query_id ULID: {}", e)))?;
        let timestamp_ms = ulid.timestamp_ms() as i64;
        Ok(Self { timestamp_ms, ulid })
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        // Zero-pad timestamp to 13 digits for lexicographic sorting
        format!("{}{:013}:{}", QUERY_PREFIX, self.timestamp_ms, self.ulid).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        s.parse()
    }

    /// Get the query_id (ULID string) for this key
    pub fn query_id(&self) -> String {
        self.ulid.to_string()
    }
}

impl FromStr for QueryKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "query" {
            return Err(StorageError::Key(format!("Invalid query key format: {}", s)));
        }

        let timestamp_ms: i64 = parts[1]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))?;
        let ulid: Ulid = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid ULID: {}", e)))?;

        Ok(Self { timestamp_ms, ulid })
    }
}

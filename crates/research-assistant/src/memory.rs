//! Research memory: query history and insights.
//!
//! Each query is stored with its retrieved document ids and the normalized
//! topics extracted for it. Insights relate a new query to past ones by
//! shared topics.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use research_graph::Topic;
use research_storage::{QueryKey, Storage};
use research_types::{DocumentId, MemorySettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::MemoryError;

/// One stored research query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// ULID of the query
    pub query_id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    /// Documents retrieved for this query
    pub document_ids: Vec<DocumentId>,
    /// Normalized topics, sorted
    pub topics: Vec<Topic>,
}

/// A past query related to the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuery {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    /// Topics shared with the current query, sorted
    pub shared_topics: Vec<Topic>,
}

/// Personalized insights for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Past queries, most related first
    pub related: Vec<RelatedQuery>,
    /// Titles of the leading current findings
    pub key_connections: Vec<String>,
}

impl Insights {
    /// True when no past query relates to this one.
    pub fn is_first_query(&self) -> bool {
        self.related.is_empty()
    }

    /// Render as display text.
    pub fn render(&self) -> String {
        if self.is_first_query() {
            return "This is your first query on this topic.".to_string();
        }

        let mut lines = vec!["Related to your previous research:".to_string()];
        lines.extend(self.related.iter().map(|r| format!("- {}", r.query)));

        if !self.key_connections.is_empty() {
            lines.push(String::new());
            lines.push("Key connections in current findings:".to_string());
            lines.extend(self.key_connections.iter().map(|t| format!("- {}", t)));
        }

        lines.join("\n")
    }
}

impl fmt::Display for Insights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Query history backed by the `queries` column family.
pub struct ResearchMemory {
    storage: Arc<Storage>,
    settings: MemorySettings,
}

impl ResearchMemory {
    /// Create a research memory over shared storage.
    pub fn new(storage: Arc<Storage>, settings: MemorySettings) -> Self {
        Self { storage, settings }
    }

    /// Record a query issued now.
    pub fn record_query(
        &self,
        query: &str,
        document_ids: Vec<DocumentId>,
        topics: &BTreeSet<Topic>,
    ) -> Result<QueryRecord, MemoryError> {
        self.record_query_at(query, document_ids, topics, Utc::now())
    }

    /// Record a query issued at `timestamp`.
    #[instrument(skip(self, document_ids, topics), fields(documents = document_ids.len(), topics = topics.len()))]
    pub fn record_query_at(
        &self,
        query: &str,
        document_ids: Vec<DocumentId>,
        topics: &BTreeSet<Topic>,
        timestamp: DateTime<Utc>,
    ) -> Result<QueryRecord, MemoryError> {
        let key = QueryKey::new(timestamp.timestamp_millis());
        let record = QueryRecord {
            query_id: key.query_id(),
            query: query.to_string(),
            timestamp,
            document_ids,
            topics: topics.iter().cloned().collect(),
        };

        let bytes = serde_json::to_vec(&record)?;
        self.storage.put_query(&key, &bytes)?;
        debug!(query_id = %record.query_id, "Recorded query");
        Ok(record)
    }

    /// All recorded queries, oldest first.
    pub fn history(&self) -> Result<Vec<QueryRecord>, MemoryError> {
        self.storage
            .get_queries()?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(MemoryError::from))
            .collect()
    }

    /// Relate a query to history.
    ///
    /// A past query is related when it shares at least one topic or has the
    /// same text (ignoring case and surrounding whitespace). Related queries
    /// rank by shared topic count, then recency.
    pub fn insights(
        &self,
        query: &str,
        topics: &BTreeSet<Topic>,
        finding_titles: &[&str],
    ) -> Result<Insights, MemoryError> {
        let needle = query.trim().to_lowercase();

        let mut related: Vec<RelatedQuery> = self
            .history()?
            .into_iter()
            .filter_map(|record| {
                let shared_topics: Vec<Topic> = record
                    .topics
                    .iter()
                    .filter(|t| topics.contains(*t))
                    .cloned()
                    .collect();
                let same_text = record.query.trim().to_lowercase() == needle;
                if shared_topics.is_empty() && !same_text {
                    return None;
                }
                Some(RelatedQuery {
                    query: record.query,
                    timestamp: record.timestamp,
                    shared_topics,
                })
            })
            .collect();

        related.sort_by(|a, b| {
            b.shared_topics
                .len()
                .cmp(&a.shared_topics.len())
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        related.truncate(self.settings.max_related);

        Ok(Insights {
            related,
            key_connections: finding_titles
                .iter()
                .take(self.settings.key_connections)
                .map(|t| t.to_string())
                .collect(),
        })
    }
}

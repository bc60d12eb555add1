//! Per-query research pipeline.
//!
//! A session owns one [`GraphAccumulator`]. Opening a session loads the
//! history graph; each query retrieves, summarizes and ingests documents;
//! closing saves the accumulated graph.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use research_graph::{
    GraphAccumulator, GraphSnapshot, GraphStats, GraphStore, RocksGraphStore,
    StopWordNormalizer, Topic,
};
use research_storage::Storage;
use research_types::{Document, DocumentId, Settings};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::SessionError;
use crate::memory::{Insights, ResearchMemory};
use crate::retriever::Retriever;
use crate::summarizer::{Summarizer, Summary};

/// One summarized, ingested document.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub document: Document,
    pub summary: Summary,
    /// Normalized topics, in summarizer order
    pub topics: Vec<Topic>,
}

/// Result of one research query.
#[derive(Debug, Clone, Serialize)]
pub struct Findings {
    pub query: String,
    pub papers: Vec<Finding>,
    pub projects: Vec<Finding>,
    /// Documents dropped because their summaries had no usable topics
    pub skipped: Vec<DocumentId>,
    pub insights: Insights,
}

impl Findings {
    /// All normalized topics across papers and projects.
    pub fn topics(&self) -> BTreeSet<Topic> {
        self.papers
            .iter()
            .chain(&self.projects)
            .flat_map(|f| f.topics.iter().cloned())
            .collect()
    }

    /// Render as display text.
    pub fn render(&self) -> String {
        let mut out = String::from("Findings:\n=========\n\nRelevant Papers:\n");
        for finding in &self.papers {
            out.push_str(&format!(
                "\nTitle: {}\nSummary: {}\n",
                finding.document.title, finding.summary.text
            ));
        }

        out.push_str("\nRelevant GitHub Projects:\n");
        for finding in &self.projects {
            out.push_str(&format!(
                "\nRepo: {}\nSummary: {}\n",
                finding.document.title, finding.summary.text
            ));
        }

        out.push_str("\nInsights based on your research history:\n");
        out.push_str(&self.insights.render());
        out
    }
}

/// A research session.
pub struct ResearchSession {
    accumulator: GraphAccumulator<StopWordNormalizer>,
    store: Arc<dyn GraphStore>,
    retrievers: Vec<Arc<dyn Retriever>>,
    summarizer: Arc<dyn Summarizer>,
    memory: Option<ResearchMemory>,
    settings: Settings,
}

impl ResearchSession {
    /// Open a session, absorbing the stored history graph if there is one.
    #[instrument(skip_all)]
    pub fn open(
        settings: Settings,
        store: Arc<dyn GraphStore>,
        retrievers: Vec<Arc<dyn Retriever>>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self, SessionError> {
        let accumulator =
            GraphAccumulator::with_normalizer(StopWordNormalizer::from_settings(&settings.graph));

        if let Some(history) = store.load()? {
            accumulator.absorb(&history)?;
            info!(
                nodes = history.node_count(),
                edges = history.edge_count(),
                "Absorbed history graph"
            );
        }

        Ok(Self {
            accumulator,
            store,
            retrievers,
            summarizer,
            memory: None,
            settings,
        })
    }

    /// Open a session persisting both graph and query history in `storage`.
    pub fn open_with_storage(
        settings: Settings,
        storage: Arc<Storage>,
        retrievers: Vec<Arc<dyn Retriever>>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self, SessionError> {
        let memory = ResearchMemory::new(Arc::clone(&storage), settings.memory.clone());
        let store = Arc::new(RocksGraphStore::new(storage));
        Ok(Self::open(settings, store, retrievers, summarizer)?.with_memory(memory))
    }

    /// Attach research memory.
    pub fn with_memory(mut self, memory: ResearchMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Run one research query through retrieval, summarization and ingestion.
    ///
    /// Retrievers are searched concurrently and each contributes at most
    /// `retrieval.max_results` documents. A document retrieved twice is
    /// processed once. The first collaborator error aborts the query.
    #[instrument(skip(self))]
    pub async fn run_query(&self, query: &str) -> Result<Findings, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyQuery);
        }

        let batches = try_join_all(self.retrievers.iter().map(|r| r.search(query))).await?;

        let mut seen = HashSet::new();
        let mut documents = Vec::new();
        for (retriever, batch) in self.retrievers.iter().zip(batches) {
            debug!(retriever = retriever.name(), count = batch.len(), "Retrieved documents");
            for document in batch.into_iter().take(self.settings.retrieval.max_results) {
                if seen.insert(document.id.clone()) {
                    documents.push(document);
                }
            }
        }

        let summaries =
            try_join_all(documents.iter().map(|d| self.summarizer.summarize(d))).await?;

        let mut papers = Vec::new();
        let mut projects = Vec::new();
        let mut skipped = Vec::new();

        for (document, summary) in documents.into_iter().zip(summaries) {
            let mut distinct = HashSet::new();
            let topics: Vec<Topic> = summary
                .topics
                .iter()
                .filter_map(|label| self.accumulator.normalize(label))
                .filter(|topic| distinct.insert(topic.clone()))
                .collect();

            if topics.is_empty() {
                warn!(document_id = %document.id, "Skipping document without topics");
                skipped.push(document.id);
                continue;
            }

            let finding = Finding {
                document,
                summary,
                topics,
            };
            if finding.document.is_paper() {
                papers.push(finding);
            } else {
                projects.push(finding);
            }
        }

        let mut findings = Findings {
            query: query.to_string(),
            papers,
            projects,
            skipped,
            insights: Insights::default(),
        };

        // Memory goes first: a failure there must leave the graph untouched.
        if let Some(ref memory) = self.memory {
            let topics = findings.topics();
            let titles: Vec<&str> = findings
                .papers
                .iter()
                .chain(&findings.projects)
                .map(|f| f.document.title.as_str())
                .collect();
            let insights = memory.insights(query, &topics, &titles)?;

            let document_ids = findings
                .papers
                .iter()
                .chain(&findings.projects)
                .map(|f| f.document.id.clone())
                .collect();
            memory.record_query(query, document_ids, &topics)?;
            findings.insights = insights;
        } else {
            findings.insights.key_connections = findings
                .papers
                .iter()
                .chain(&findings.projects)
                .take(self.settings.memory.key_connections)
                .map(|f| f.document.title.clone())
                .collect();
        }

        for finding in findings.papers.iter().chain(&findings.projects) {
            self.accumulator
                .ingest(&finding.document, &finding.summary.topics)?;
        }

        info!(
            papers = findings.papers.len(),
            projects = findings.projects.len(),
            skipped = findings.skipped.len(),
            "Query complete"
        );
        Ok(findings)
    }

    /// Strongest co-occurring topics for `label`, up to `graph.neighbor_limit`.
    pub fn related_topics(&self, label: &str) -> Result<Vec<(Topic, usize)>, SessionError> {
        Ok(self
            .accumulator
            .top_neighbors(label, self.settings.graph.neighbor_limit)?)
    }

    /// The session's accumulator.
    pub fn accumulator(&self) -> &GraphAccumulator<StopWordNormalizer> {
        &self.accumulator
    }

    /// Snapshot of the accumulated graph.
    pub fn export(&self) -> Result<GraphSnapshot, SessionError> {
        Ok(self.accumulator.export()?)
    }

    /// The research memory, if attached.
    pub fn memory(&self) -> Option<&ResearchMemory> {
        self.memory.as_ref()
    }

    /// Merge the accumulated graph into the store and end the session.
    ///
    /// Returns the stats of the stored graph, which includes whatever other
    /// sessions saved in the meantime.
    #[instrument(skip_all)]
    pub fn close(self) -> Result<GraphStats, SessionError> {
        let graph = self.accumulator.into_graph()?;
        let stats = self.store.save(&graph)?;
        info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            "Session closed"
        );
        Ok(stats)
    }
}

//! End-to-end test infrastructure for the research assistant.
//!
//! Provides a shared TestHarness and a small fixed corpus of papers and
//! repositories with known topics.

use std::sync::Arc;

use anyhow::Context;
use research_assistant::{MockRetriever, MockSummarizer, ResearchSession, Retriever};
use research_storage::Storage;
use research_types::{Document, DocumentSource, Settings};

/// Shared test harness for E2E tests.
///
/// Owns a RocksDB instance in a temp directory. Sessions opened through the
/// harness persist into that storage, so closing one session and opening
/// another exercises the full save/load cycle.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
    pub settings: Settings,
}

impl TestHarness {
    /// Create a new test harness with temp directory and storage.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage =
            Arc::new(Storage::open(temp_dir.path()).expect("Failed to open test storage"));

        let settings = Settings {
            db_path: temp_dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };

        Self {
            _temp_dir: temp_dir,
            storage,
            settings,
        }
    }

    /// Open a session over the harness storage with mock collaborators.
    ///
    /// Each `(query, documents)` pair sets what the retrievers return for that
    /// query: papers from a "papers" retriever, repositories from a "github"
    /// retriever. Unknown queries return nothing.
    pub fn open_session(
        &self,
        queries: Vec<(&str, Vec<Document>)>,
    ) -> anyhow::Result<ResearchSession> {
        let mut papers = MockRetriever::new("papers", Vec::new());
        let mut github = MockRetriever::new("github", Vec::new());
        for (query, documents) in queries {
            let (paper_docs, repo_docs): (Vec<Document>, Vec<Document>) =
                documents.into_iter().partition(|d| d.is_paper());
            papers = papers.with_query(query, paper_docs);
            github = github.with_query(query, repo_docs);
        }

        let papers: Arc<dyn Retriever> = Arc::new(papers);
        let github: Arc<dyn Retriever> = Arc::new(github);

        ResearchSession::open_with_storage(
            self.settings.clone(),
            Arc::clone(&self.storage),
            vec![papers, github],
            Arc::new(MockSummarizer::new()),
        )
        .context("Failed to open research session")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Paper with explicit topics carried as tags.
pub fn paper(id: &str, title: &str, topics: &[&str]) -> Document {
    Document::new(id, title, DocumentSource::Paper)
        .with_authors(["Test Author"])
        .with_year(2024)
        .with_tags(topics.iter().copied())
}

/// Repository with explicit topics carried as tags.
pub fn repo(id: &str, name: &str, topics: &[&str]) -> Document {
    Document::new(id, name, DocumentSource::Repository)
        .with_body(format!("Implementation of {}", name))
        .with_tags(topics.iter().copied())
}

/// Transformer corpus: three papers and one repository.
pub fn transformer_corpus() -> Vec<Document> {
    vec![
        paper("arxiv:1706.03762", "Attention Is All You Need", &["Transformer", "Attention"]),
        paper("arxiv:1810.04805", "BERT", &["transformer", "NLP", "pre-training"]),
        paper("arxiv:2005.14165", "Language Models are Few-Shot Learners", &["Transformer", "NLP", "few-shot learning"]),
        repo("github:huggingface/transformers", "huggingface/transformers", &["transformer", "nlp", "pytorch"]),
    ]
}

/// Graph corpus: two papers and one repository. Overlaps the transformer
/// corpus only on "attention" and "pytorch".
pub fn graph_corpus() -> Vec<Document> {
    vec![
        paper("arxiv:1609.02907", "Semi-Supervised Classification with GCNs", &["graph neural networks", "semi-supervised learning"]),
        paper("arxiv:1710.10903", "Graph Attention Networks", &["Graph Neural Networks", "attention"]),
        repo("github:pyg-team/pytorch_geometric", "pyg-team/pytorch_geometric", &["graph neural networks", "pytorch"]),
    ]
}

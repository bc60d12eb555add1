//! # research-assistant
//!
//! Research pipeline around the topic graph: retrieval and summarization
//! collaborators, research memory, and the per-query session.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use research_assistant::{KeywordSummarizer, MockRetriever, ResearchSession, Retriever};
//! use research_storage::Storage;
//! use research_types::Settings;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(None)?;
//! let storage = Arc::new(Storage::open(&settings.expanded_db_path())?);
//! let papers: Arc<dyn Retriever> = Arc::new(MockRetriever::new("papers", vec![]));
//! let session = ResearchSession::open_with_storage(
//!     settings,
//!     storage,
//!     vec![papers],
//!     Arc::new(KeywordSummarizer::default()),
//! )?;
//!
//! let findings = session.run_query("graph neural networks").await?;
//! println!("{}", findings.render());
//! session.close()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logging;
pub mod memory;
pub mod retriever;
pub mod session;
pub mod summarizer;
pub mod tfidf;

pub use error::{MemoryError, RetrievalError, SessionError};
pub use logging::init_tracing;
pub use memory::{Insights, QueryRecord, RelatedQuery, ResearchMemory};
pub use retriever::{MockRetriever, Retriever};
pub use session::{Finding, Findings, ResearchSession};
pub use summarizer::{
    KeywordSummarizer, LlmClient, LlmRequest, LlmSummarizer, MockSummarizer, NoOpLlmClient, Summarizer,
    SummarizerError, Summary,
};
pub use tfidf::TfIdf;

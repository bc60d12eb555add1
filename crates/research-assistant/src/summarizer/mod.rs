//! Summarization trait and implementations.
//!
//! A summarizer turns one retrieved document into a short text summary and
//! an ordered list of raw topic labels. Labels are normalized later by the
//! graph accumulator.

mod basic;
mod keyword;
mod llm;
mod mock;

pub use basic::{basic_summary, document_topics};
pub use keyword::KeywordSummarizer;
pub use llm::{
    paper_prompt, project_prompt, LlmClient, LlmRequest, LlmSummarizer, NoOpLlmClient, SYSTEM_PROMPT,
};
pub use mock::MockSummarizer;

use async_trait::async_trait;
use research_types::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for summarization operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizerError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Timeout waiting for response")]
    Timeout,
}

/// Output from summarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Brief summary text
    pub text: String,

    /// Raw topic labels, most relevant first
    pub topics: Vec<String>,
}

impl Summary {
    /// Create a new summary.
    pub fn new(text: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            text: text.into(),
            topics,
        }
    }
}

/// Pluggable summarizer trait.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize one document and extract its topics.
    async fn summarize(&self, document: &Document) -> Result<Summary, SummarizerError>;
}

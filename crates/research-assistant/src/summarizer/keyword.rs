//! Summarizer that needs no LLM.

use async_trait::async_trait;
use research_types::{Document, SummarizerSettings};

use super::basic::{basic_summary, document_topics};
use super::{Summarizer, SummarizerError, Summary};

/// Builds summaries from document fields and topics from tags or keywords.
pub struct KeywordSummarizer {
    top_keywords: usize,
}

impl KeywordSummarizer {
    /// Create a keyword summarizer extracting up to `top_keywords` topics.
    pub fn new(top_keywords: usize) -> Self {
        Self { top_keywords }
    }

    /// Create from summarizer settings.
    pub fn from_settings(settings: &SummarizerSettings) -> Self {
        Self::new(settings.top_keywords)
    }
}

impl Default for KeywordSummarizer {
    fn default() -> Self {
        Self::from_settings(&SummarizerSettings::default())
    }
}

#[async_trait]
impl Summarizer for KeywordSummarizer {
    async fn summarize(&self, document: &Document) -> Result<Summary, SummarizerError> {
        Ok(Summary::new(
            basic_summary(document),
            document_topics(document, self.top_keywords),
        ))
    }
}

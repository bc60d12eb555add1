//! Mock summarizer for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use research_types::{Document, DocumentId};

use super::{Summarizer, SummarizerError, Summary};

/// Mock summarizer that generates deterministic summaries.
///
/// Topics are the document's tags unless overridden per document id.
pub struct MockSummarizer {
    topics: HashMap<DocumentId, Vec<String>>,
    failure: Option<SummarizerError>,
}

impl MockSummarizer {
    /// Create a new mock summarizer.
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
            failure: None,
        }
    }

    /// Create a summarizer that always fails with `error`.
    pub fn failing(error: SummarizerError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    /// Use `topics` for the document with id `document_id`.
    pub fn with_topics<I, S>(mut self, document_id: impl Into<DocumentId>, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics
            .insert(document_id.into(), topics.into_iter().map(Into::into).collect());
        self
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, document: &Document) -> Result<Summary, SummarizerError> {
        if let Some(ref error) = self.failure {
            return Err(error.clone());
        }

        let topics = self
            .topics
            .get(&document.id)
            .cloned()
            .unwrap_or_else(|| document.tags.clone());

        Ok(Summary::new(format!("Summary of {}", document.title), topics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_types::DocumentSource;

    #[tokio::test]
    async fn test_mock_summary() {
        let summarizer = MockSummarizer::new().with_topics("1", ["transformer", "attention"]);

        let doc = Document::new("1", "Attention", DocumentSource::Paper).with_tags(["ignored"]);
        let summary = summarizer.summarize(&doc).await.unwrap();
        assert_eq!(summary.text, "Summary of Attention");
        assert_eq!(summary.topics, vec!["transformer", "attention"]);

        let other = Document::new("2", "Repo", DocumentSource::Repository).with_tags(["rust"]);
        assert_eq!(summarizer.summarize(&other).await.unwrap().topics, vec!["rust"]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let summarizer = MockSummarizer::failing(SummarizerError::Timeout);
        let doc = Document::new("1", "Attention", DocumentSource::Paper);
        assert_eq!(
            summarizer.summarize(&doc).await.unwrap_err(),
            SummarizerError::Timeout
        );
    }
}

//! LLM-backed summarization with retry and basic-summary fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use research_types::{Document, DocumentSource, SummarizerSettings};
use tracing::{debug, error, info, warn};

use super::basic::{basic_summary, document_topics};
use super::{Summarizer, SummarizerError, Summary};

/// System message sent with every summary request.
pub const SYSTEM_PROMPT: &str = "You are a research assistant. Provide brief, technical summaries.";

/// One chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for LLM completion.
///
/// Implementations handle the API call and authentication. Calls are
/// blocking; the summarizer runs them off the async executor and retries
/// rate limits and timeouts.
pub trait LlmClient: Send + Sync + 'static {
    /// Generate a completion for the given request.
    fn complete(&self, request: &LlmRequest) -> Result<String, SummarizerError>;
}

/// Prompt asking for a brief paper summary.
pub fn paper_prompt(document: &Document) -> String {
    let year = document
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        r#"Analyze this research paper and provide a concise summary:

Title: {}
Authors: {}
Year: {}
Abstract: {}

Key points to include:
1. Main contribution
2. Key findings
3. Why it matters

Keep it brief and focused."#,
        document.title,
        document.authors.join(", "),
        year,
        document.body
    )
}

/// Prompt asking for a brief project summary.
pub fn project_prompt(document: &Document) -> String {
    format!(
        r#"Analyze this GitHub project and provide a concise summary:

Repository: {}
Description: {}
Topics: {}

Focus on:
1. Main purpose
2. Key features
3. Why it's useful

Keep it brief and focused."#,
        document.title,
        document.body,
        document.tags.join(", ")
    )
}

/// Summarizer that asks an LLM for the summary text.
///
/// Topics never come from the LLM: they are the document's tags, or TF-IDF
/// keywords when there are none. When the LLM call fails and
/// `fallback_to_basic` is set, the summary text is built from the document
/// fields instead.
pub struct LlmSummarizer<L: LlmClient> {
    llm: Arc<L>,
    settings: SummarizerSettings,
}

impl<L: LlmClient> LlmSummarizer<L> {
    /// Create a new LLM summarizer.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizerError::ConfigError`] if `settings` fail validation.
    pub fn new(llm: L, settings: SummarizerSettings) -> Result<Self, SummarizerError> {
        settings.validate().map_err(SummarizerError::ConfigError)?;
        info!(
            provider = %settings.provider,
            model = %settings.model,
            "LLM summarizer configured"
        );
        Ok(Self {
            llm: Arc::new(llm),
            settings,
        })
    }

    /// Build the completion request for `document`.
    pub fn request(&self, document: &Document) -> LlmRequest {
        let prompt = match document.source {
            DocumentSource::Paper => paper_prompt(document),
            DocumentSource::Repository => project_prompt(document),
        };
        LlmRequest {
            model: self.settings.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            prompt,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Call the LLM, retrying rate limits and timeouts with backoff.
    async fn complete(&self, request: LlmRequest) -> Result<String, SummarizerError> {
        let delay = Duration::from_millis(self.settings.retry_delay_ms);
        let mut backoff = ExponentialBackoff {
            initial_interval: delay,
            current_interval: delay,
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Calling LLM");

            match self.complete_once(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(e) if is_retryable(&e) => {
                    if attempts >= self.settings.max_retries {
                        error!(error = %e, "Max retries exceeded");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "LLM call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn complete_once(&self, request: LlmRequest) -> Result<String, SummarizerError> {
        let llm = Arc::clone(&self.llm);
        let response = tokio::task::spawn_blocking(move || llm.complete(&request))
            .await
            .map_err(|e| SummarizerError::ApiError(format!("LLM task failed: {}", e)))??;

        let cleaned = response.trim();
        if cleaned.is_empty() {
            return Err(SummarizerError::ParseError("empty completion".to_string()));
        }
        Ok(cleaned.to_string())
    }
}

fn is_retryable(error: &SummarizerError) -> bool {
    matches!(
        error,
        SummarizerError::RateLimitExceeded | SummarizerError::Timeout
    )
}

#[async_trait]
impl<L: LlmClient> Summarizer for LlmSummarizer<L> {
    async fn summarize(&self, document: &Document) -> Result<Summary, SummarizerError> {
        let topics = document_topics(document, self.settings.top_keywords);

        match self.complete(self.request(document)).await {
            Ok(text) => {
                debug!(document_id = %document.id, "Generated LLM summary");
                Ok(Summary::new(text, topics))
            }
            Err(e) if self.settings.fallback_to_basic => {
                warn!(document_id = %document.id, error = %e, "LLM summarization failed, using basic summary");
                Ok(Summary::new(basic_summary(document), topics))
            }
            Err(e) => Err(e),
        }
    }
}

/// A no-op LLM client for keyword-only mode.
///
/// Always returns an error, forcing the basic-summary fallback.
pub struct NoOpLlmClient;

impl LlmClient for NoOpLlmClient {
    fn complete(&self, _request: &LlmRequest) -> Result<String, SummarizerError> {
        Err(SummarizerError::ConfigError("No LLM configured".to_string()))
    }
}

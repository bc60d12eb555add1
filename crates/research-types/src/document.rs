//! Document type for retrieved research material.
//!
//! Documents are produced by retrieval collaborators (paper search,
//! GitHub search) and are read-only to the graph core.

use serde::{Deserialize, Serialize};

/// A unique identifier for a document.
pub type DocumentId = String;

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Academic paper (abstract as body)
    Paper,
    /// Source repository (README as body)
    Repository,
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSource::Paper => write!(f, "paper"),
            DocumentSource::Repository => write!(f, "repo"),
        }
    }
}

/// A retrieved paper or repository record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (stable across retrievals of the same item)
    pub id: DocumentId,

    /// Paper title or repository full name
    pub title: String,

    /// Paper or repository
    pub source: DocumentSource,

    /// Landing page URL
    #[serde(default)]
    pub url: Option<String>,

    /// Abstract for papers, README or description for repositories
    #[serde(default)]
    pub body: String,

    /// Paper authors
    #[serde(default)]
    pub authors: Vec<String>,

    /// Publication year
    #[serde(default)]
    pub year: Option<u16>,

    /// Tags supplied by the source itself (e.g. GitHub repository topics)
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    /// Create a new document with empty optional fields.
    pub fn new(id: impl Into<DocumentId>, title: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source,
            url: None,
            body: String::new(),
            authors: Vec::new(),
            year: None,
            tags: Vec::new(),
        }
    }

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the authors.
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the publication year.
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Set source-provided tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check if this document is a paper.
    pub fn is_paper(&self) -> bool {
        self.source == DocumentSource::Paper
    }
}

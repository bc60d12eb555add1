//! # research-types
//!
//! Shared domain types for the research assistant.
//!
//! This crate defines the data structures passed between crates:
//! - Documents: Papers and repositories returned by retrieval collaborators
//! - Settings: Layered configuration for the assistant
//!
//! ## Usage
//!
//! ```rust
//! use research_types::{Document, DocumentSource};
//!
//! let doc = Document::new("arxiv:1706.03762", "Attention Is All You Need", DocumentSource::Paper);
//! assert!(doc.is_paper());
//! ```

pub mod config;
pub mod document;
pub mod error;

pub use config::{GraphSettings, MemorySettings, RetrievalSettings, Settings, SummarizerSettings};
pub use document::{Document, DocumentId, DocumentSource};
pub use error::ResearchError;

//! Configuration loading for the research assistant.
//!
//! Layered config: defaults -> config file -> explicit file -> env vars.
//! The default config file lives at ~/.config/research-assistant/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ResearchError;

const APP_NAME: &str = "research-assistant";

/// Topic graph settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Words dropped during topic normalization, in addition to the built-in list
    #[serde(default)]
    pub extra_stop_words: Vec<String>,

    /// Number of neighbors reported per topic when the caller gives no limit
    #[serde(default = "default_neighbor_limit")]
    pub neighbor_limit: usize,
}

fn default_neighbor_limit() -> usize {
    5
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            extra_stop_words: Vec::new(),
            neighbor_limit: default_neighbor_limit(),
        }
    }
}

/// Retrieval collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Maximum documents requested from each retriever per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

/// Summarizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    /// Provider name (e.g., "openai", "local")
    #[serde(default = "default_summarizer_provider")]
    pub provider: String,

    /// Model name
    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// Upper bound on generated summary length
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Return a summary built from document fields when the LLM fails
    #[serde(default = "default_true")]
    pub fallback_to_basic: bool,

    /// Number of keyword topics extracted when the source supplies no tags
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,

    /// Attempts per summary, counting the first call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial wait before retrying a rate-limited or timed-out call
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_summarizer_provider() -> String {
    "openai".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_top_keywords() -> usize {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            provider: default_summarizer_provider(),
            model: default_summarizer_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            fallback_to_basic: default_true(),
            top_keywords: default_top_keywords(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl SummarizerSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be 0.0-2.0, got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be > 0".to_string());
        }
        if self.top_keywords == 0 {
            return Err("top_keywords must be > 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be > 0".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        Ok(())
    }
}

/// Research memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Maximum related past queries reported in insights
    #[serde(default = "default_max_related")]
    pub max_related: usize,

    /// Number of current findings listed as key connections
    #[serde(default = "default_key_connections")]
    pub key_connections: usize,
}

fn default_max_related() -> usize {
    5
}

fn default_key_connections() -> usize {
    3
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_related: default_max_related(),
            key_connections: default_key_connections(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Topic graph settings
    #[serde(default)]
    pub graph: GraphSettings,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Summarizer settings
    #[serde(default)]
    pub summarizer: SummarizerSettings,

    /// Research memory settings
    #[serde(default)]
    pub memory: MemorySettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            graph: GraphSettings::default(),
            retrieval: RetrievalSettings::default(),
            summarizer: SummarizerSettings::default(),
            memory: MemorySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/research-assistant/config.toml)
    /// 3. Explicit config file (optional)
    /// 4. Environment variables (RESEARCH_*, nested keys joined by `__`)
    pub fn load(config_path: Option<&str>) -> Result<Self, ResearchError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| ResearchError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| ResearchError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // RESEARCH_LOG_LEVEL, RESEARCH_SUMMARIZER__MODEL, ...
        builder = builder.add_source(
            Environment::with_prefix("RESEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        settings
            .summarizer
            .validate()
            .map_err(ResearchError::Config)?;

        Ok(settings)
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}

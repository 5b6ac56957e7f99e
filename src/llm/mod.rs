//! LLM enrichment boundary: suitability classification and summarization.

mod client;

pub use client::{LlmConfig, OpenAiClient};

use async_trait::async_trait;
use serde::Deserialize;

/// Errors from the enrichment boundary. Scoped to one candidate row.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("response parse error: {0}")]
    Parse(String),
}

/// Suitability verdict for a candidate page.
#[derive(Debug, Clone, Deserialize)]
pub struct Verdict {
    pub is_appropriate: bool,
    #[serde(default)]
    pub reason: String,
}

/// Structured summary of a candidate page.
#[derive(Debug, Clone, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub required_experience: Option<String>,
}

/// Classifies and summarizes page text for publishing.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Judge whether the page fits the channel's editorial identity.
    async fn classify(&self, text: &str, title: &str) -> Result<Verdict, LlmError>;

    /// Produce the structured summary used to compose the outgoing message.
    async fn summarize(&self, text: &str, title: &str) -> Result<Summary, LlmError>;
}

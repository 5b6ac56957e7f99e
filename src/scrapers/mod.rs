//! Listing extractors for supported source platforms.

pub mod page;
mod sideproject;
mod wanted;

pub use page::{FetchError, HttpPageFetcher, PageFetcher};
pub use sideproject::SideprojectExtractor;
pub use wanted::WantedExtractor;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Browser-like user agent; the listing pages serve bots a stub page.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Errors from the extraction boundary. Fatal to a collector run.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("listing parse error: {0}")]
    Parse(String),
}

/// One candidate listing produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
}

impl Candidate {
    pub fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            company: None,
            location: None,
            experience: None,
        }
    }
}

/// A source that yields a finite, restartable candidate sequence per call.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Stable source identifier ("wanted", "sideproject", ...).
    fn source_id(&self) -> &str;

    /// Fetch the listing page(s) and extract candidates in page order.
    async fn extract(&self) -> Result<Vec<Candidate>, ExtractError>;
}

/// Shared client for listing fetches.
pub(crate) fn listing_client(timeout: Duration) -> Result<Client, ExtractError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| ExtractError::Parse(e.to_string()))
}

/// Fetch a listing page body, mapping non-success statuses to errors.
pub(crate) async fn fetch_listing(client: &Client, url: &str) -> Result<String, ExtractError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExtractError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ExtractError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    resp.text().await.map_err(|e| ExtractError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })
}

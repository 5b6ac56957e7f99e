//! Wanted job board extractor.
//!
//! Walks every anchor on the listing page and keeps the ones pointing at a
//! `/wd/{id}` posting. Anchor text is a stack of lines mixing title, company,
//! reward badges, and response-rate chips; the cleanup drops the noise lines
//! and treats the first survivor as the title and the second as the company.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::info;
use url::Url;

use super::{fetch_listing, listing_client, Candidate, ExtractError, Extractor};

const DEFAULT_LISTING_URL: &str =
    "https://www.wanted.co.kr/wdlist/523/1635?country=kr&job_sort=job.popularity_order&years=-1&locations=all";

/// Line fragments that mark a noise line rather than title/company text.
const SKIP_FRAGMENTS: &[&str] = &["합격보상금", "보상금", "응답률", "입사축하금", "지역"];

pub struct WantedExtractor {
    listing_url: String,
    client: reqwest::Client,
    posting_re: Regex,
}

impl WantedExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_listing_url(DEFAULT_LISTING_URL)
    }

    pub fn with_listing_url(listing_url: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            listing_url: listing_url.to_string(),
            client: listing_client(Duration::from_secs(30))?,
            posting_re: Regex::new(r"/wd/(\d+)").expect("valid regex"),
        })
    }

    fn parse_listing(&self, html: &str, base: &Url) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a").expect("valid selector");

        let mut candidates: Vec<Candidate> = Vec::new();

        for anchor in document.select(&anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(full_url) = base.join(href) else {
                continue;
            };
            let full_url = full_url.to_string();
            if !self.posting_re.is_match(&full_url) {
                continue;
            }

            // Each text node is one visual line of the job card.
            let lines: Vec<&str> = anchor
                .text()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .filter(|line| !is_noise_line(line))
                .collect();

            let Some((&title, rest)) = lines.split_first() else {
                continue;
            };
            // Single-character titles are layout artifacts, not postings.
            if title.chars().count() < 2 {
                continue;
            }
            let company = rest.first().map(|s| s.to_string());

            // The listing repeats cards; keep the first occurrence per URL.
            if candidates.iter().any(|c| c.url == full_url) {
                continue;
            }

            candidates.push(Candidate {
                title: title.to_string(),
                url: full_url,
                company,
                location: None,
                experience: None,
            });
        }

        candidates
    }
}

fn is_noise_line(line: &str) -> bool {
    if SKIP_FRAGMENTS.iter().any(|kw| line.contains(kw)) {
        return true;
    }
    // Money amounts like "1,000,000원"
    line.ends_with('원') && line.chars().any(|c| c.is_ascii_digit())
}

#[async_trait]
impl Extractor for WantedExtractor {
    fn source_id(&self) -> &str {
        "wanted"
    }

    async fn extract(&self) -> Result<Vec<Candidate>, ExtractError> {
        let base = Url::parse(&self.listing_url)
            .map_err(|e| ExtractError::Parse(format!("bad listing url: {e}")))?;
        let html = fetch_listing(&self.client, &self.listing_url).await?;
        let candidates = self.parse_listing(&html, &base);
        info!(count = candidates.len(), "wanted listing extracted");
        Ok(candidates)
    }
}

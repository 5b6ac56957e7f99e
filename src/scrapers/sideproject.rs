//! sideproject.co.kr extractor.
//!
//! Listing cards are `a.post_link` anchors. The raw href carries session
//! noise, so the canonical URL is rebuilt from the `idx` query parameter.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::info;

use super::{fetch_listing, listing_client, Candidate, ExtractError, Extractor};

const DEFAULT_LISTING_URL: &str = "https://sideproject.co.kr/projects";

pub struct SideprojectExtractor {
    listing_url: String,
    client: reqwest::Client,
    idx_re: Regex,
}

impl SideprojectExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_listing_url(DEFAULT_LISTING_URL)
    }

    pub fn with_listing_url(listing_url: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            listing_url: listing_url.to_string(),
            client: listing_client(Duration::from_secs(30))?,
            idx_re: Regex::new(r"idx=(\d+)").expect("valid regex"),
        })
    }

    fn parse_listing(&self, html: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let post_selector = Selector::parse("a.post_link").expect("valid selector");

        let mut candidates = Vec::new();
        for anchor in document.select(&post_selector) {
            let title = anchor.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                continue;
            }
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(caps) = self.idx_re.captures(href) else {
                continue;
            };
            let url = format!(
                "https://sideproject.co.kr/projects/?bmode=view&idx={}",
                &caps[1]
            );
            candidates.push(Candidate::new(&title, &url));
        }
        candidates
    }
}

#[async_trait]
impl Extractor for SideprojectExtractor {
    fn source_id(&self) -> &str {
        "sideproject"
    }

    async fn extract(&self) -> Result<Vec<Candidate>, ExtractError> {
        let html = fetch_listing(&self.client, &self.listing_url).await?;
        let candidates = self.parse_listing(&html);
        info!(count = candidates.len(), "sideproject listing extracted");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_rebuilds_canonical_url() {
        let html = r#"
            <a class="post_link" href="/projects/?bmode=view&idx=482&back_url=xyz">
                디자이너 구합니다
            </a>
            <a class="post_link" href="/projects/?page=2">페이지 링크</a>
            <a href="/projects/?bmode=view&idx=9">not a post_link</a>
        "#;
        let extractor = SideprojectExtractor::new().unwrap();
        let candidates = extractor.parse_listing(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "디자이너 구합니다");
        assert_eq!(
            candidates[0].url,
            "https://sideproject.co.kr/projects/?bmode=view&idx=482"
        );
        assert!(candidates[0].company.is_none());
    }
}

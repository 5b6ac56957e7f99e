//! Publisher-side page fetch boundary.
//!
//! Turns a listing URL into the readable text the enrichment prompts consume:
//! paragraph and heading text only, chrome stripped, truncated to a fixed
//! budget so prompt size stays bounded.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use super::USER_AGENT;

/// Character budget for extracted page text.
const MAX_TEXT_CHARS: usize = 3500;

/// Fragments shorter than this are chrome (menu labels, buttons), not body text.
const MIN_FRAGMENT_CHARS: usize = 20;

/// Errors from fetching a single listing page. Scoped to one candidate row;
/// never fatal to a publisher batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("page yielded no usable text: {0}")]
    Empty(String),
}

/// Fetches a page and reduces it to plain text for enrichment.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Reqwest-backed fetcher with a browser user agent.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = resp.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let text = extract_text(&html);
        if text.is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }
        if text.len() < 50 {
            warn!(url, "page text suspiciously short");
        }
        debug!(url, chars = text.len(), "page text extracted");
        Ok(text)
    }
}

/// Collect paragraph and heading text, preferring `article` content when the
/// page has one, and truncate to the prompt budget.
pub(crate) fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let article_selector = Selector::parse("article p, article h2, article h3")
        .expect("valid selector");
    let body_selector = Selector::parse("p, h2, h3").expect("valid selector");

    let mut fragments: Vec<String> = document
        .select(&article_selector)
        .map(element_text)
        .filter(|t| t.len() >= MIN_FRAGMENT_CHARS)
        .collect();

    if fragments.is_empty() {
        fragments = document
            .select(&body_selector)
            .filter(|el| !in_page_chrome(el))
            .map(element_text)
            .filter(|t| t.len() >= MIN_FRAGMENT_CHARS)
            .collect();
    }

    truncate_chars(&fragments.join(" "), MAX_TEXT_CHARS).to_string()
}

/// True when the element sits inside navigation or footer chrome rather than
/// the page body.
fn in_page_chrome(element: &scraper::ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(scraper::ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "nav" | "footer" | "header" | "aside"))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate at or before `max` bytes without splitting a UTF-8 sequence.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_prefers_article() {
        let html = r#"
            <nav><p>메뉴 항목과 링크들이 여기 길게 나열되어 있습니다</p></nav>
            <article>
                <h2>채용 공고 상세 내용이 담긴 소제목입니다</h2>
                <p>주요 업무는 백엔드 서비스 개발과 운영을 담당하는 것입니다.</p>
            </article>
        "#;
        let text = extract_text(html);
        assert!(text.contains("주요 업무"));
        assert!(!text.contains("메뉴 항목"));
    }

    #[test]
    fn test_extract_text_falls_back_to_whole_document() {
        let html = r#"
            <div>
                <p>아티클 태그 없이 본문 단락만 존재하는 페이지 구조입니다.</p>
                <p>short</p>
            </div>
        "#;
        let text = extract_text(html);
        assert!(text.contains("본문 단락"));
        assert!(!text.contains("short"));
    }

    #[test]
    fn test_extract_text_skips_chrome_without_article() {
        // No article tag, and the nav/footer paragraphs are long enough to
        // survive the fragment-length filter: they must still be excluded.
        let html = r#"
            <nav><p>채용 서비스 소개와 회원가입 안내가 길게 이어지는 메뉴 문단입니다.</p></nav>
            <div>
                <p>실제 공고 본문 단락으로, 담당 업무와 자격 요건을 설명합니다.</p>
            </div>
            <footer><p>회사 주소와 사업자 등록번호 등 고지 사항이 담긴 문단입니다.</p></footer>
        "#;
        let text = extract_text(html);
        assert!(text.contains("실제 공고 본문"));
        assert!(!text.contains("메뉴 문단"));
        assert!(!text.contains("고지 사항"));
    }

    #[test]
    fn test_extract_text_drops_script_and_style() {
        let html = r#"
            <script>var tracking = "이 스크립트 내용은 절대 나오면 안 됩니다";</script>
            <p>실제 본문 내용이 충분히 길게 작성된 단락입니다.</p>
        "#;
        let text = extract_text(html);
        assert!(text.contains("실제 본문"));
        assert!(!text.contains("스크립트 내용"));
    }

    #[test]
    fn test_truncate_chars_respects_utf8_boundaries() {
        let text = "한글텍스트"; // 3 bytes per char
        let cut = truncate_chars(text, 7);
        assert_eq!(cut, "한글");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}

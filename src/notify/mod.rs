//! Slack delivery boundary.
//!
//! Messages go out through an incoming webhook, either as a plain `text`
//! payload or as a Block Kit `blocks` payload. Success is HTTP 200; anything
//! else is a delivery failure scoped to the candidate row.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::llm::Summary;

/// Errors from the delivery boundary.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("webhook rejected message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outgoing message, composed before delivery.
#[derive(Debug, Clone)]
pub enum Message {
    /// Plain text payload.
    Text(String),
    /// Block Kit payload.
    Blocks(Value),
}

/// One-shot push of a composed message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        (**self).deliver(message).await
    }
}

/// Incoming-webhook implementation.
pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let payload = match message {
            Message::Text(text) => json!({ "text": text }),
            Message::Blocks(blocks) => json!({ "blocks": blocks }),
        };

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!("message delivered");
        Ok(())
    }
}

/// Compose a Block Kit message from a title, summary, and link.
pub fn compose_blocks(title: &str, url: &str, summary: &Summary) -> Message {
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|item| format!("• {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut blocks = vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": "지금 주목해야 할 아티클", "emoji": true }
        }),
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*{title}*") }
        }),
        json!({ "type": "divider" }),
    ];

    if !summary.key_points.is_empty() {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("📌 *이 글에서 이야기하는 것들*\n{}", bullets(&summary.key_points))
            }
        }));
    }
    if !summary.recommendations.is_empty() {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("📌 *이런 분께 추천해요*\n{}", bullets(&summary.recommendations))
            }
        }));
    }

    blocks.push(json!({ "type": "divider" }));
    blocks.push(json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": { "type": "plain_text", "text": "아티클 보러가기", "emoji": true },
            "style": "primary",
            "url": url
        }]
    }));

    Message::Blocks(Value::Array(blocks))
}

/// Compose a plain-text job posting message.
pub fn compose_text(title: &str, url: &str, company: Option<&str>, summary: &Summary) -> Message {
    let heading = match company {
        Some(name) if !name.is_empty() => format!("*[{name}] 채용 공고*"),
        _ => "*채용 공고*".to_string(),
    };
    let mut body = format!("{heading}\n<{url}|{title}>\n\n{}", summary.summary);
    if let Some(experience) = summary.required_experience.as_deref() {
        if !experience.is_empty() {
            body.push_str(&format!("\n\n*요구 경력*\n{experience}"));
        }
    }
    Message::Text(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            summary: "백엔드 채용 공고입니다.".to_string(),
            key_points: vec!["서버 개발".to_string(), "운영 자동화".to_string()],
            recommendations: vec!["성장을 원하는 분".to_string()],
            required_experience: Some("3년 이상".to_string()),
        }
    }

    #[test]
    fn test_compose_blocks_layout() {
        let message = compose_blocks("제목", "https://example.com/wd/1", &summary());
        let Message::Blocks(Value::Array(blocks)) = message else {
            panic!("expected blocks payload");
        };
        // header, title, divider, key points, recommendations, divider, actions
        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[0]["type"], "header");
        assert!(blocks[3]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("• 서버 개발"));
        assert_eq!(
            blocks[6]["elements"][0]["url"],
            "https://example.com/wd/1"
        );
    }

    #[test]
    fn test_compose_blocks_skips_empty_sections() {
        let empty = Summary {
            summary: String::new(),
            key_points: vec![],
            recommendations: vec![],
            required_experience: None,
        };
        let Message::Blocks(Value::Array(blocks)) = compose_blocks("t", "u", &empty) else {
            panic!("expected blocks payload");
        };
        assert_eq!(blocks.len(), 5);
    }

    #[test]
    fn test_compose_text_with_company_and_experience() {
        let Message::Text(text) =
            compose_text("백엔드 엔지니어", "https://e.com", Some("에이콘"), &summary())
        else {
            panic!("expected text payload");
        };
        assert!(text.starts_with("*[에이콘] 채용 공고*"));
        assert!(text.contains("<https://e.com|백엔드 엔지니어>"));
        assert!(text.contains("*요구 경력*\n3년 이상"));
    }

    #[test]
    fn test_compose_text_without_company() {
        let Message::Text(text) = compose_text("t", "u", None, &summary()) else {
            panic!("expected text payload");
        };
        assert!(text.starts_with("*채용 공고*"));
    }
}

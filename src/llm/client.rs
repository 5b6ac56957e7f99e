//! OpenAI chat-completions client for classification and summarization.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{Enricher, LlmError, Summary, Verdict};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default prompt for judging whether a page fits the channel.
pub const DEFAULT_CLASSIFY_PROMPT: &str = r#"당신은 팀 채널의 편집장입니다. 아래 글이 팀에 공유할 가치가 있는지 엄격하게 판단해 주세요.

[판단 기준]
1. 실무와 직접 관련된 주제인가? (개발, 기획, 마케팅, 브랜딩, 커리어 성장 등)
2. 단순 홍보나 보도자료가 아닌, 함께 토론할 만한 내용인가?

[제목]
{title}

[글 내용]
{content}

출력 포맷(JSON): {"is_appropriate": true/false, "reason": "판단 이유를 정중하게 설명해 주세요."}"#;

/// Default prompt for the structured summary.
pub const DEFAULT_SUMMARIZE_PROMPT: &str = r#"너는 핵심만 전달하는 큐레이터야. 아래 [글 내용]을 읽고, 팀원들에게 공유할 수 있게 요약해줘. 이모지는 사용하지 말고, 반드시 아래 JSON 형식으로만 응답해.

[출력 양식]
{
  "summary": "전체 내용을 2~3문장으로 요약",
  "key_points": ["핵심 내용 1", "핵심 내용 2", "핵심 내용 3", "핵심 내용 4"],
  "recommendations": ["이런 분께 추천 1", "이런 분께 추천 2", "이런 분께 추천 3"],
  "required_experience": "채용 공고인 경우 요구 경력, 아니면 null"
}

[제목]
{title}

[글 내용]
{content}"#;

/// Configuration for the OpenAI client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the chat-completions endpoint.
    pub api_key: String,
    /// Model used for both classification and summarization.
    #[serde(default = "default_model")]
    pub model: String,
    /// Temperature for generation (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Custom classification prompt ({title} and {content} placeholders).
    #[serde(default)]
    pub classify_prompt: Option<String>,
    /// Custom summarization prompt ({title} and {content} placeholders).
    #[serde(default)]
    pub summarize_prompt: Option<String>,
    /// Maximum characters of page text to send per request.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_content_chars() -> usize {
    3500
}

impl LlmConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: default_model(),
            temperature: default_temperature(),
            classify_prompt: None,
            summarize_prompt: None,
            max_content_chars: default_max_content_chars(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn classify_prompt(&self) -> &str {
        self.classify_prompt.as_deref().unwrap_or(DEFAULT_CLASSIFY_PROMPT)
    }

    fn summarize_prompt(&self) -> &str {
        self.summarize_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARIZE_PROMPT)
    }
}

/// Chat-completions response envelope; only the first choice's content is used.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// OpenAI-backed enricher.
pub struct OpenAiClient {
    config: LlmConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn render(&self, template: &str, text: &str, title: &str) -> String {
        let truncated = self.truncate_content(text);
        template
            .replace("{title}", title)
            .replace("{content}", truncated)
    }

    /// Truncate page text to the configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Call chat-completions in JSON mode and return the message content.
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response carried no choices".to_string()))
    }
}

#[async_trait]
impl Enricher for OpenAiClient {
    async fn classify(&self, text: &str, title: &str) -> Result<Verdict, LlmError> {
        let prompt = self.render(self.config.classify_prompt(), text, title);
        debug!(title, "requesting suitability verdict");
        let content = self
            .complete_json(
                "당신은 채널의 정체성을 수호하는 엄격하고 전문적인 편집장입니다.",
                &prompt,
            )
            .await?;
        parse_verdict(&content)
    }

    async fn summarize(&self, text: &str, title: &str) -> Result<Summary, LlmError> {
        let prompt = self.render(self.config.summarize_prompt(), text, title);
        debug!(title, "requesting summary");
        let content = self
            .complete_json("You are a helpful assistant that outputs JSON.", &prompt)
            .await?;
        parse_summary(&content)
    }
}

pub(crate) fn parse_verdict(content: &str) -> Result<Verdict, LlmError> {
    serde_json::from_str(content).map_err(|e| LlmError::Parse(e.to_string()))
}

pub(crate) fn parse_summary(content: &str) -> Result<Summary, LlmError> {
    serde_json::from_str(content).map_err(|e| LlmError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict() {
        let verdict =
            parse_verdict(r#"{"is_appropriate": false, "reason": "단순 채용 공고입니다."}"#)
                .unwrap();
        assert!(!verdict.is_appropriate);
        assert_eq!(verdict.reason, "단순 채용 공고입니다.");

        // reason may be omitted
        let verdict = parse_verdict(r#"{"is_appropriate": true}"#).unwrap();
        assert!(verdict.is_appropriate);
        assert!(verdict.reason.is_empty());

        assert!(parse_verdict("not json").is_err());
    }

    #[test]
    fn test_parse_summary() {
        let summary = parse_summary(
            r#"{
                "summary": "백엔드 채용 공고입니다.",
                "key_points": ["서버 개발", "운영 자동화"],
                "recommendations": ["성장을 원하는 분"],
                "required_experience": "3년 이상"
            }"#,
        )
        .unwrap();
        assert_eq!(summary.key_points.len(), 2);
        assert_eq!(summary.required_experience.as_deref(), Some("3년 이상"));

        // null and missing fields both fall back to defaults
        let summary = parse_summary(
            r#"{"key_points": ["하나"], "recommendations": [], "required_experience": null}"#,
        )
        .unwrap();
        assert!(summary.summary.is_empty());
        assert!(summary.required_experience.is_none());
    }

    #[test]
    fn test_render_truncates_content() {
        let mut config = LlmConfig::new("sk-test");
        config.max_content_chars = 7;
        let client = OpenAiClient::new(config).unwrap();
        let rendered = client.render("T: {title}\nC: {content}", "한글텍스트", "제목");
        assert!(rendered.contains("C: 한글"));
        assert!(!rendered.contains("텍스트"));
    }

    #[test]
    fn test_default_prompts_carry_placeholders() {
        let config = LlmConfig::new("sk-test");
        assert!(config.classify_prompt().contains("{title}"));
        assert!(config.classify_prompt().contains("{content}"));
        assert!(config.summarize_prompt().contains("{content}"));
    }
}

//! Annotation text service.
//!
//! [`AnnotationService`] is the seam between the batch logic and the text
//! generator; [`OpenAiService`] implements it against an OpenAI-compatible
//! chat completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::prompt::{class_prompt, method_prompt};

/// What a snippet passed to [`AnnotationService::generate`] contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnippetKind {
    Class,
    Method,
}

impl fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// Produces documentation text for a source snippet.
///
/// Implementations are called concurrently from many tasks and must not
/// keep per-call state.
#[async_trait]
pub trait AnnotationService: Send + Sync {
    async fn generate(&self, snippet: &str, kind: SnippetKind) -> Result<String, ServiceError>;
}

/// Settings for [`OpenAiService`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// `None` makes every request fail with [`ServiceError::MissingApiKey`].
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub method_max_tokens: u32,
    pub class_max_tokens: u32,
    /// HTTP client timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            method_max_tokens: 500,
            class_max_tokens: 300,
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    /// Reads `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self {
            api_key: var("OPENAI_API_KEY"),
            ..Self::default()
        };
        if let Some(model) = var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(endpoint) = var("OPENAI_BASE_URL") {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiService {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiService {
    pub fn new(config: OpenAiConfig) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, ServiceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            warn!("OpenAI API error ({}): {}", status, message);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        let reply: ChatResponse = response.json().await?;
        debug!("OpenAI reply in {:?}", start.elapsed());

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ServiceError::EmptyResponse)
    }
}

#[async_trait]
impl AnnotationService for OpenAiService {
    async fn generate(&self, snippet: &str, kind: SnippetKind) -> Result<String, ServiceError> {
        let (prompt, max_tokens) = match kind {
            SnippetKind::Class => (class_prompt(snippet), self.config.class_max_tokens),
            SnippetKind::Method => (method_prompt(snippet), self.config.method_max_tokens),
        };

        let raw = self.complete(prompt, max_tokens).await?;
        clean_response(&raw).ok_or(ServiceError::EmptyResponse)
    }
}

/// Strips Markdown fences and a bare `java` language line from generated
/// text. Returns `None` when nothing is left.
pub fn clean_response(raw: &str) -> Option<String> {
    let cleaned = raw
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed != "java" && !trimmed.starts_with("```")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .replace("```", "");

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// `error.message` of an OpenAI error body, or the body itself.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_response_strips_fences() {
        let raw = "```java\n/**\n * Adds numbers.\n */\n```";
        assert_eq!(
            clean_response(raw).as_deref(),
            Some("/**\n * Adds numbers.\n */")
        );

        let raw = "java\n/** Adds. */\n";
        assert_eq!(clean_response(raw).as_deref(), Some("/** Adds. */"));
    }

    #[test]
    fn test_clean_response_keeps_plain_comment() {
        let raw = "  /**\n   * Loads user.\n   */  ";
        assert_eq!(
            clean_response(raw).as_deref(),
            Some("/**\n   * Loads user.\n   */")
        );
    }

    #[test]
    fn test_clean_response_empty() {
        assert_eq!(clean_response("```\n```"), None);
        assert_eq!(clean_response("   "), None);
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        assert_eq!(api_error_message(body), "Rate limit reached");
        assert_eq!(api_error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: 0.2,
            max_tokens: 500,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 500);
    }

    #[test]
    fn test_chat_response_parses_first_choice() {
        let body = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "/** Ok. */"}}]}"#;
        let reply: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(reply.choices[0].message.content.as_deref(), Some("/** Ok. */"));
    }

    #[test]
    fn test_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.method_max_tokens, 500);
        assert_eq!(config.class_max_tokens, 300);
        assert!(!config.has_api_key());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_each_request() {
        let service = OpenAiService::new(OpenAiConfig::default()).unwrap();

        let result = service.generate("void m() {}", SnippetKind::Method).await;

        assert!(matches!(result, Err(ServiceError::MissingApiKey)));
    }
}

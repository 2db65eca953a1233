//! Classification service boundary and its OpenAI-compatible implementation.

use super::response::parse_tenant_records;
use crate::types::TenantRecord;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 16_000;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid API key header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("classification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classification service error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("classification answer is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("classification timed out after {0:?}")]
    Timeout(Duration),
}

/// One classification call: a system instruction and a user prompt.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub system: String,
    pub prompt: String,
}

/// Turns a prompt into tenant records.
///
/// Implementations own fence stripping and lenient parsing, so callers only
/// ever see validated records.
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Result<Vec<TenantRecord>, ClassifyError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client (`/chat/completions`), deterministic settings.
pub struct ChatClassifier {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl ChatClassifier {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build from `OPENAI_API_KEY` and optional `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, ClassifyError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ClassifyError::MissingApiKey)?;
        let client = Self::new(&api_key);
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.is_empty() => client.with_base_url(&url),
            _ => client,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ClassifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl Classify for ChatClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<Vec<TenantRecord>, ClassifyError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, prompt_chars = request.prompt.len(), "chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        parse_tenant_records(&content).map_err(ClassifyError::from)
    }
}

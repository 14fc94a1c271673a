/// Inference client: the single point of entry for all model calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All inference MUST go through this module.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model used for the structured resume critique.
/// Intentionally hardcoded to prevent accidental drift.
pub const FEEDBACK_MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One block of a request message. The document variant carries the raw
/// resume so the critique sees the document itself, not an extraction.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBlock {
    Text { text: String },
    Document { source: DocumentSource },
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSource {
    #[serde(rename = "type")]
    pub source_type: &'static str,
    pub media_type: &'static str,
    pub data: String,
}

impl DocumentSource {
    fn base64_pdf(document: &[u8]) -> Self {
        Self {
            source_type: "base64",
            media_type: "application/pdf",
            data: BASE64.encode(document),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<RequestBlock>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: vec![RequestBlock::Text { text: text.into() }],
        }
    }
}

/// Per-call options for free-form generation.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Response content is either one plain string or a sequence of typed blocks.
/// Both shapes occur in the wild; `text()` is the single normalization point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    PlainText(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Extracts the payload text: the string itself, or the first text block.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::PlainText(text) => Some(text),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .find(|b| b.block_type == "text")
                .and_then(|b| b.text.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMessage {
    pub content: MessageContent,
}

/// Normalized inference result: `{ message: { content } }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub message: ResponseMessage,
}

impl ChatResponse {
    pub fn text(&self) -> Option<&str> {
        self.message.content.text()
    }
}

/// The two inference capabilities the core depends on: a document critique
/// and free-form generation. No retry anywhere: a failed call is the
/// caller's problem to surface, not to repeat.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn feedback(
        &self,
        document: &[u8],
        instructions: &str,
    ) -> Result<ChatResponse, InferenceError>;

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<ChatResponse, InferenceError>;
}

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: &'static str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Anthropic Messages API client used by all services.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn call(
        &self,
        model: &'static str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse, InferenceError> {
        let request_body = ApiRequest {
            model,
            max_tokens: MAX_TOKENS,
            messages,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ApiResponse = response.json().await?;

        debug!(
            "Inference call succeeded: input_tokens={}, output_tokens={}",
            api_response.usage.input_tokens, api_response.usage.output_tokens
        );

        Ok(ChatResponse {
            message: ResponseMessage {
                content: MessageContent::Blocks(api_response.content),
            },
        })
    }
}

#[async_trait]
impl InferenceService for AnthropicClient {
    async fn feedback(
        &self,
        document: &[u8],
        instructions: &str,
    ) -> Result<ChatResponse, InferenceError> {
        let messages = vec![ChatMessage {
            role: "user",
            content: vec![
                RequestBlock::Document {
                    source: DocumentSource::base64_pdf(document),
                },
                RequestBlock::Text {
                    text: instructions.to_string(),
                },
            ],
        }];
        self.call(FEEDBACK_MODEL, messages).await
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<ChatResponse, InferenceError> {
        self.call(options.model, messages).await
    }
}

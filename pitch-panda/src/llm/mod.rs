//! Chat-completion client abstraction
//!
//! Pipeline nodes talk to the model through [`LlmClient`], so tests can swap
//! in a scripted client and production uses [`OpenAiClient`].

pub mod json;
pub mod openai;

pub use json::{extract_json, parse_json};
pub use openai::{OpenAiClient, OpenAiConfig};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by an [`LlmClient`]
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenAI API key is required: set OPENAI_API_KEY (or VITE_OPENAI_API_KEY) or pass --api-key")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model returned invalid JSON: {message} (raw: {raw})")]
    InvalidJson { message: String, raw: String },
}

impl LlmError {
    /// Transport failures, rate limiting and server errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multimodal message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }

    /// All text in this message, image parts skipped
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A single chat-completion request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    /// Falls back to the client's default model when unset
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask for `response_format = {"type": "json_object"}`
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub content: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;
}

/// Send `request` in JSON mode and deserialize the answer into `T`
pub async fn complete_json<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    mut request: ChatRequest,
) -> Result<T, LlmError> {
    request.json_mode = true;
    let response = llm.complete(request).await?;
    parse_json(&response.content)
}

/// Send `request` as a plain text completion
pub async fn complete_text(llm: &dyn LlmClient, mut request: ChatRequest) -> Result<String, LlmError> {
    request.json_mode = false;
    let response = llm.complete(request).await?;
    let content = response.content.trim();
    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(content.to_string())
}

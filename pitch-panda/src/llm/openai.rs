//! OpenAI-compatible chat-completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmError, Usage};

/// Configuration for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub api_key: String,
    /// Model used when a request does not name one
    pub model: String,
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            timeout_secs: 120,
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Single attempt, no retry
    async fn try_request(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = CompletionsRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: CompletionsResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidJson {
                message: format!("malformed completions body: {}", e),
                raw: crate::utils::truncate_chars(&text, 500),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(ChatResponse {
            content,
            model: parsed.model,
            usage: parsed.usage,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut attempt: u32 = 0;

        loop {
            match self.try_request(&request).await {
                Ok(response) => {
                    if let Some(usage) = &response.usage {
                        tracing::debug!(
                            model = response.model.as_deref().unwrap_or(&self.config.model),
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "chat completion finished"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    // Exponential backoff: base, 2x base, 4x base, ...
                    let delay = self.config.base_delay * 2u32.pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "LLM request failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        self.config.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        let result = OpenAiClient::new(OpenAiConfig::new("  "));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut config = OpenAiConfig::new("sk-test");
        config.base_url = "http://localhost:1234/v1/".to_string();
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_request_body_json_mode() {
        let messages = vec![ChatMessage::user("hi")];
        let body = CompletionsRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: Some(0.1),
            max_tokens: None,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}

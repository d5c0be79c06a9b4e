//! Chat-completion client
//!
//! One request, one response. The caller needs the whole JSON object before
//! it can validate anything, so there is no streaming and no retry here.

use crate::errors::SummarizeError;
use crate::prompt::{ChatMessage, SummaryRequest};
use async_trait::async_trait;
use paperdigest_common::config::LlmConfig;
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::metrics;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Longest slice of an upstream error body kept in logs
const ERROR_BODY_LOG_LIMIT: usize = 512;

/// Performs the remote completion call
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Return the model's raw text answer
    async fn complete(&self, request: &SummaryRequest) -> std::result::Result<String, SummarizeError>;

    /// Model identifier the client is pinned to
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// OpenAI-compatible `/chat/completions` client (OpenRouter by default)
pub struct ChatCompletionClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl ChatCompletionClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn call(&self, request: &SummaryRequest) -> std::result::Result<String, SummarizeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                SummarizeError::UpstreamUnavailable("LLM API key is not configured".to_string())
            })?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: request.messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("Content-Type", "application/json");

        if let Some(referer) = &self.config.http_referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.app_title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.json(&body).send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "request failed" };
            SummarizeError::UpstreamUnavailable(format!("LLM API {}", reason))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LOG_LIMIT).collect();
            warn!(status = status.as_u16(), body = %snippet, "LLM API returned an error");
            return Err(SummarizeError::UpstreamUnavailable(format!(
                "LLM API error {}",
                status
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            SummarizeError::UpstreamUnavailable(format!("Failed to decode LLM response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                SummarizeError::UpstreamUnavailable("Empty response from LLM".to_string())
            })?;

        debug!(response_len = content.len(), "LLM response received");
        Ok(content)
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, request: &SummaryRequest) -> std::result::Result<String, SummarizeError> {
        let start = Instant::now();
        let result = self.call(request).await;
        metrics::record_llm(start.elapsed().as_secs_f64(), &self.config.model, result.is_ok());
        result
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = LlmConfig {
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = ChatCompletionClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        // Unroutable on purpose: the key check must short-circuit first
        let config = LlmConfig {
            api_key: None,
            base_url: "http://127.0.0.1:1".to_string(),
            ..LlmConfig::default()
        };
        let client = ChatCompletionClient::new(config).unwrap();

        let request = crate::prompt::SummaryRequestBuilder.build("text");
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, SummarizeError::UpstreamUnavailable(ref m) if m.contains("not configured")));
    }

    #[test]
    fn test_request_body_shape() {
        let request = crate::prompt::SummaryRequestBuilder.build("paper text");
        let body = ChatRequest {
            model: "m",
            messages: request.messages(),
            temperature: 0.7,
            max_tokens: 8172,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["max_tokens"], 8172);
        assert_eq!(json["messages"][1]["role"], "user");
    }
}

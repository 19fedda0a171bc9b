//! Backend for the hosted Anthropic Messages API.

use super::{AnalysisBackend, AnalysisError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

pub const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicApiBackend {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    endpoint: String,
    timeout: Duration,
}

impl AnthropicApiBackend {
    /// Fails with [`AnalysisError::MissingApiKey`] when `api_key` is absent
    /// or blank.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(AnalysisError::MissingApiKey)?;
        let client = Client::builder()
            .user_agent(concat!("quarry/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            endpoint: MESSAGES_URL.to_string(),
            timeout,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.trim().to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_headers(&self) -> Result<HeaderMap, AnalysisError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| AnalysisError::MalformedResponse(format!("invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [ { "role": "user", "content": prompt } ]
        })
    }
}

/// Concatenate the `text` blocks of a Messages API response.
pub fn extract_text(value: &Value) -> Result<String, AnalysisError> {
    let parts = value
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| AnalysisError::MalformedResponse("missing content array".into()))?;

    let texts: Vec<&str> = parts
        .iter()
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        return Err(AnalysisError::MalformedResponse(
            "response has no text content".into(),
        ));
    }
    Ok(texts.concat())
}

#[async_trait]
impl AnalysisBackend for AnthropicApiBackend {
    fn name(&self) -> &'static str {
        "anthropic-api"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        let started = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .headers(self.build_headers()?)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout(self.timeout.as_secs())
                } else {
                    AnalysisError::Http(e)
                }
            })?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(
            status = status.as_u16(),
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "messages request completed"
        );

        if !status.is_success() {
            return Err(AnalysisError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
        Ok(extract_text(&value)?.trim().to_string())
    }
}

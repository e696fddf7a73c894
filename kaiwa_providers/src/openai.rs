use std::time::Duration;

use async_trait::async_trait;
use kaiwa_core::{ChatMessage, CompletionError, LLMProvider, LLMResponse, Usage};
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::info;

/// Chat-completion client for an OpenAI-compatible API.
///
/// Stateless request/response wrapper: one `POST /chat/completions` per
/// call, bounded output length and fixed sampling temperature.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiClient");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Explicit per-request timeout applied to every completion call.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn try_send(&self, request: &serde_json::Value) -> Result<LLMResponse, CompletionError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::Other(e.to_string()))?;

        if let Some(e) = classify_status(response.status()) {
            return Err(e);
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| CompletionError::Other(e.to_string()))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                CompletionError::Other("invalid response format: missing content".to_string())
            })?
            .trim()
            .to_string();

        let usage = body["usage"].as_object().map(|u| Usage {
            prompt_tokens: u32::try_from(u["prompt_tokens"].as_u64().unwrap_or(0)).unwrap_or(0),
            completion_tokens: u32::try_from(u["completion_tokens"].as_u64().unwrap_or(0))
                .unwrap_or(0),
            total_tokens: u32::try_from(u["total_tokens"].as_u64().unwrap_or(0)).unwrap_or(0),
        });

        Ok(LLMResponse { content, usage })
    }
}

/// Map an HTTP status onto the completion failure taxonomy.
///
/// Authentication and rate-limit rejections get their own variants so the
/// caller can relay the matching localized fallback text; every other
/// non-success status surfaces as an upstream error carrying the code.
fn classify_status(status: StatusCode) -> Option<CompletionError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(CompletionError::Auth);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(CompletionError::RateLimited);
    }
    if !status.is_success() {
        return Some(CompletionError::Upstream(status.as_u16()));
    }
    None
}

#[async_trait]
impl LLMProvider for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LLMResponse, CompletionError> {
        let request = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        info!("Sending request to completion API: model={}", self.model);
        let response = self.try_send(&request).await?;
        info!("Received response from completion API");

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_auth() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            Some(CompletionError::Auth)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            Some(CompletionError::Auth)
        ));
    }

    #[test]
    fn too_many_requests_maps_to_rate_limited() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(CompletionError::RateLimited)
        ));
    }

    #[test]
    fn server_error_carries_status_code() {
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            Some(CompletionError::Upstream(502))
        ));
    }

    #[test]
    fn success_is_not_classified() {
        assert!(classify_status(StatusCode::OK).is_none());
    }
}

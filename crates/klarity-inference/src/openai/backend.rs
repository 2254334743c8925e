//! OpenAI-compatible analysis backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use klarity_core::{defaults, AnalysisBackend, DocumentAnalysis, Error, Result};

use super::types::*;
use crate::prompt::{build_analysis_prompt, parse_analysis, SYSTEM_PROMPT};

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::ANALYSIS_BASE_URL.to_string(),
            api_key: None,
            model: defaults::ANALYSIS_MODEL.to_string(),
            timeout_seconds: defaults::ANALYSIS_TIMEOUT_SECS,
            temperature: defaults::ANALYSIS_TEMPERATURE,
            max_tokens: defaults::ANALYSIS_MAX_TOKENS,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from `ANALYSIS_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ANALYSIS_BASE_URL")
                .unwrap_or_else(|_| defaults::ANALYSIS_BASE_URL.to_string()),
            api_key: std::env::var("ANALYSIS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            model: std::env::var("ANALYSIS_MODEL")
                .unwrap_or_else(|_| defaults::ANALYSIS_MODEL.to_string()),
            timeout_seconds: std::env::var("ANALYSIS_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::ANALYSIS_TIMEOUT_SECS),
            ..Self::default()
        }
    }
}

/// Analysis backend speaking the OpenAI chat-completions protocol.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "Initializing OpenAI analysis backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }

    /// Send one chat completion and return the first choice's content.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            response_format: Some(ResponseFormat::json_object()),
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response
                .json()
                .await
                .unwrap_or_else(|_| OpenAIErrorResponse::unknown());
            warn!(
                status = status.as_u16(),
                error_type = %body.error.error_type,
                "Analysis endpoint returned an error"
            );
            return Err(endpoint_error(status.as_u16(), &body.error));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &result.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Analysis token usage"
            );
        }

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Response contained no choices".to_string()))
    }
}

/// Map an endpoint error response onto a klarity [`Error`].
///
/// Problems the operator must fix (credentials, model name) are
/// [`Error::Config`]; anything else is [`Error::Inference`], which the
/// resilient wrapper answers with the fallback analysis.
pub fn endpoint_error(status: u16, error: &OpenAIError) -> Error {
    let detail = format!("endpoint returned {}: {}", status, error.message);
    match status {
        401 | 403 => Error::Config(format!("Authentication failed: {}", detail)),
        404 => Error::Config(format!("Model not found: {}", detail)),
        _ if error.error_type == "model_not_found"
            || error.code.as_deref() == Some("model_not_found") =>
        {
            Error::Config(format!("Model not found: {}", detail))
        }
        400 if error.error_type.contains("context_length")
            || error.code.as_deref().is_some_and(|c| c.contains("context_length")) =>
        {
            Error::Inference(format!(
                "Context too long even with input capped at {} characters, \
                 use a larger-context model: {}",
                defaults::ANALYSIS_MAX_INPUT_CHARS,
                detail
            ))
        }
        _ => Error::Inference(detail),
    }
}

#[async_trait]
impl AnalysisBackend for OpenAIBackend {
    #[instrument(
        skip(self, text),
        fields(subsystem = "inference", component = "openai", op = "analyze", text_len = text.len())
    )]
    async fn analyze(&self, text: &str, document_type: &str) -> Result<DocumentAnalysis> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: build_analysis_prompt(text, document_type),
            },
        ];

        let content = self.complete(messages).await?;
        debug!(response_len = content.len(), "Analysis generated");
        parse_analysis(&content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, defaults::ANALYSIS_BASE_URL);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_seconds, 120);
        assert_eq!(config.max_tokens, 8192);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_backend_creation() {
        let backend = OpenAIBackend::new(OpenAIConfig::default()).unwrap();
        assert_eq!(backend.model_name(), "gpt-4o-mini");
        assert_eq!(backend.config().base_url, defaults::ANALYSIS_BASE_URL);
    }

    fn api_error(error_type: &str, code: Option<&str>) -> OpenAIError {
        OpenAIError {
            message: "details".to_string(),
            error_type: error_type.to_string(),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_operator_errors_are_config() {
        let err = endpoint_error(401, &api_error("invalid_request_error", Some("invalid_api_key")));
        assert!(matches!(err, Error::Config(ref m) if m.starts_with("Authentication failed")));
        assert!(matches!(
            endpoint_error(404, &api_error("invalid_request_error", None)),
            Error::Config(_)
        ));
        assert!(matches!(
            endpoint_error(400, &api_error("invalid_request_error", Some("model_not_found"))),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_context_length_mentions_input_cap() {
        let err = endpoint_error(
            400,
            &api_error("invalid_request_error", Some("context_length_exceeded")),
        );
        match err {
            Error::Inference(message) => assert!(message.contains("50000")),
            other => panic!("expected inference error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_statuses_are_inference() {
        assert!(matches!(
            endpoint_error(503, &api_error("server_error", None)),
            Error::Inference(_)
        ));
        assert!(matches!(
            endpoint_error(429, &api_error("rate_limit_exceeded", None)),
            Error::Inference(_)
        ));
    }

    #[test]
    fn test_custom_model_name() {
        let config = OpenAIConfig {
            model: "llama3".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        assert_eq!(backend.model_name(), "llama3");
    }
}

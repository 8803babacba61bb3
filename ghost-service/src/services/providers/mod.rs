//! Upstream text-generation providers.
//!
//! Each provider turns a [`Prompt`] into raw generated text and classifies every
//! failure as a [`ProviderError`]. Deadline enforcement, fallback text and the
//! HTTP mapping live in [`crate::services::proxy`].

pub mod huggingface;
pub mod mock;
pub mod openai;

use crate::config::{ProviderKind, UpstreamConfig};
use crate::services::prompt::Prompt;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Longest slice of a raw upstream body quoted back to the caller.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0} is missing")]
    NotConfigured(String),

    /// The model is still loading on the provider side.
    #[error("Model is warming up")]
    WarmingUp { estimated_secs: Option<f64> },

    /// Non-success HTTP response from the provider.
    #[error("API error ({status:?}): {message}")]
    Api { status: Option<u16>, message: String },

    /// 2xx response whose payload matched no known shape.
    #[error("Unrecognized response shape: {0}")]
    UnrecognizedShape(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::UnrecognizedShape(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Text produced by one upstream call, before fallback substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
}

/// Sampling parameters forwarded to the provider when set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl From<&UpstreamConfig> for GenerationParams {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short provider label used in logs and metrics.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Perform exactly one upstream call.
    async fn generate(&self, prompt: &Prompt) -> Result<Generation, ProviderError>;
}

/// Construct the provider selected by configuration.
pub fn build_provider(config: &UpstreamConfig) -> Result<Arc<dyn TextProvider>, ProviderError> {
    let provider: Arc<dyn TextProvider> = match config.provider {
        ProviderKind::HuggingFace => Arc::new(huggingface::HuggingFaceProvider::new(config)?),
        ProviderKind::OpenAi => Arc::new(openai::OpenAiProvider::new(config)?),
    };
    Ok(provider)
}

pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("ghost-service/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Pull a readable message out of an upstream error body.
///
/// Understands `{"error": "..."}`, `{"error": {"message": "..."}}`,
/// `{"error": ["..."]}` and `{"message": "..."}`; otherwise quotes the status
/// line and the start of the raw body.
pub fn upstream_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = structured_message(&value) {
            return message;
        }
    }

    let snippet: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
    if snippet.is_empty() {
        format!("Upstream {}", status)
    } else {
        format!("Upstream {}: {}", status, snippet)
    }
}

fn structured_message(value: &Value) -> Option<String> {
    let message = match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            Some(joined)
        }
        _ => value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    message.filter(|m| !m.trim().is_empty())
}

//! Hosted inference provider (text-generation task).
//!
//! Completion-style models receive the rendered prompt and frequently restate
//! it, so output goes through [`strip_echo`]. A 503 carrying `estimated_time`
//! means the model is still loading.

use super::{
    http_client, upstream_error_message, Generation, GenerationParams, ProviderError, TextProvider,
};
use crate::config::UpstreamConfig;
use crate::services::prompt::{strip_echo, Prompt};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedRequestExt;

pub struct HuggingFaceProvider {
    client: Client,
    api_key: Option<Secret<String>>,
    model: String,
    base_url: String,
    params: GenerationParams,
}

impl HuggingFaceProvider {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            params: GenerationParams::from(config),
        })
    }

    fn api_url(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl TextProvider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<Generation, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("HF_TOKEN".to_string()))?;

        let inputs = prompt.render();
        let request = InferenceRequest {
            inputs: &inputs,
            parameters: InferenceParameters {
                max_new_tokens: self.params.max_tokens,
                temperature: self.params.temperature,
                return_full_text: false,
            },
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = inputs.len(),
            "Sending request to inference API"
        );

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .with_trace_context()
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let payload = serde_json::from_str::<InferencePayload>(&body).ok();

        if !status.is_success() {
            if let Some(InferencePayload::Error(err)) = &payload {
                if status == StatusCode::SERVICE_UNAVAILABLE || err.estimated_time.is_some() {
                    return Err(ProviderError::WarmingUp {
                        estimated_secs: err.estimated_time,
                    });
                }
            }
            if status == StatusCode::SERVICE_UNAVAILABLE
                && body.to_ascii_lowercase().contains("loading")
            {
                return Err(ProviderError::WarmingUp {
                    estimated_secs: None,
                });
            }

            tracing::warn!(status = %status, body = %body, "Inference API returned an error");
            return Err(ProviderError::Api {
                status: Some(status.as_u16()),
                message: upstream_error_message(status, &body),
            });
        }

        let text = match payload {
            Some(payload) => payload.into_text()?,
            None => {
                return Err(ProviderError::UnrecognizedShape(format!(
                    "non-JSON body: {}",
                    body.chars().take(120).collect::<String>()
                )));
            }
        };

        Ok(Generation {
            text: strip_echo(&text, &inputs),
        })
    }
}

// ============================================================================
// Inference API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    return_full_text: bool,
}

/// Every response shape the text-generation task is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferencePayload {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error(InferenceError),
    Bare(String),
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    error: serde_json::Value,
    #[serde(default)]
    estimated_time: Option<f64>,
}

impl InferencePayload {
    fn into_text(self) -> Result<String, ProviderError> {
        match self {
            InferencePayload::Batch(items) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| ProviderError::UnrecognizedShape("empty generation list".into())),
            InferencePayload::Single(g) => Ok(g.generated_text),
            InferencePayload::Bare(text) => Ok(text),
            InferencePayload::Error(err) => match err.estimated_time {
                Some(secs) => Err(ProviderError::WarmingUp {
                    estimated_secs: Some(secs),
                }),
                None => Err(ProviderError::Api {
                    status: None,
                    message: match err.error {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    },
                }),
            },
        }
    }
}

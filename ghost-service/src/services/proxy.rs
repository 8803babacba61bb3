//! One bounded upstream call per question, normalized into a [`ProxyResult`].

use crate::models::Question;
use crate::services::metrics;
use crate::services::prompt::Prompt;
use crate::services::providers::{Generation, ProviderError, TextProvider};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Returned instead of an empty answer.
pub const FALLBACK_TEXT: &str = "The ghost is silent…";

pub const NETWORK_FAILURE_MESSAGE: &str = "Failed to reach the upstream provider";

pub const UNRECOGNIZED_MESSAGE: &str = "Upstream provider returned an unrecognized response";

/// Outcome of a single proxied question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyResult {
    Success { text: String },
    Failure { status: StatusCode, message: String },
}

impl IntoResponse for ProxyResult {
    fn into_response(self) -> Response {
        match self {
            ProxyResult::Success { text } => {
                (StatusCode::OK, Json(json!({ "text": text }))).into_response()
            }
            ProxyResult::Failure { status, message } => {
                AppError::Upstream { status, message }.into_response()
            }
        }
    }
}

/// Terminal state of an upstream call, used as the metrics outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Succeeded,
    WarmingUp,
    TimedOut,
    UpstreamError,
    NetworkError,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Succeeded => "succeeded",
            CallOutcome::WarmingUp => "warming_up",
            CallOutcome::TimedOut => "timed_out",
            CallOutcome::UpstreamError => "upstream_error",
            CallOutcome::NetworkError => "network_error",
        }
    }
}

pub fn warming_up_text(estimated_secs: Option<f64>) -> String {
    match estimated_secs {
        Some(secs) if secs.is_finite() && secs > 0.0 => format!(
            "The ghost is waking up… try again in about {} seconds.",
            secs.ceil() as u64
        ),
        _ => "The ghost is waking up… try again in a moment.".to_string(),
    }
}

pub struct GhostProxy {
    provider: Arc<dyn TextProvider>,
    system_prompt: String,
    timeout: Duration,
}

impl GhostProxy {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            timeout,
        }
    }

    /// Ask the provider once. Past the deadline the call is dropped and the
    /// request fails immediately.
    pub async fn ask(&self, question: &Question) -> ProxyResult {
        let prompt = Prompt::new(self.system_prompt.as_str(), question.as_str());
        let started = Instant::now();

        let call = self.provider.generate(&prompt);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        let elapsed = started.elapsed();
        let (outcome, proxy_result) = self.normalize(result);

        metrics::record_upstream_call(
            self.provider.name(),
            self.provider.model(),
            outcome.as_str(),
            elapsed.as_secs_f64(),
        );
        tracing::info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Upstream call finished"
        );

        proxy_result
    }

    fn normalize(&self, result: Result<Generation, ProviderError>) -> (CallOutcome, ProxyResult) {
        match result {
            Ok(generation) => {
                let text = generation.text.trim();
                let text = if text.is_empty() {
                    tracing::debug!("Upstream returned empty text, using fallback");
                    FALLBACK_TEXT.to_string()
                } else {
                    text.to_string()
                };
                (CallOutcome::Succeeded, ProxyResult::Success { text })
            }
            Err(ProviderError::WarmingUp { estimated_secs }) => (
                CallOutcome::WarmingUp,
                ProxyResult::Success {
                    text: warming_up_text(estimated_secs),
                },
            ),
            Err(ProviderError::Api { status, message }) => {
                let status = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    CallOutcome::UpstreamError,
                    ProxyResult::Failure { status, message },
                )
            }
            Err(ProviderError::UnrecognizedShape(detail)) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    detail = %detail,
                    "Unrecognized upstream payload"
                );
                (
                    CallOutcome::UpstreamError,
                    ProxyResult::Failure {
                        status: StatusCode::BAD_GATEWAY,
                        message: UNRECOGNIZED_MESSAGE.to_string(),
                    },
                )
            }
            Err(ProviderError::Timeout(after)) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout = ?after,
                    "Upstream call timed out"
                );
                (
                    CallOutcome::TimedOut,
                    ProxyResult::Failure {
                        status: StatusCode::BAD_GATEWAY,
                        message: format!("Upstream provider timed out after {:?}", after),
                    },
                )
            }
            Err(ProviderError::Network(detail)) => {
                tracing::error!(
                    provider = self.provider.name(),
                    error = %detail,
                    "Upstream call failed"
                );
                (
                    CallOutcome::NetworkError,
                    ProxyResult::Failure {
                        status: StatusCode::BAD_GATEWAY,
                        message: NETWORK_FAILURE_MESSAGE.to_string(),
                    },
                )
            }
            Err(ProviderError::NotConfigured(credential)) => (
                CallOutcome::UpstreamError,
                ProxyResult::Failure {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: AppError::MissingCredential(credential).to_string(),
                },
            ),
        }
    }
}

use crate::models::{GhostDiagnostic, Question};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct GhostQuery {
    pub debug: Option<String>,
}

impl GhostQuery {
    pub fn is_debug(&self) -> bool {
        matches!(self.debug.as_deref().map(str::trim), Some("1") | Some("true"))
    }
}

fn diagnostic(state: &AppState, debug: bool) -> GhostDiagnostic {
    let upstream = &state.config.upstream;
    GhostDiagnostic {
        ok: true,
        debug,
        provider: upstream.provider.as_str(),
        model: upstream.model.clone(),
        has_key: upstream.has_key(),
        timeout_secs: upstream.timeout.as_secs(),
        time: chrono::Utc::now(),
    }
}

/// GET: liveness and configuration summary, never calls upstream.
pub async fn ghost_info(
    State(state): State<AppState>,
    query: Option<Query<GhostQuery>>,
) -> Json<GhostDiagnostic> {
    let debug = query.map(|Query(q)| q.is_debug()).unwrap_or(false);
    Json(diagnostic(&state, debug))
}

/// POST: answer the visitor's question through the configured provider.
pub async fn ask_ghost(
    State(state): State<AppState>,
    query: Option<Query<GhostQuery>>,
    body: Bytes,
) -> Result<Response, AppError> {
    if query.is_some_and(|Query(q)| q.is_debug()) {
        tracing::debug!("Debug flag set, skipping upstream call");
        return Ok(Json(diagnostic(&state, true)).into_response());
    }

    let upstream = &state.config.upstream;
    if !upstream.has_key() {
        tracing::error!(
            credential = upstream.provider.credential_env(),
            "Upstream credential missing"
        );
        return Err(AppError::MissingCredential(
            upstream.provider.credential_env().to_string(),
        ));
    }

    let question = Question::parse(&body)?;
    tracing::debug!(question_len = question.as_str().len(), "Asking the ghost");

    Ok(state.proxy.ask(&question).await.into_response())
}

pub async fn post_only() -> AppError {
    AppError::MethodNotAllowed("POST only".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_values() {
        let q = |v: Option<&str>| GhostQuery {
            debug: v.map(str::to_string),
        };
        assert!(q(Some("1")).is_debug());
        assert!(q(Some("true")).is_debug());
        assert!(!q(Some("0")).is_debug());
        assert!(!q(None).is_debug());
    }
}

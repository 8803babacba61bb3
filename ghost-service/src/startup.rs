//! Router assembly and server lifecycle.

use crate::config::GhostConfig;
use crate::handlers::{
    ask_ghost, echo, ghost_info, health_check, metrics_endpoint, post_only, readiness_check,
};
use crate::middleware::http_metrics_middleware;
use crate::AppState;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::cors::{cors_middleware, CorsPolicy};
use service_core::middleware::tracing::{request_id, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = Arc::new(CorsPolicy::new(state.config.cors.allowed_origins.clone()));

    let ghost = get(ghost_info).post(ask_ghost).fallback(post_only);

    Router::new()
        .route("/ghost", ghost.clone())
        .route("/api/ghost", ghost)
        .route("/echo", any(echo))
        .route("/api/echo", any(echo))
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        // CORS runs inside the other layers so that preflights and failures
        // are still counted and traced.
        .layer(from_fn_with_state(cors, cors_middleware))
        .layer(from_fn(http_metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: GhostConfig) -> Result<Self, AppError> {
        let address = config.common.address();
        let origins = config.cors.allowed_origins.len();
        let provider = config.upstream.provider;
        let has_key = config.upstream.has_key();

        let state = AppState::new(config)?;

        if has_key {
            tracing::info!(
                provider = provider.as_str(),
                model = %state.config.upstream.model,
                timeout = ?state.config.upstream.timeout,
                "Upstream provider initialized"
            );
        } else {
            tracing::warn!(
                credential = provider.credential_env(),
                "Upstream credential not configured - questions will be rejected with 500"
            );
        }
        if origins == 0 {
            tracing::info!("No allowed origins configured, echoing request origin");
        }

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", address, e);
            e
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("ghost-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                AppError::from(e)
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

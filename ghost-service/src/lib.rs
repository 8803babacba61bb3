pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use config::GhostConfig;
use service_core::error::AppError;
use services::providers::{build_provider, TextProvider};
use services::GhostProxy;
use std::sync::Arc;

pub use startup::{build_router, Application};

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GhostConfig>,
    pub proxy: Arc<GhostProxy>,
}

impl AppState {
    /// State backed by the provider named in `config`.
    pub fn new(config: GhostConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config.upstream).map_err(|e| {
            tracing::error!(error = %e, "Failed to create upstream provider");
            AppError::InternalError(anyhow::Error::new(e))
        })?;
        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: GhostConfig, provider: Arc<dyn TextProvider>) -> Self {
        let proxy = GhostProxy::new(
            provider,
            config.upstream.system_prompt.clone(),
            config.upstream.timeout,
        );
        Self {
            config: Arc::new(config),
            proxy: Arc::new(proxy),
        }
    }
}

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use ghost_service::config::{
    CorsConfig, GhostConfig, ObservabilityConfig, ProviderKind, UpstreamConfig,
};
use ghost_service::{build_router, AppState};
use std::time::Duration;
use tower::util::ServiceExt;

pub const TEST_MODEL: &str = "test/ghost-model";

pub fn test_config(
    provider: ProviderKind,
    api_key: Option<&str>,
    base_url: &str,
) -> GhostConfig {
    let mut upstream = UpstreamConfig::for_provider(provider, api_key);
    upstream.model = TEST_MODEL.to_string();
    upstream.base_url = base_url.to_string();
    upstream.timeout = Duration::from_secs(5);

    GhostConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        cors: CorsConfig::default(),
        upstream,
        observability: ObservabilityConfig {
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
    }
}

pub fn app(config: GhostConfig) -> Router {
    build_router(AppState::new(config).expect("Failed to build app state"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Vec<u8>,
    pub json: serde_json::Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    let json = serde_json::from_slice(&raw).unwrap_or(serde_json::Value::Null);

    TestResponse {
        status,
        headers,
        raw,
        json,
    }
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

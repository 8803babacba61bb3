//! Cross-origin headers for browser callers.
//!
//! The allowed origin is resolved per request from a fixed allow-list:
//!
//! 1. a listed origin is echoed back exactly;
//! 2. an unlisted origin receives the first listed entry;
//! 3. with no list configured, the request origin is echoed, or `*` when absent.
//!
//! Rule 2 grants nothing to the unlisted caller in a browser (the header will not
//! match its origin), but it is not a security boundary.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const MAX_AGE_SECS: &str = "86400";

/// Resolve the `Access-Control-Allow-Origin` value for one request.
pub fn resolve_allowed_origin(allow_list: &[String], request_origin: &str) -> String {
    match allow_list.first() {
        Some(first) => {
            if allow_list.iter().any(|o| o == request_origin) {
                request_origin.to_string()
            } else {
                first.clone()
            }
        }
        None if request_origin.is_empty() => "*".to_string(),
        None => request_origin.to_string(),
    }
}

/// Allow-list of origins, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    pub fn resolve(&self, request_origin: &str) -> String {
        resolve_allowed_origin(&self.allowed_origins, request_origin)
    }

    /// Write the full CORS header set for the given request origin.
    pub fn apply(&self, request_origin: &str, headers: &mut HeaderMap) {
        let allowed = self.resolve(request_origin);
        let allowed = HeaderValue::from_str(&allowed).unwrap_or_else(|_| {
            tracing::warn!(origin = %allowed, "Allowed origin is not a valid header value");
            HeaderValue::from_static("*")
        });

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
    }
}

/// Parse a comma-separated list, dropping blank entries.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Attach CORS headers to every response and answer preflights with 204.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    policy.apply(&origin, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware::from_fn_with_state, routing::post};
    use tower::util::ServiceExt;

    fn list(origins: &[&str]) -> Vec<String> {
        origins.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn listed_origin_is_echoed() {
        let allow = list(&["https://a.example", "https://b.example"]);
        for origin in &allow {
            assert_eq!(resolve_allowed_origin(&allow, origin), *origin);
        }
    }

    #[test]
    fn unlisted_origin_gets_first_entry() {
        let allow = list(&["https://a.example", "https://b.example"]);
        assert_eq!(
            resolve_allowed_origin(&allow, "https://evil.example"),
            "https://a.example"
        );
        assert_eq!(resolve_allowed_origin(&allow, ""), "https://a.example");
    }

    #[test]
    fn listed_match_is_exact() {
        let allow = list(&["https://a.example"]);
        assert_eq!(
            resolve_allowed_origin(&allow, "https://a.example/"),
            "https://a.example"
        );
        assert_eq!(
            resolve_allowed_origin(&allow, "HTTPS://A.EXAMPLE"),
            "https://a.example"
        );
    }

    #[test]
    fn empty_list_echoes_or_wildcards() {
        assert_eq!(
            resolve_allowed_origin(&[], "http://localhost:3000"),
            "http://localhost:3000"
        );
        assert_eq!(resolve_allowed_origin(&[], ""), "*");
    }

    #[test]
    fn csv_parsing_trims_and_drops_blanks() {
        assert_eq!(
            parse_origin_list(" https://a.example , ,https://b.example,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_origin_list("").is_empty());
    }

    fn app(policy: CorsPolicy) -> Router {
        Router::new()
            .route(
                "/ghost",
                post(|| async { (StatusCode::BAD_REQUEST, "nope") }),
            )
            .layer(from_fn_with_state(Arc::new(policy), cors_middleware))
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_no_content() {
        let response = app(CorsPolicy::default())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/ghost")
                    .header("Origin", "https://site.example")
                    .body(Body::from("ignored"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://site.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], MAX_AGE_SECS);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn error_responses_still_carry_headers() {
        let response = app(CorsPolicy::new(list(&["https://a.example"])))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ghost")
                    .header("Origin", "https://other.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.example"
        );
        assert_eq!(response.headers()[header::VARY], "Origin");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            ALLOW_HEADERS
        );
    }
}

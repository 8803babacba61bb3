mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{app, post_json, send, test_config};
use ghost_service::config::ProviderKind;

#[tokio::test]
async fn echo_reflects_method_url_headers_and_body() {
    let app = app(test_config(ProviderKind::OpenAi, None, "http://127.0.0.1:1"));

    let mut request = post_json("/api/echo?from=test", r#"{"question":"mirror?"}"#);
    request
        .headers_mut()
        .insert("x-ghost-probe", "yes".parse().unwrap());

    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["ok"], true);
    assert_eq!(response.json["method"], "POST");
    assert_eq!(response.json["url"], "/api/echo?from=test");
    assert_eq!(response.json["headers"]["x-ghost-probe"], "yes");
    assert_eq!(response.json["headers"]["content-type"], "application/json");
    assert_eq!(response.json["rawBody"], r#"{"question":"mirror?"}"#);
}

#[tokio::test]
async fn echo_accepts_any_method() {
    let app = app(test_config(ProviderKind::OpenAi, None, "http://127.0.0.1:1"));

    for verb in ["GET", "PUT", "DELETE"] {
        let request = Request::builder()
            .method(verb)
            .uri("/echo")
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;

        assert_eq!(response.status, StatusCode::OK, "{}", verb);
        assert_eq!(response.json["method"], verb);
        assert_eq!(response.json["rawBody"], "");
    }
}

#[tokio::test]
async fn echo_preflight_is_answered_by_cors() {
    let app = app(test_config(ProviderKind::OpenAi, None, "http://127.0.0.1:1"));
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/echo")
        .header("Origin", "https://visitor.example")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers["access-control-allow-origin"],
        "https://visitor.example"
    );
}

//! Integration tests for GET /api/health and the cross-cutting layers.
//!
//! Verifies that:
//! - GET /api/health returns exactly {"status": "ok"}, with or without a credential
//! - every response carries an x-request-id
//! - CORS mirrors the caller's origin and allows credentials

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use chat_relay::config::Config;
use chat_relay::credentials::{CredentialSource, StaticCredentials};
use chat_relay::proxy::{create_router, AppState, UpstreamClient, REQUEST_ID_HEADER};

/// Build a test app whose provider is never contacted.
fn setup_app(credentials: Arc<dyn CredentialSource>) -> axum::Router {
    let config = Config::default();
    let state = AppState {
        upstream: UpstreamClient::new(&config.upstream).unwrap(),
        credentials,
        config: Arc::new(config),
    };
    create_router(state)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .expect("read body")
        .to_vec()
}

#[tokio::test]
async fn test_health_ok() {
    let app = setup_app(Arc::new(StaticCredentials::new("sk-test")));

    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_health_ok_without_credential() {
    let app = setup_app(Arc::new(StaticCredentials::missing("OPENAI_API_KEY")));

    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_request_id_header_is_unique() {
    let app = setup_app(Arc::new(StaticCredentials::new("sk-test")));

    let first = app
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let first_id = first.headers().get(REQUEST_ID_HEADER).expect("request id");
    let second_id = second.headers().get(REQUEST_ID_HEADER).expect("request id");
    assert_eq!(first_id.len(), 36, "UUID string");
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_cors_preflight_mirrors_origin() {
    let app = setup_app(Arc::new(StaticCredentials::new("sk-test")));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "POST"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "content-type"
    );
}

#[tokio::test]
async fn test_cors_simple_request_any_origin() {
    let app = setup_app(Arc::new(StaticCredentials::new("sk-test")));

    let request = Request::get("/api/health")
        .header(header::ORIGIN, "https://somewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://somewhere.example"
    );
}

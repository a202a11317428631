// tests/api_http.rs
//
// HTTP-level tests for the status API without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use paperless_status::{api, build_runner, EndpointConfig, NotifierMux};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY_LIMIT: usize = 1024 * 1024;

async fn paperless_with_count(count: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"count": count, "results": []})),
        )
        .mount(&server)
        .await;
    server
}

fn test_router(server: &MockServer) -> Router {
    let cfg = EndpointConfig::new("127.0.0.1", server.address().port(), false, "tok")
        .with_name("Office Paperless");
    let runner = build_runner(cfg, NotifierMux::new()).expect("runner");
    api::router(Arc::new(runner))
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_ok() {
    let server = paperless_with_count(0).await;
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = test_router(&server).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn status_before_first_poll_is_unknown() {
    let server = paperless_with_count(3).await;
    let req = Request::builder()
        .uri("/status")
        .body(Body::empty())
        .unwrap();

    let resp = test_router(&server).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["name"], "Office Paperless");
    assert_eq!(
        v["unique_id"],
        format!("paperless_status_127.0.0.1_{}", server.address().port())
    );
    assert_eq!(v["state"], "Unknown");
    assert_eq!(v["attributes"]["documents_count"], 0);
    assert!(v["attributes"]["last_error"].is_null());
}

#[tokio::test]
async fn refresh_polls_then_throttles() {
    let server = paperless_with_count(12).await;
    let app = test_router(&server);

    let refresh = || {
        Request::builder()
            .method("POST")
            .uri("/refresh")
            .body(Body::empty())
            .unwrap()
    };

    let v = json_body(app.clone().oneshot(refresh()).await.unwrap()).await;
    assert_eq!(v["outcome"], "polled");
    assert_eq!(v["status"], "Online");
    assert_eq!(v["snapshot"]["attributes"]["documents_count"], 12);
    assert!(v["snapshot"]["last_polled"].is_string());

    // Default min interval is the 60 s scan interval.
    let v = json_body(app.clone().oneshot(refresh()).await.unwrap()).await;
    assert_eq!(v["outcome"], "throttled");
    assert_eq!(v["snapshot"]["state"], "Online");

    let status = Request::builder()
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let v = json_body(app.oneshot(status).await.unwrap()).await;
    assert_eq!(v["state"], "Online");
}

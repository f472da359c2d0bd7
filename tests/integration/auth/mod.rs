//! Authentication and infrastructure route tests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tower::ServiceExt;

use crate::common::{authed_request, create_test_jwt, parse_body, TestApp};

#[tokio::test]
async fn test_health_check_needs_no_auth() {
    let app = TestApp::new();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = app.test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_missing_authorization_returns_401() {
    let app = TestApp::new();
    let req = Request::builder()
        .uri("/v1/messages/unread-count")
        .body(Body::empty())
        .unwrap();

    let resp = app.test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_returns_401() {
    let app = TestApp::new();
    let jwt = create_test_jwt("u1", "not-the-server-secret").unwrap();
    let req = authed_request(Method::GET, "/v1/messages/unread-count", &jwt, None);

    let resp = app.test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header_returns_401() {
    let app = TestApp::new();
    let req = Request::builder()
        .uri("/v1/conversations")
        .header("authorization", "Basic dTE6cGFzcw==")
        .body(Body::empty())
        .unwrap();

    let resp = app.test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = parse_body(resp).await;
    assert!(body["error"]["code"].is_string());
}

//! Functional tests for rate limiting

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use selfie_booth::middleware::rate_limit::RateLimitLayer;
use tower::ServiceExt;

fn create_test_app(rps: u32, burst: u32) -> Router {
    Router::new()
        .route("/api/test", axum::routing::get(|| async { "OK" }))
        .route("/health", axum::routing::get(|| async { "healthy" }))
        .route("/index.html", axum::routing::get(|| async { "<html>" }))
        .layer(RateLimitLayer::new(rps, burst))
}

async fn get(app: &Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_rate_limit_allows_within_limit() {
    let app = create_test_app(100, 100);
    assert_eq!(get(&app, "/api/test").await, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = create_test_app(1, 1);
    assert_eq!(get(&app, "/api/test").await, StatusCode::OK);

    let mut rate_limited = false;
    for _ in 0..10 {
        if get(&app, "/api/test").await == StatusCode::TOO_MANY_REQUESTS {
            rate_limited = true;
            break;
        }
    }
    assert!(rate_limited, "Expected rate limiting to kick in");
}

#[tokio::test]
async fn test_rate_limited_response_body() {
    let app = create_test_app(1, 1);
    get(&app, "/api/test").await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["error"],
        "Rate limit exceeded. Please slow down your requests."
    );
}

#[tokio::test]
async fn test_health_and_static_bypass() {
    let app = create_test_app(1, 1);
    get(&app, "/api/test").await;

    for _ in 0..5 {
        assert_eq!(get(&app, "/health").await, StatusCode::OK);
        assert_eq!(get(&app, "/index.html").await, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rate_limit_burst_capacity() {
    let app = create_test_app(1, 5);
    for _ in 0..5 {
        assert_eq!(get(&app, "/api/test").await, StatusCode::OK);
    }
}

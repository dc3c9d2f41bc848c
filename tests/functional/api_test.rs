//! Functional tests for the stateless endpoints

use axum::http::{header, Method, Request, StatusCode};
use selfie_booth::{generation::payload::INSTANT_ID_MODEL, AppState};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::common::{
    app, post, send, test_settings, FailingArchive, FakeBackend, MemoryArchive, RecordingMailer, CAPTURE,
    PNG_DATA_URL,
};

#[tokio::test]
async fn test_health_reports_integrations() {
    let app = app(AppState::new(test_settings()).with_mailer(Arc::new(RecordingMailer::default())));

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["integrations"]["inference"], false);
    assert_eq!(body["integrations"]["email"], true);
    assert_eq!(body["integrations"]["archive"], false);
}

#[tokio::test]
async fn test_process_image_returns_theme_and_headshot() {
    let backend = FakeBackend::returning("https://cdn.example/out.webp");
    let app = app(AppState::new(test_settings()).with_backend(backend.clone()));

    let (status, body) = post(
        &app,
        "/api/process-image",
        json!({ "image": CAPTURE, "theme": "Superhero", "style": "cinematic" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["themeImage"], "https://cdn.example/out.webp");
    assert_eq!(body["headshotImage"], "https://cdn.example/out.webp");
    assert_eq!(body["processedImage"], body["themeImage"]);

    let calls = backend.calls.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(model, _)| model == INSTANT_ID_MODEL));
    let prompt = calls[0].1["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("solo portrait photo of the person, no other people"));
    assert!(prompt.contains("cinematic style"));
}

#[tokio::test]
async fn test_process_image_custom_prompt() {
    let backend = FakeBackend::returning("https://cdn.example/out.webp");
    let app = app(AppState::new(test_settings()).with_backend(backend.clone()));

    let (status, _) = post(
        &app,
        "/api/process-image",
        json!({ "image": CAPTURE, "isEdit": true, "customPrompt": "on the moon" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = backend.calls.lock();
    assert!(calls[0].1["prompt"]
        .as_str()
        .unwrap()
        .contains("on the moon, detailed environment"));
}

#[tokio::test]
async fn test_process_image_missing_fields_is_rejected_before_any_call() {
    let backend = FakeBackend::returning("https://cdn.example/out.webp");
    let app = app(AppState::new(test_settings()).with_backend(backend.clone()));

    for body in [
        json!({ "theme": "Wizard", "style": "cinematic" }),
        json!({ "image": CAPTURE, "style": "cinematic" }),
        json!({ "image": CAPTURE, "theme": "Wizard", "style": "" }),
    ] {
        let (status, json) = post(&app, "/api/process-image", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required fields");
    }
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_image_is_rejected_before_any_call() {
    let backend = FakeBackend::returning("https://cdn.example/out.webp");
    let app = app(AppState::new(test_settings()).with_backend(backend.clone()));

    let (status, body) = post(
        &app,
        "/api/process-image",
        json!({ "image": "not-an-image", "theme": "Wizard", "style": "cinematic" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = post(
        &app,
        "/api/edit-image",
        json!({ "image": "not-an-image", "prompt": "add a hat" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let backend = FakeBackend::returning("https://cdn.example/out.webp");
    let app = app(AppState::new(test_settings()).with_backend(backend.clone()));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/process-image")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_missing_token_fails_fast() {
    let app = app(AppState::new(test_settings()));

    let (status, body) = post(
        &app,
        "/api/process-image",
        json!({ "image": CAPTURE, "theme": "Wizard", "style": "cinematic" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Replicate API token not configured");

    let (status, _) = post(
        &app,
        "/api/edit-image",
        json!({ "image": "https://cdn.example/a.webp", "prompt": "add a hat" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_provider_failure_is_server_error() {
    let app = app(AppState::new(test_settings()).with_backend(FakeBackend::failing()));

    let (status, body) = post(
        &app,
        "/api/process-image",
        json!({ "image": CAPTURE, "theme": "Wizard", "style": "cinematic" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to process image"));
}

#[tokio::test]
async fn test_edit_image() {
    let backend = FakeBackend::returning("https://cdn.example/edited.png");
    let app = app(AppState::new(test_settings()).with_backend(backend.clone()));

    let (status, body) = post(
        &app,
        "/api/edit-image",
        json!({ "image": "https://cdn.example/theme.webp", "prompt": "Make a small change: add a hat while keeping everything else exactly the same" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedImage"], "https://cdn.example/edited.png");
    assert_eq!(backend.calls.lock()[0].1["image"], "https://cdn.example/theme.webp");

    let (status, body) = post(&app, "/api/edit-image", json!({ "image": CAPTURE })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No edit prompt provided");
}

#[tokio::test]
async fn test_send_email_attaches_valid_images() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(AppState::new(test_settings()).with_mailer(mailer.clone()));

    let (status, body) = post(
        &app,
        "/api/send-email",
        json!({ "email": "visitor@example.com", "images": [PNG_DATA_URL, "garbage", CAPTURE] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let sent = mailer.sent.lock();
    assert_eq!(sent.len(), 1);
    let (to, attachments) = &sent[0];
    assert_eq!(to, "visitor@example.com");
    let names: Vec<_> = attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["image-1.png", "image-2.jpg"]);
}

#[tokio::test]
async fn test_send_email_validation() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(AppState::new(test_settings()).with_mailer(mailer.clone()));

    let (status, body) = post(&app, "/api/send-email", json!({ "images": [PNG_DATA_URL] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = post(
        &app,
        "/api/send-email",
        json!({ "email": "visitor@example.com", "images": ["no-comma"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid images provided");

    assert!(mailer.sent.lock().is_empty());
}

#[tokio::test]
async fn test_send_email_without_smtp_fails_fast() {
    let app = app(AppState::new(test_settings()));

    let (status, body) = post(
        &app,
        "/api/send-email",
        json!({ "email": "visitor@example.com", "image": PNG_DATA_URL }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Email service not configured");
}

#[tokio::test]
async fn test_archive_endpoint() {
    let archive = Arc::new(MemoryArchive::default());
    let app = app(AppState::new(test_settings()).with_archive(archive.clone()));

    let (status, body) = post(
        &app,
        "/api/archive",
        json!({ "image": PNG_DATA_URL, "name": "booth.png" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileId"], "file-1");
    assert_eq!(archive.stored.lock()[0].0, "booth.png");

    let unconfigured = crate::common::app(AppState::new(test_settings()));
    let (status, _) = post(&unconfigured, "/api/archive", json!({ "image": PNG_DATA_URL })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_generation_is_archived_in_background() {
    let archive = Arc::new(MemoryArchive::default());
    let app = app(
        AppState::new(test_settings())
            .with_backend(FakeBackend::returning(PNG_DATA_URL))
            .with_archive(archive.clone()),
    );

    let (status, _) = post(
        &app,
        "/api/process-image",
        json!({ "image": CAPTURE, "theme": "Knight", "style": "photographic" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..50 {
        if archive.stored.lock().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let stored = archive.stored.lock();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|(name, _)| name.ends_with(".png")));
}

#[tokio::test]
async fn test_archive_failure_leaves_generation_intact() {
    let archive = Arc::new(FailingArchive::default());
    let app = app(
        AppState::new(test_settings())
            .with_backend(FakeBackend::returning(PNG_DATA_URL))
            .with_archive(archive.clone()),
    );

    let (status, body) = post(
        &app,
        "/api/process-image",
        json!({ "image": CAPTURE, "theme": "Knight", "style": "photographic" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["themeImage"], PNG_DATA_URL);
    assert_eq!(body["headshotImage"], PNG_DATA_URL);

    let (status, body) = post(
        &app,
        "/api/edit-image",
        json!({ "image": PNG_DATA_URL, "prompt": "add a hat" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedImage"], PNG_DATA_URL);

    for _ in 0..50 {
        if *archive.attempts.lock() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(*archive.attempts.lock(), 3);
}

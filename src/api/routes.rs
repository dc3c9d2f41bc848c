//! Router assembly

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::api::{delivery, images, sessions};
use crate::middleware::rate_limit::RateLimitLayer;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IntegrationStatus {
    pub inference: bool,
    pub email: bool,
    pub archive: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub integrations: IntegrationStatus,
    pub sessions: usize,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        integrations: IntegrationStatus {
            inference: state.generator.is_some(),
            email: state.mailer.is_some(),
            archive: state.archive.is_some(),
        },
        sessions: state.sessions.len(),
    })
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.settings.server;
    let rate_limit = &state.settings.rate_limit;

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/process-image", post(images::process_image))
        .route("/api/edit-image", post(images::edit_image))
        .route("/api/send-email", post(delivery::send_email))
        .route("/api/archive", post(delivery::archive_image))
        .route("/api/sessions", post(sessions::create))
        .route(
            "/api/sessions/:id",
            get(sessions::show).delete(sessions::remove),
        )
        .route("/api/sessions/:id/consent", post(sessions::consent))
        .route("/api/sessions/:id/capture", post(sessions::capture))
        .route("/api/sessions/:id/retake", post(sessions::retake))
        .route("/api/sessions/:id/theme", post(sessions::theme))
        .route("/api/sessions/:id/gender", post(sessions::gender))
        .route("/api/sessions/:id/transform", post(sessions::transform))
        .route("/api/sessions/:id/edit", post(sessions::edit))
        .route("/api/sessions/:id/retry-edit", post(sessions::retry_edit))
        .route("/api/sessions/:id/email", post(sessions::send_email))
        .route("/api/sessions/:id/download", get(sessions::download))
        .with_state(state.clone());

    if Path::new(&server.static_dir).is_dir() {
        info!(dir = %server.static_dir, "Serving static assets");
        router = router.fallback_service(ServeDir::new(&server.static_dir));
    }

    if rate_limit.enabled {
        router = router.layer(RateLimitLayer::from_config(rate_limit));
    }

    router
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

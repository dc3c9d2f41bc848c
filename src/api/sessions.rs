//! Booth session endpoints: the wizard driven server-side

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::upstream_failure;
use crate::booth::{progress, Gender, SessionSnapshot, SharedSession};
use crate::delivery::{email, EmailAttachment};
use crate::error::{AppError, Result};
use crate::media;
use crate::AppState;

type SessionPath = std::result::Result<Path<Uuid>, PathRejection>;
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct GenderRequest {
    #[serde(default)]
    pub gender: Option<Gender>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub instruction: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

fn session(state: &AppState, path: SessionPath) -> Result<SharedSession> {
    let Path(id) = path?;
    state.sessions.get(&id)
}

fn snapshot(state: &AppState, session: &SharedSession) -> Json<SessionSnapshot> {
    Json(session.lock().snapshot(&state.progress))
}

/// Apply a synchronous wizard step and return the updated snapshot
fn step<F>(state: &AppState, path: SessionPath, apply: F) -> Result<Json<SessionSnapshot>>
where
    F: FnOnce(&mut crate::booth::BoothSession) -> Result<()>,
{
    let session = session(state, path)?;
    let mut guard = session.lock();
    apply(&mut *guard)?;
    Ok(Json(guard.snapshot(&state.progress)))
}

/// Run provider work on its own task so a dropped client cannot leave the session busy
async fn detached<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::Internal(format!("Background task failed: {}", e)))?
}

/// POST /api/sessions
pub async fn create(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.sessions.create();
    (StatusCode::CREATED, snapshot(&state, &session))
}

/// GET /api/sessions/:id
pub async fn show(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>> {
    let session = session(&state, path)?;
    Ok(snapshot(&state, &session))
}

/// DELETE /api/sessions/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<StatusCode> {
    let Path(id) = path?;
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(id.to_string()))
    }
}

/// POST /api/sessions/:id/consent
pub async fn consent(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>> {
    step(&state, path, |session| {
        session.accept_consent();
        Ok(())
    })
}

/// POST /api/sessions/:id/capture
pub async fn capture(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
    payload: JsonBody<CaptureRequest>,
) -> Result<Json<SessionSnapshot>> {
    let Json(request) = payload?;
    step(&state, path, |session| session.capture(request.image))
}

/// POST /api/sessions/:id/retake
pub async fn retake(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>> {
    step(&state, path, |session| session.retake())
}

/// POST /api/sessions/:id/theme
pub async fn theme(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>> {
    let themes = &state.settings.booth.themes;
    step(&state, path, |session| {
        session
            .pick_theme(themes, &mut rand::thread_rng())
            .map(|_| ())
    })
}

/// POST /api/sessions/:id/gender
pub async fn gender(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
    payload: JsonBody<GenderRequest>,
) -> Result<Json<SessionSnapshot>> {
    let Json(request) = payload?;
    step(&state, path, |session| session.set_gender(request.gender))
}

/// POST /api/sessions/:id/transform
pub async fn transform(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>> {
    let generator = state.generator()?;
    let session = session(&state, path)?;
    let job = session
        .lock()
        .begin_transform(&state.settings.booth.styles, &mut rand::thread_rng())?;
    info!(theme = %job.theme, style = %job.style, "Session transform started");

    let task_state = state.clone();
    detached(async move {
        let result = generator.transform(&job.image, &job.theme, &job.style).await;
        let mut guard = session.lock();
        match result {
            Ok(portraits) => {
                task_state.archive_generated(&portraits.theme_image, "theme");
                task_state.archive_generated(&portraits.headshot_image, "headshot");
                guard.complete_transform(portraits);
                let mut snapshot = guard.snapshot(&task_state.progress);
                snapshot.progress = progress::COMPLETE;
                Ok(Json(snapshot))
            }
            Err(e) => {
                let err = upstream_failure("Failed to process image", e);
                guard.fail(err.to_string());
                Err(err)
            }
        }
    })
    .await
}

/// POST /api/sessions/:id/edit
pub async fn edit(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
    payload: JsonBody<EditRequest>,
) -> Result<Json<SessionSnapshot>> {
    let generator = state.generator()?;
    let Json(request) = payload?;
    let session = session(&state, path)?;
    let job = session.lock().begin_edit(&request.instruction)?;

    let task_state = state.clone();
    detached(async move {
        let result = generator.edit(&job.image, &job.prompt).await;
        let mut guard = session.lock();
        match result {
            Ok(edited) => {
                task_state.archive_generated(&edited, "edit");
                guard.complete_edit(edited);
                let mut snapshot = guard.snapshot(&task_state.progress);
                snapshot.progress = progress::COMPLETE;
                Ok(Json(snapshot))
            }
            Err(e) => {
                let err = upstream_failure("Failed to edit image", e);
                guard.fail(err.to_string());
                Err(err)
            }
        }
    })
    .await
}

/// POST /api/sessions/:id/retry-edit
pub async fn retry_edit(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>> {
    step(&state, path, |session| session.retry_edit())
}

/// POST /api/sessions/:id/email
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
    payload: JsonBody<EmailRequest>,
) -> Result<Json<SessionSnapshot>> {
    let Json(request) = payload?;
    let to = email::parse_recipient(&request.email)?;
    let mailer = state.mailer()?;
    let session = session(&state, path)?;
    let (image, headshot) = {
        let mut guard = session.lock();
        let image = guard.begin_email()?;
        (image, guard.headshot().map(String::from))
    };

    let task_state = state.clone();
    detached(async move {
        let result = async {
            let mut attachments = vec![EmailAttachment::from_image(
                0,
                media::load_image(&task_state.http, &image).await?,
            )];
            if let Some(headshot) = headshot {
                attachments.push(EmailAttachment::from_image(
                    1,
                    media::load_image(&task_state.http, &headshot).await?,
                ));
            }
            mailer.send_images(&to, attachments).await
        }
        .await;

        let mut guard = session.lock();
        match result {
            Ok(()) => {
                guard.complete_email();
                Ok(Json(guard.snapshot(&task_state.progress)))
            }
            Err(e) => {
                guard.fail(e.to_string());
                Err(e)
            }
        }
    })
    .await
}

/// GET /api/sessions/:id/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    path: SessionPath,
) -> Result<Response> {
    let session = session(&state, path)?;
    let source = session.lock().deliverable()?.to_string();
    let image = media::load_image(&state.http, &source).await?;

    let disposition = format!(
        "attachment; filename=\"ai-selfie.{}\"",
        image.extension_or("png")
    );
    let content_type = image.mime_type_or("application/octet-stream").to_string();

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        image.data,
    )
        .into_response())
}

//! Email and archive endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use crate::api::required;
use crate::delivery::{drive, email, EmailAttachment};
use crate::error::{AppError, Result};
use crate::media::{self, DataUrl, ImageBytes};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Value>>,
    /// Single-image form sent by older clients
    #[serde(default)]
    pub image: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResponse {
    pub file_id: String,
}

/// Data URLs among the submitted entries; anything else is dropped
fn valid_images(entries: &[Value]) -> Vec<&str> {
    entries
        .iter()
        .filter_map(Value::as_str)
        .filter(|image| !image.is_empty() && image.contains(','))
        .collect()
}

/// POST /api/send-email
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>> {
    let Json(request) = payload?;

    let mut entries = request.images.unwrap_or_default();
    entries.extend(request.image);
    let recipient = required(request.email.as_deref());
    let (Some(recipient), false) = (recipient, entries.is_empty()) else {
        return Err(AppError::InvalidRequest("Missing required fields".to_string()));
    };

    let images = valid_images(&entries);
    if images.is_empty() {
        return Err(AppError::InvalidRequest("No valid images provided".to_string()));
    }
    let to = email::parse_recipient(recipient)?;

    let mailer = state.mailer().map_err(|e| {
        error!("Missing SMTP configuration");
        e
    })?;

    let attachments = images
        .into_iter()
        .enumerate()
        .map(|(index, image)| {
            let bytes = DataUrl::parse(image).decode()?;
            Ok(EmailAttachment::from_image(index, ImageBytes::new(bytes)))
        })
        .collect::<Result<Vec<_>>>()?;

    mailer.send_images(&to, attachments).await?;

    Ok(Json(SendEmailResponse { success: true }))
}

/// POST /api/archive
pub async fn archive_image(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ArchiveRequest>, JsonRejection>,
) -> Result<Json<ArchiveResponse>> {
    let archive = state.archive()?;
    let Json(request) = payload?;

    let source = required(request.image.as_deref())
        .ok_or_else(|| AppError::InvalidRequest("No image provided".to_string()))?;
    let image = media::load_image(&state.http, source).await?;

    let name = match required(request.name.as_deref()) {
        Some(name) => name.to_string(),
        None => drive::archive_name("upload", image.extension_or("webp")),
    };

    let file_id = archive.store(&name, image).await.map_err(|e| {
        error!(error = %e, "Error saving to drive");
        e
    })?;

    Ok(Json(ArchiveResponse { file_id }))
}

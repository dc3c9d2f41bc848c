//! Stateless generation endpoints used by the original booth page

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{required, upstream_failure};
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub is_edit: bool,
    #[serde(default)]
    pub custom_prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageResponse {
    pub theme_image: String,
    pub headshot_image: String,
    /// Same as `theme_image`; older clients read this field
    pub processed_image: String,
}

#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageResponse {
    pub processed_image: String,
}

/// POST /api/process-image
pub async fn process_image(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ProcessImageRequest>, JsonRejection>,
) -> Result<Json<ProcessImageResponse>> {
    let generator = state.generator()?;
    let Json(request) = payload?;

    let missing = || AppError::InvalidRequest("Missing required fields".to_string());
    let image = required(request.image.as_deref()).ok_or_else(missing)?;

    let result = if request.is_edit {
        generator.transform_custom(image, &request.custom_prompt).await
    } else {
        let theme = required(request.theme.as_deref()).ok_or_else(missing)?;
        let style = required(request.style.as_deref()).ok_or_else(missing)?;
        generator.transform(image, theme, style).await
    };
    let portraits = result.map_err(|e| upstream_failure("Failed to process image", e))?;

    state.archive_generated(&portraits.theme_image, "theme");
    state.archive_generated(&portraits.headshot_image, "headshot");

    Ok(Json(ProcessImageResponse {
        processed_image: portraits.theme_image.clone(),
        theme_image: portraits.theme_image,
        headshot_image: portraits.headshot_image,
    }))
}

/// POST /api/edit-image
pub async fn edit_image(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<EditImageRequest>, JsonRejection>,
) -> Result<Json<EditImageResponse>> {
    let generator = state.generator()?;
    let Json(request) = payload?;

    let image = required(request.image.as_deref())
        .ok_or_else(|| AppError::InvalidRequest("No image provided".to_string()))?;
    let prompt = required(request.prompt.as_deref())
        .ok_or_else(|| AppError::InvalidRequest("No edit prompt provided".to_string()))?;

    let edited = generator
        .edit(image, prompt)
        .await
        .map_err(|e| upstream_failure("Failed to edit image", e))?;

    state.archive_generated(&edited, "edit");

    Ok(Json(EditImageResponse {
        processed_image: edited,
    }))
}

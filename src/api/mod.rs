//! HTTP API - routes and handlers

pub mod delivery;
pub mod images;
pub mod routes;
pub mod sessions;

use tracing::error;

use crate::error::AppError;

/// Non-blank value of an optional string field
pub(crate) fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Wrap a provider failure for the client; request errors pass through unchanged
pub(crate) fn upstream_failure(context: &str, err: AppError) -> AppError {
    error!(error = %err, "{}", context);
    if err.status().is_client_error() {
        return err;
    }
    AppError::Inference(format!("{}: {}", context, err))
}

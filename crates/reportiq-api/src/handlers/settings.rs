//! User settings routes.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use reportiq_core::{Error, Settings};

use crate::error::ApiError;
use crate::handlers::{envelope, service_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub settings: Option<Value>,
}

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    let settings = state.settings.read().await;
    Json(envelope(json!(&*settings)))
}

/// PUT /settings
///
/// Partial update: the body is deep-merged into the current document,
/// validated as a whole, and rejected without effect on any violation.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if !patch.is_object() {
        return Err(ApiError::bad_request(
            "Invalid settings data",
            Some(json!("Request body must be a JSON object")),
        ));
    }

    let mut settings = state.settings.write().await;
    settings
        .apply_patch(&patch)
        .map_err(settings_error)?;
    tracing::info!("Settings updated");

    let mut body = envelope(json!(&*settings));
    body["message"] = json!("Settings updated successfully");
    Ok(Json(body))
}

/// POST /settings/reset
pub async fn reset_settings(State(state): State<AppState>) -> Json<Value> {
    let mut settings = state.settings.write().await;
    *settings = Settings::default();
    tracing::info!("Settings reset to defaults");

    let mut body = envelope(json!(&*settings));
    body["message"] = json!("Settings reset to default");
    Json(body)
}

/// GET /settings/export
///
/// Pretty-printed JSON served as an attachment download.
pub async fn export_settings(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.settings.read().await;
    let body = serde_json::to_string_pretty(&*settings).unwrap_or_else(|_| "{}".to_string());
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"settings.json\"",
            ),
        ],
        body,
    )
}

/// POST /settings/import
///
/// Wholesale replacement: the imported document must carry every top-level
/// section and validate before anything changes.
pub async fn import_settings(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(imported) = request.settings else {
        return Err(ApiError::bad_request(
            "Invalid settings data",
            Some(json!("Settings must be a valid object")),
        ));
    };

    let parsed = Settings::from_import(&imported).map_err(settings_error)?;
    let mut settings = state.settings.write().await;
    *settings = parsed;
    tracing::info!("Settings imported");

    let mut body = envelope(json!(&*settings));
    body["message"] = json!("Settings imported successfully");
    Ok(Json(body))
}

/// GET /settings/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    service_status(
        &state,
        "settings",
        &[
            "User preferences management",
            "Settings validation",
            "Import/Export functionality",
            "Reset to defaults",
        ],
    )
    .await
}

fn settings_error(err: Error) -> ApiError {
    match err {
        Error::InvalidInput(message) => ApiError::bad_request(message, None),
        other => ApiError::internal(other.to_string()),
    }
}

//! Report summary routes.

use axum::extract::{OriginalUri, Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{map_ai_error, service_status, validate_report_id};
use crate::state::AppState;

/// GET /summary/:reportId
///
/// The upstream response is passed through verbatim; the dashboard consumes
/// its shape directly.
pub async fn get_summary(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;
    tracing::info!(report_id = %report_id, "Summary requested");

    match state.ai.get_summary().await {
        Ok(doc) => {
            state.notifier.analysis_success(&report_id, "Summary Analysis");
            Ok(Json(doc))
        }
        Err(err) => {
            state
                .notifier
                .analysis_error(&report_id, "Summary Analysis", &err.to_string());
            Err(map_ai_error(
                &state,
                uri.path(),
                "Failed to retrieve summary",
                err,
            ))
        }
    }
}

/// POST /summary/regenerate/:reportId
pub async fn regenerate_summary(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;
    tracing::info!(report_id = %report_id, "Summary regeneration requested");

    let doc = state
        .ai
        .get_summary()
        .await
        .map_err(|err| map_ai_error(&state, uri.path(), "Failed to regenerate summary", err))?;

    let mut data = json!({
        "reportId": report_id,
        "summary": doc.get("summary").cloned().unwrap_or_else(|| doc.clone()),
        "generatedAt": chrono::Utc::now().to_rfc3339(),
        "regenerated": true,
    });
    if let (Some(data_obj), Some(doc_obj)) = (data.as_object_mut(), doc.as_object()) {
        for (key, value) in doc_obj {
            data_obj.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "Summary regenerated",
        "data": data,
    })))
}

/// GET /summary/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    service_status(
        &state,
        "summary",
        &[
            "AI-generated summaries",
            "Key points extraction",
            "Summary regeneration",
        ],
    )
    .await
}

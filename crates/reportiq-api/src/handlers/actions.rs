//! Action-item routes.

use axum::extract::{OriginalUri, Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{map_ai_error, service_status, validate_report_id};
use crate::state::AppState;

/// GET /actions/:reportId
pub async fn get_actions(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;
    tracing::info!(report_id = %report_id, "Action items requested");

    match state.ai.get_actions().await {
        Ok(doc) => {
            state
                .notifier
                .analysis_success(&report_id, "AI Actions Analysis");
            let actions = doc.get("actions").cloned().unwrap_or(doc);
            Ok(Json(json!({ "actions": actions })))
        }
        Err(err) => {
            state
                .notifier
                .analysis_error(&report_id, "AI Actions Analysis", &err.to_string());
            Err(map_ai_error(
                &state,
                uri.path(),
                "Failed to retrieve action items",
                err,
            ))
        }
    }
}

/// GET /actions/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    service_status(
        &state,
        "actions",
        &[
            "AI-generated action items",
            "Recommendation analysis",
            "Priority scoring",
            "Action categorization",
        ],
    )
    .await
}

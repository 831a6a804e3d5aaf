//! Key-insights routes.

use axum::extract::{OriginalUri, Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{map_ai_error, service_status, validate_report_id};
use crate::state::AppState;

/// GET /insights/:reportId
pub async fn get_insights(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    // Insights requires a longer identifier than the other routes
    validate_report_id(&report_id, 3)?;
    tracing::info!(report_id = %report_id, "Insights requested");

    match state.ai.get_insights().await {
        Ok(doc) => {
            state.notifier.analysis_success(&report_id, "Insights Analysis");
            let insights = doc.get("insights").cloned().unwrap_or(doc);
            Ok(Json(json!({ "insights": insights })))
        }
        Err(err) => {
            state
                .notifier
                .analysis_error(&report_id, "Insights Analysis", &err.to_string());
            Err(map_ai_error(
                &state,
                uri.path(),
                "Failed to retrieve insights",
                err,
            ))
        }
    }
}

/// GET /insights/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    service_status(
        &state,
        "insights",
        &[
            "AI-generated key insights",
            "Insight categorization",
        ],
    )
    .await
}

/// GET /insights/:reportId/categories
pub async fn categories(Path(report_id): Path<String>) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;

    let categories = json!([
        { "id": "general", "name": "General", "count": 2 },
        { "id": "location", "name": "Location", "count": 1 },
        { "id": "demographics", "name": "Demographics", "count": 1 },
        { "id": "trends", "name": "Trends", "count": 1 },
    ]);

    Ok(Json(json!({
        "success": true,
        "message": "Categories retrieved",
        "data": {
            "reportId": report_id,
            "categories": categories,
            "total": 4,
        }
    })))
}

//! Embedding-status routes.

use axum::extract::{OriginalUri, State};
use axum::Json;
use serde_json::{json, Value};

use reportiq_ai::EmbeddingSnapshot;

use crate::error::ApiError;
use crate::handlers::map_ai_error;
use crate::state::AppState;

/// GET /embedding-status
///
/// Computes the readiness predicate at the gateway (`ai_ready` from the
/// service OR status completed OR progress 100) and feeds the latch, so the
/// dashboard sees one authoritative `ai_ready` flag.
pub async fn embedding_status(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Value>, ApiError> {
    let doc = state
        .ai
        .get_status()
        .await
        .map_err(|err| map_ai_error(&state, uri.path(), "Failed to retrieve embedding status", err))?;

    let snapshot = EmbeddingSnapshot::from_value(&doc);
    state.gate.record(&snapshot);
    tracing::debug!(
        ai_ready = snapshot.is_ready(),
        status = ?snapshot.status,
        progress = ?snapshot.progress,
        "Embedding status computed"
    );

    let mut data = doc;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("ai_ready".to_string(), json!(snapshot.is_ready()));
    }

    Ok(Json(json!({
        "success": true,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

/// GET /embedding/status
///
/// Raw upstream status document, passed through verbatim.
pub async fn raw_status(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Value>, ApiError> {
    let doc = state
        .ai
        .get_status()
        .await
        .map_err(|err| map_ai_error(&state, uri.path(), "Failed to retrieve embedding status", err))?;
    Ok(Json(doc))
}

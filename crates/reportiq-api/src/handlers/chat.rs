//! AI chat routes, gated on embedding readiness.

use axum::extract::{OriginalUri, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use reportiq_ai::EmbeddingSnapshot;
use reportiq_core::defaults;

use crate::error::{field_problem, ApiError};
use crate::handlers::map_ai_error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_include_context", rename = "includeDataContext")]
    pub include_data_context: bool,
}

fn default_include_context() -> bool {
    true
}

/// POST /chat
///
/// When the readiness latch is closed, a fresh status document is fetched
/// before rejecting so a just-completed embedding run is not turned away on
/// stale state.
pub async fn chat(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut problems = Vec::new();
    if request.message.trim().is_empty() {
        problems.push(field_problem("message", "Message must not be empty"));
    } else if request.message.chars().count() > defaults::MAX_CHAT_MESSAGE_LEN {
        problems.push(field_problem(
            "message",
            "Message must be shorter than 1000 characters",
        ));
    }
    if !problems.is_empty() {
        return Err(ApiError::invalid_params(problems));
    }

    if !state.gate.is_ready() {
        if let Ok(doc) = state.ai.get_status().await {
            state.gate.record(&EmbeddingSnapshot::from_value(&doc));
        }
        if !state.gate.is_ready() {
            tracing::info!("Chat rejected, embeddings not ready");
            return Err(ApiError::unavailable(
                "AI is not ready",
                Some(json!("Report embeddings are still being processed")),
            ));
        }
    }

    tracing::info!(
        message_len = request.message.len(),
        include_data_context = request.include_data_context,
        "Chat request received"
    );

    match state
        .ai
        .chat(&request.message, request.include_data_context)
        .await
    {
        Ok(doc) => {
            state.notifier.chat_success(request.message.len());
            Ok(Json(json!({
                "success": true,
                "data": doc,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
        }
        Err(err) => {
            state.notifier.chat_error(&err.to_string());
            Err(map_ai_error(&state, uri.path(), "Chat request failed", err))
        }
    }
}

/// GET /chat/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let health = state.ai.check_health().await;
    Json(json!({
        "success": true,
        "data": {
            "chat_service": "active",
            "ai_service": health,
            "ai_ready": state.gate.is_ready(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    }))
}

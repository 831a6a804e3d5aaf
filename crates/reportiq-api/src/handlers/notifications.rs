//! Notification CRUD routes over the in-memory store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use reportiq_core::NotificationType;

use crate::error::{field_problem, ApiError};
use crate::handlers::envelope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub category: Option<String>,
}

/// GET /notifications?unread_only=true&limit=50
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> Json<Value> {
    let unread_only = params.unread_only.as_deref() == Some("true");
    let limit = params.limit.unwrap_or(50);
    let store = state.notifier.store();
    let notifications = store.list(unread_only, limit);
    let (unread, total) = store.counts();

    Json(envelope(json!({
        "notifications": notifications,
        "unread_count": unread,
        "total_count": total,
    })))
}

/// POST /notifications
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut problems = Vec::new();
    if request.title.is_empty() {
        problems.push(field_problem("title", "title is required"));
    }
    if request.message.is_empty() {
        problems.push(field_problem("message", "message is required"));
    }
    let kind = NotificationType::parse(&request.kind);
    if kind.is_none() {
        problems.push(field_problem(
            "type",
            "type must be one of: info, success, warning, error",
        ));
    }
    if !problems.is_empty() {
        return Err(ApiError::invalid_params(problems));
    }

    let created = state.notifier.store().push(
        kind.unwrap_or(NotificationType::Info),
        &request.title,
        &request.message,
        request.category.as_deref().unwrap_or("general"),
        Value::Null,
    );

    Ok((StatusCode::CREATED, Json(envelope(json!(created)))))
}

/// PUT /notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    match state.notifier.store().mark_read(id) {
        Some(notification) => Ok(Json(envelope(json!(notification)))),
        None => Err(ApiError::not_found(
            "Notification not found",
            Some(json!(format!("No notification with ID {id}"))),
        )),
    }
}

/// PUT /notifications/read-all
pub async fn mark_all_read(State(state): State<AppState>) -> Json<Value> {
    let updated = state.notifier.store().mark_all_read();
    Json(envelope(json!({
        "updated_count": updated,
        "message": format!("{updated} notifications marked as read"),
    })))
}

/// GET /notifications/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let (unread, total) = state.notifier.store().counts();
    Json(json!({
        "success": true,
        "service": "notifications",
        "status": "running",
        "capabilities": [
            "Event notification storage",
            "Read-state tracking",
            "Unread filtering",
        ],
        "counts": { "unread": unread, "total": total },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// DELETE /notifications/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    match state.notifier.store().delete(id) {
        Some(notification) => Ok(Json(envelope(json!({
            "deleted_notification": notification,
            "message": "Notification deleted",
        })))),
        None => Err(ApiError::not_found(
            "Notification not found",
            Some(json!(format!("No notification with ID {id}"))),
        )),
    }
}

//! Health, root descriptor, and the 404 fallback.

use axum::extract::{OriginalUri, State};
use axum::http::{Method, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Backend API gateway running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.uptime_secs(),
        "environment": state.config.environment(),
    }))
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "reportiq AI report-analysis gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "upload": "/api/upload",
            "summary": "/api/summary/:reportId",
            "kpi": "/api/kpi/:reportId",
            "trend": "/api/trend/:reportId",
            "query": "/api/query",
            "chat": "/api/chat",
            "settings": "/api/settings",
        }
    }))
}

/// Fallback for unmatched routes.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": format!("{} {} does not exist", method, uri.path()),
            "availableEndpoints": [
                "GET /health",
                "POST /api/upload",
                "GET /api/summary/:reportId",
                "GET /api/kpi/:reportId",
                "GET /api/trend/:reportId",
                "POST /api/query",
                "POST /api/chat",
                "GET /api/settings",
                "PUT /api/settings",
                "POST /api/settings/reset",
            ]
        })),
    )
}

//! HTTP handlers for the gateway routes.
//!
//! Each submodule covers one resource. Shared concerns live here: the
//! success envelope, parameter validation, and the mapping from upstream
//! AI failures to HTTP responses.

pub mod actions;
pub mod chat;
pub mod embedding;
pub mod insights;
pub mod kpi;
pub mod notifications;
pub mod query;
pub mod settings;
pub mod summary;
pub mod system;
pub mod trend;
pub mod upload;

use axum::Json;
use serde_json::{json, Value};

use reportiq_core::{defaults, Error};

use crate::error::{field_problem, ApiError};
use crate::state::AppState;

/// Wrap a payload in the standard success envelope.
pub fn envelope(data: Value) -> Value {
    json!({
        "success": true,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

/// Shared `GET .../status` payload: a static capability descriptor plus a
/// live AI health probe.
pub async fn service_status(state: &AppState, service: &str, capabilities: &[&str]) -> Json<Value> {
    let health = state.ai.check_health().await;
    Json(json!({
        "success": true,
        "service": service,
        "status": "running",
        "aiService": health,
        "capabilities": capabilities,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Validate a report identifier path parameter.
///
/// `min_len` varies by route (most accept 1 character, insights requires 3).
pub fn validate_report_id(report_id: &str, min_len: usize) -> Result<(), ApiError> {
    let mut problems = Vec::new();
    let chars = report_id.chars().count();
    if report_id.trim().is_empty() {
        problems.push(field_problem("reportId", "Report ID is required"));
    } else if chars < min_len || chars > defaults::MAX_REPORT_ID_LEN {
        problems.push(field_problem("reportId", "Invalid Report ID format"));
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ApiError::invalid_params(problems))
    }
}

/// Map an upstream AI failure to the HTTP surface.
///
/// Upstream 404s become "Report not found", no-response failures become 503,
/// other upstream statuses pass through with the route's fallback message.
/// Anything that renders as a 5xx also emits a deduplicated error
/// notification for the request path.
pub fn map_ai_error(state: &AppState, path: &str, fallback: &str, err: Error) -> ApiError {
    let api_err = match err {
        Error::Upstream { status: 404, message, details } => ApiError::not_found(
            "Report not found",
            Some(json!(details.unwrap_or(message))),
        ),
        Error::Upstream { status: 503, .. } | Error::Unavailable(_) => ApiError::unavailable(
            "AI service is currently unavailable",
            Some(json!("Please try again later")),
        ),
        Error::Upstream { status, message, details } => {
            let shown = if state.config.development {
                details.unwrap_or(message)
            } else {
                "Service error".to_string()
            };
            ApiError::Upstream {
                status,
                message: fallback.to_string(),
                details: Some(json!(shown)),
            }
        }
        other => {
            tracing::error!(path = %path, error = %other, "AI request failed");
            let shown = if state.config.development {
                other.to_string()
            } else {
                "Service error".to_string()
            };
            ApiError::Upstream {
                status: 500,
                message: fallback.to_string(),
                details: Some(json!(shown)),
            }
        }
    };

    if api_err.status().is_server_error() {
        state.notifier.server_error(path, fallback);
    }
    api_err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reportiq_ai::mock::MockAnalysisBackend;

    use crate::config::GatewayConfig;

    fn test_state(development: bool) -> AppState {
        let config = GatewayConfig {
            development,
            ..GatewayConfig::default()
        };
        AppState::new(config, Arc::new(MockAnalysisBackend::new()))
    }

    #[test]
    fn test_validate_report_id_bounds() {
        assert!(validate_report_id("r1", 1).is_ok());
        assert!(validate_report_id("", 1).is_err());
        assert!(validate_report_id("ab", 3).is_err());
        assert!(validate_report_id(&"x".repeat(101), 1).is_err());
    }

    #[test]
    fn test_validate_report_id_counts_characters_not_bytes() {
        // 60 characters, 120 bytes: within the 100-character bound
        assert!(validate_report_id(&"é".repeat(60), 1).is_ok());
        assert!(validate_report_id(&"é".repeat(101), 1).is_err());
    }

    #[test]
    fn test_map_upstream_404_becomes_report_not_found() {
        let state = test_state(true);
        let err = Error::Upstream {
            status: 404,
            message: "no report with that id".to_string(),
            details: None,
        };
        let api = map_ai_error(&state, "/api/summary/r1", "Failed to retrieve summary", err);
        assert_eq!(api.status().as_u16(), 404);
        match api {
            ApiError::NotFound { message, .. } => assert_eq!(message, "Report not found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_map_unavailable_becomes_503_and_notifies() {
        let state = test_state(true);
        let api = map_ai_error(
            &state,
            "/api/kpi/r1",
            "Failed to retrieve KPIs",
            Error::Unavailable("connection refused".to_string()),
        );
        assert_eq!(api.status().as_u16(), 503);
        let (_, total) = state.notifier.store().counts();
        // seed notification plus the server error
        assert_eq!(total, 2);
    }

    #[test]
    fn test_map_other_upstream_status_passes_through() {
        let state = test_state(true);
        let err = Error::Upstream {
            status: 422,
            message: "unreadable file".to_string(),
            details: None,
        };
        let api = map_ai_error(&state, "/api/query", "Query failed", err);
        assert_eq!(api.status().as_u16(), 422);
    }

    #[test]
    fn test_production_redacts_upstream_details() {
        let state = test_state(false);
        let err = Error::Upstream {
            status: 500,
            message: "stack trace here".to_string(),
            details: None,
        };
        match map_ai_error(&state, "/api/query", "Query failed", err) {
            ApiError::Upstream { details, .. } => {
                assert_eq!(details, Some(json!("Service error")));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}

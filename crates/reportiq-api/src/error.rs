//! Gateway-level error responses.
//!
//! Every failure leaves the gateway in the shared envelope
//! `{success: false, error: true, message, details?, timestamp}`. Upstream
//! error statuses pass through; internal faults always render a generic
//! message, the real cause goes to the log.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

/// API-facing error. Constructed by handlers, rendered by `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        message: String,
        details: Option<Value>,
    },
    NotFound {
        message: String,
        details: Option<Value>,
    },
    Unavailable {
        message: String,
        details: Option<Value>,
    },
    /// Upstream error status passed through verbatim.
    Upstream {
        status: u16,
        message: String,
        details: Option<Value>,
    },
    Internal {
        message: String,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, details: Option<Value>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Option<Value>) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Option<Value>) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Validation failure carrying a per-field details array.
    pub fn invalid_params(fields: Vec<Value>) -> Self {
        Self::BadRequest {
            message: "Invalid parameters".to_string(),
            details: Some(Value::Array(fields)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (message, details) = match self {
            Self::BadRequest { message, details }
            | Self::NotFound { message, details }
            | Self::Unavailable { message, details }
            | Self::Upstream {
                message, details, ..
            } => (message, details),
            Self::Internal { message } => {
                tracing::error!(error = %message, "Internal server error");
                ("Server error occurred".to_string(), None)
            }
        };

        let mut body = json!({
            "success": false,
            "error": true,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

/// One field problem entry (`path` + `msg`) for 400 details arrays.
pub fn field_problem(field: &str, message: &str) -> Value {
    json!({ "path": field, "msg": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("x", None).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("x", None).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::unavailable("x", None).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Upstream {
                status: 422,
                message: "x".to_string(),
                details: None
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_status_code_falls_back_to_500() {
        let err = ApiError::Upstream {
            status: 99,
            message: "x".to_string(),
            details: None,
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

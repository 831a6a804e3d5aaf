//! Error types for the reportiq gateway.

use thiserror::Error;

/// Result type alias using reportiq's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gateway operations.
///
/// Upstream failures are classified three ways, and that classification is
/// load-bearing for the HTTP surface:
/// - the AI service answered with an error status → [`Error::Upstream`],
///   status passed through;
/// - the request went out but no response came back (refused connection,
///   timeout) → [`Error::Unavailable`], surfaced as 503;
/// - anything else → [`Error::Internal`], surfaced as 500.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// AI service responded with an error status
    #[error("AI service error ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// AI service did not respond (network error or timeout)
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status code this error maps to at the gateway surface.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::InvalidInput(_) => 400,
            Error::Upstream { status, .. } => *status,
            Error::Unavailable(_) => 503,
            _ => 500,
        }
    }

    /// Detail text carried by upstream errors, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Error::Upstream { details, .. } => details.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("report r1".to_string());
        assert_eq!(err.to_string(), "Not found: report r1");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("query too short".to_string());
        assert_eq!(err.to_string(), "Invalid input: query too short");
    }

    #[test]
    fn test_error_display_upstream() {
        let err = Error::Upstream {
            status: 422,
            message: "bad payload".to_string(),
            details: None,
        };
        assert_eq!(err.to_string(), "AI service error (422): bad payload");
    }

    #[test]
    fn test_status_code_passthrough_for_upstream() {
        let err = Error::Upstream {
            status: 404,
            message: "no such report".to_string(),
            details: Some("r1".to_string()),
        };
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.details(), Some("r1"));
    }

    #[test]
    fn test_status_code_unavailable_is_503() {
        let err = Error::Unavailable("connection refused".to_string());
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_status_code_fallback_is_500() {
        assert_eq!(Error::Internal("boom".to_string()).status_code(), 500);
        assert_eq!(Error::Config("missing key".to_string()).status_code(), 500);
        assert_eq!(
            Error::Serialization("bad json".to_string()).status_code(),
            500
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}

//! API error types for the issue tracker client.

use thiserror::Error;

/// Errors that can occur when talking to the issues API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - missing, invalid or expired token.
    #[error("Authentication failed: your session token was rejected")]
    Unauthorized,

    /// Permission denied - the session lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// API server error.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// A write request was rejected by the server.
    ///
    /// `message` carries the server supplied explanation when the error body
    /// was JSON with a `message` field.
    #[error("Request rejected (HTTP {status}): {}", .message.as_deref().unwrap_or("no details"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// Keyring error when storing/retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// No session is available for an authenticated call.
    #[error("Not signed in")]
    NotSignedIn,
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// The server supplied rejection message, if this is a rejection that carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_from_status_401() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "test");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_error_from_status_403() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "test");
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn test_error_from_status_404() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "/api/issues");
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "/api/issues"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_error_from_status_429() {
        let err = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "test");
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn test_error_from_status_500() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "test");
        assert!(matches!(err, ApiError::ServerError(_)));
    }

    #[test]
    fn test_server_message_only_for_rejections() {
        let err = ApiError::Rejected {
            status: 400,
            message: Some("Title is too long".to_string()),
        };
        assert_eq!(err.server_message(), Some("Title is too long"));

        let err = ApiError::Rejected {
            status: 400,
            message: None,
        };
        assert_eq!(err.server_message(), None);
        assert_eq!(ApiError::Unauthorized.server_message(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("/api/issues".to_string());
        assert_eq!(err.to_string(), "Resource not found: /api/issues");

        let err = ApiError::Rejected {
            status: 422,
            message: Some("Title is required".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Request rejected (HTTP 422): Title is required"
        );
    }
}

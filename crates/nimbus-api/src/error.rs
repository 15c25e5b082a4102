//! Error types for control-plane calls.

use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while talking to the control plane.
///
/// The distinction between [`ApiError::NotFound`] and the other remote
/// failures is load-bearing: delete-confirmation flows treat a typed
/// not-found as success, and the task waiter treats it as "task not
/// reported yet". Callers must match on the variant, never on message text.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API rejected the credentials (401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The resource does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status, with the remote message verbatim.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the control plane.
        status: u16,
        /// Error message as reported by the control plane.
        message: String,
    },

    /// The response body could not be decoded as the expected type.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Client configuration is unusable (bad base URL, missing token).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Creates a not-found error for a resource path or ID.
    #[must_use]
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// True if this error is the typed 404 class.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ApiError::Auth("bad token".into());
        assert_eq!(err.to_string(), "authentication failed: bad token");

        let err = ApiError::Api {
            status: 409,
            message: "instance is locked".into(),
        };
        assert_eq!(err.to_string(), "API error (status 409): instance is locked");
    }

    #[test]
    fn not_found_helper_and_predicate() {
        let err = ApiError::not_found("instances/abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: instances/abc");

        let err = ApiError::Config("empty token".into());
        assert!(!err.is_not_found());
    }
}

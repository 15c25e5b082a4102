//! CLI error types.

use nimbus_api::{ApiError, ValidationErrors};
use thiserror::Error;

use crate::waiter::WaitError;

/// Errors surfaced by CLI commands.
///
/// Every variant is terminal to the current invocation: `main` prints the
/// message to stderr and exits non-zero. No stack traces.
#[derive(Debug, Error)]
pub enum CliError {
    /// Pre-flight request validation failed; never sent over the wire.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A control-plane call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The task wait phase failed.
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// A flag value was unusable beyond what clap can check.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_api::ValidationError;

    #[test]
    fn validation_errors_pass_through_display() {
        let err = CliError::from(ValidationErrors(vec![ValidationError::empty("flavor")]));
        let text = err.to_string();
        assert!(text.contains("request validation failed"));
        assert!(text.contains("'flavor'"));
    }

    #[test]
    fn invalid_argument_display() {
        let err = CliError::InvalidArgument("metadata entry 'abc' is not KEY=VALUE".into());
        assert_eq!(
            err.to_string(),
            "invalid argument: metadata entry 'abc' is not KEY=VALUE"
        );
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = CliError::from(io);
        assert!(matches!(err, CliError::Io(_)));
    }
}

//! Pre-flight request validation.
//!
//! Request option types validate themselves before dispatch. Validation
//! never stops at the first problem: every failing `(field, kind)` pair is
//! collected into a [`ValidationErrors`] so the user can fix a request in
//! one pass. Nothing in this module touches the network.

use std::fmt;

use thiserror::Error;

/// The kind of validation failure that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required value was empty or absent.
    Empty,
    /// A field is required because of the value of another field.
    Missing {
        /// Description of what makes the field required.
        required_for: String,
    },
    /// Two fields cannot be supplied together.
    Conflict {
        /// The field this one conflicts with.
        with: String,
    },
    /// Numeric value was out of the allowed range.
    OutOfRange {
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
        /// Actual value provided.
        actual: u64,
    },
    /// Value did not match the expected format.
    InvalidFormat {
        /// Expected format description.
        expected: String,
        /// What was actually provided.
        actual: String,
    },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "value cannot be empty"),
            Self::Missing { required_for } => {
                write!(f, "value is required {required_for}")
            }
            Self::Conflict { with } => {
                write!(f, "cannot be combined with '{with}'")
            }
            Self::OutOfRange { min, max, actual } => {
                write!(f, "value {actual} out of range [{min}, {max}]")
            }
            Self::InvalidFormat { expected, actual } => {
                write!(f, "invalid format: expected {expected}, got '{actual}'")
            }
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{field}': {kind}")]
pub struct ValidationError {
    /// The name of the field that failed validation.
    pub field: String,
    /// The kind of validation failure.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Create an "empty" validation error.
    #[must_use]
    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::Empty)
    }

    /// Create a "missing" validation error.
    #[must_use]
    pub fn missing(field: impl Into<String>, required_for: impl Into<String>) -> Self {
        Self::new(
            field,
            ValidationErrorKind::Missing {
                required_for: required_for.into(),
            },
        )
    }

    /// Create a "conflict" validation error.
    #[must_use]
    pub fn conflict(field: impl Into<String>, with: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::Conflict { with: with.into() })
    }

    /// Create an "out of range" validation error.
    #[must_use]
    pub fn out_of_range(field: impl Into<String>, min: u64, max: u64, actual: u64) -> Self {
        Self::new(field, ValidationErrorKind::OutOfRange { min, max, actual })
    }

    /// Create an "invalid format" validation error.
    #[must_use]
    pub fn invalid_format(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidFormat {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }
}

/// Every validation failure found in one request, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request validation failed:")?;
        for err in &self.0 {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    /// Number of failures collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no failures were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A builder that runs multiple checks and collects every failure.
///
/// # Example
///
/// ```
/// use nimbus_api::ValidationBuilder;
///
/// let result = ValidationBuilder::new()
///     .require_not_empty("flavor", "g1-small")
///     .finish();
///
/// assert!(result.is_ok());
/// ```
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<ValidationError>,
}

impl ValidationBuilder {
    /// Create a new validation builder.
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure directly.
    #[must_use]
    pub fn push(mut self, error: ValidationError) -> Self {
        self.errors.push(error);
        self
    }

    /// Require that a string value is non-empty.
    #[must_use]
    pub fn require_not_empty(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.errors.push(ValidationError::empty(field));
        }
        self
    }

    /// Require that `value` is present when `condition` holds.
    #[must_use]
    pub fn require_when(
        mut self,
        condition: bool,
        field: &str,
        value: &str,
        required_for: &str,
    ) -> Self {
        if condition && value.trim().is_empty() {
            self.errors
                .push(ValidationError::missing(field, required_for));
        }
        self
    }

    /// Record a conflict when both flags were supplied.
    #[must_use]
    pub fn forbid_together(mut self, both_set: bool, field: &str, with: &str) -> Self {
        if both_set {
            self.errors.push(ValidationError::conflict(field, with));
        }
        self
    }

    /// Require that a numeric value is within a range.
    #[must_use]
    pub fn require_in_range(mut self, field: &str, value: u64, min: u64, max: u64) -> Self {
        if value < min || value > max {
            self.errors
                .push(ValidationError::out_of_range(field, min, max, value));
        }
        self
    }

    /// Merge failures collected by a nested builder, prefixing field names.
    ///
    /// Used for indexed sub-options, e.g. `volumes[1].size`.
    #[must_use]
    pub fn nested(mut self, prefix: &str, result: Result<(), ValidationErrors>) -> Self {
        if let Err(errs) = result {
            for mut err in errs.0 {
                err.field = format!("{prefix}.{}", err.field);
                self.errors.push(err);
            }
        }
        self
    }

    /// Finish validation, returning all collected failures if any.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

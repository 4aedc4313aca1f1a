//! Domain error types for review records.
//!
//! Validation failures are raised at assignment time and carry the offending
//! field. Storage failures are passed through from SQLite untouched.

use std::fmt;
use thiserror::Error;

use super::review::ReviewId;

/// Fields of a review that are subject to write-time validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Year,
    Summary,
    EmployeeId,
}

impl fmt::Display for ReviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewField::Year => "year",
            ReviewField::Summary => "summary",
            ReviewField::EmployeeId => "employee_id",
        };
        f.write_str(name)
    }
}

/// A field value was rejected by its business rule.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: ReviewField, reason: String },

    /// The employee lookup itself failed, so existence could not be decided.
    #[error("Employee lookup failed: {0}")]
    Lookup(#[from] anyhow::Error),
}

impl ValidationError {
    pub fn invalid(field: ReviewField, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Field that failed validation, if the failure was a rule violation.
    pub fn field(&self) -> Option<ReviewField> {
        match self {
            ValidationError::InvalidField { field, .. } => Some(*field),
            ValidationError::Lookup(_) => None,
        }
    }
}

/// Errors raised by review persistence operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Review not found: {0}")]
    NotFound(String),

    #[error("Review has not been saved yet")]
    NotPersisted,

    #[error("Review {0} is already saved")]
    AlreadyPersisted(ReviewId),

    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ReviewError {
    /// True when the error is a field rule violation.
    pub fn is_invalid_field(&self) -> bool {
        matches!(
            self,
            ReviewError::Validation(ValidationError::InvalidField { .. })
        )
    }
}

//! The module contains the errors the engine can throw.
//!
//! The taxonomy is deliberately small:
//!
//! - [`Validation`] reports malformed or inconsistent input, with one
//!   [`Violation`] per offending field; the caller can always recover by
//!   correcting the input.
//! - [`NotFound`] covers an entry that is absent *or* owned by someone
//!   else; the two cases are never distinguished, so existence does not
//!   leak.
//! - [`Conflict`] means the operation would break an invariant
//!   (overpayment, a stale version after retries, a double
//!   materialization).
//! - [`Storage`] wraps an underlying database failure; retryable by the
//!   caller.
//!
//! [`Validation`]: EngineError::Validation
//! [`NotFound`]: EngineError::NotFound
//! [`Conflict`]: EngineError::Conflict
//! [`Storage`]: EngineError::Storage

use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(#[from] DbErr),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![Violation::new(field, message)])
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

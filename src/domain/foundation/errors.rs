//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    NotFound,
    Conflict,
    InvalidState,
    TransientStorage,
    SystemicPrecondition,
    DatabaseError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::TransientStorage => "TRANSIENT_STORAGE",
            ErrorCode::SystemicPrecondition => "SYSTEMIC_PRECONDITION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error shared by ports and handlers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Malformed input, rejected before it reaches the mapping set.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced tender, position or mapping does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Exclusivity on a new position would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation is not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage hiccup that may succeed on retry.
    #[error("Transient storage failure: {0}")]
    TransientStorage(String),

    /// A precondition for a bulk operation does not hold; nothing was written.
    #[error("Precondition failed: {0}")]
    SystemicPrecondition(String),

    /// Non-retryable storage failure.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        DomainError::InvalidState(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        DomainError::TransientStorage(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        DomainError::SystemicPrecondition(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Storage(message.into())
    }

    /// Returns the stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(_) => ErrorCode::ValidationFailed,
            DomainError::NotFound { .. } => ErrorCode::NotFound,
            DomainError::Conflict(_) => ErrorCode::Conflict,
            DomainError::InvalidState(_) => ErrorCode::InvalidState,
            DomainError::TransientStorage(_) => ErrorCode::TransientStorage,
            DomainError::SystemicPrecondition(_) => ErrorCode::SystemicPrecondition,
            DomainError::Storage(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::TransientStorage(_))
    }
}

//! Error types for the domain layer.

use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
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
    // Validation errors
    ValidationFailed,
    MalformedInput,

    // Not found errors: a selector referencing data that vanished
    // from a cache after a refresh
    CategoryNotFound,
    ItemNotFound,
    DestinationNotFound,
    SessionNotFound,

    // State errors
    InvalidStateTransition,

    // Infrastructure errors
    UpstreamUnavailable,
    TransportError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::MalformedInput => "MALFORMED_INPUT",
            ErrorCode::CategoryNotFound => "CATEGORY_NOT_FOUND",
            ErrorCode::ItemNotFound => "ITEM_NOT_FOUND",
            ErrorCode::DestinationNotFound => "DESTINATION_NOT_FOUND",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code and message.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A category index with no corresponding cached category.
    pub fn category_not_found(index: usize) -> Self {
        Self::new(
            ErrorCode::CategoryNotFound,
            format!("No category at index {}", index),
        )
    }

    /// An item code absent from the selected category.
    pub fn item_not_found(code: u32) -> Self {
        Self::new(ErrorCode::ItemNotFound, format!("No item with code {}", code))
    }

    /// A destination fingerprint absent from the current directory.
    pub fn destination_not_found(fingerprint: &str) -> Self {
        Self::new(
            ErrorCode::DestinationNotFound,
            format!("No destination with fingerprint {}", fingerprint),
        )
    }

    /// A remote store or transport call that failed.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message)
    }

    /// Whether this error is a stale-selector miss, recoverable by
    /// re-rendering the nearest valid menu.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::CategoryNotFound
                | ErrorCode::ItemNotFound
                | ErrorCode::DestinationNotFound
                | ErrorCode::SessionNotFound
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("destination");
        assert_eq!(format!("{}", err), "Field 'destination' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("deadline", "expected D.MM");
        assert_eq!(
            format!("{}", err),
            "Field 'deadline' has invalid format: expected D.MM"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::category_not_found(7);
        assert_eq!(format!("{}", err), "[CATEGORY_NOT_FOUND] No category at index 7");
    }

    #[test]
    fn not_found_predicate_matches_stale_selector_codes() {
        assert!(DomainError::item_not_found(101).is_not_found());
        assert!(DomainError::destination_not_found("abcd").is_not_found());
        assert!(!DomainError::upstream("timeout").is_not_found());
    }

    #[test]
    fn validation_error_converts_to_domain_error() {
        let err: DomainError = ValidationError::empty_field("comment").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}

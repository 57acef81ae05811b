//! # Error Types
//!
//! Domain-specific error types for givehub-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  givehub-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  givehub-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, status)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent the full failure taxonomy of the system:
/// every operation fails into exactly one of these classes, and the
/// API layer maps each class to one HTTP status.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A resource id did not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// No identity could be resolved for an operation that requires one.
    #[error("Authentication required")]
    Unauthenticated,

    /// A resolved identity lacks the required relationship or role.
    ///
    /// ## When This Occurs
    /// - Non-owner mutating a listing
    /// - Non-participant reading a transaction
    /// - Non-admin calling an admin operation
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The operation is not legal for the resource's current status.
    ///
    /// ## When This Occurs
    /// - Requesting a donation that is not `approved`
    /// - Updating a `sold` item as a non-admin
    /// - Rating a transaction that is not `completed`
    #[error("{entity} is {current}, cannot {attempted}")]
    InvalidState {
        entity: String,
        current: String,
        attempted: String,
    },

    /// A concurrent writer won a race this caller lost.
    ///
    /// ## When This Occurs
    /// - Two users request the same donation; the second gets Conflict
    /// - A rating is submitted twice for the same side
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A downstream collaborator (store, mailer) is unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: impl Into<String>,
        current: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        CoreError::InvalidState {
            entity: entity.into(),
            current: current.into(),
            attempted: attempted.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate email).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::invalid_state("Donation", "pending", "request");
        assert_eq!(err.to_string(), "Donation is pending, cannot request");

        let err = CoreError::not_found("Item", "abc-123");
        assert_eq!(err.to_string(), "Item not found: abc-123");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Error Types
//!
//! Validation error types for basil-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  basil-core errors (this file)                                         │
//! │  └── ValidationError  - Field-level workflow definition failures       │
//! │                                                                         │
//! │  basil-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: Vec<ValidationError> → form-field errors in the settings UI     │
//! │        DbError             → API error → generic retry-later message   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every error names the field it applies to, as a path into the
//!    submitted definition (e.g. `steps[2].conditions[0].min_amount_cents`)
//! 3. Errors are enum variants, never String
//! 4. Validation returns ALL errors at once, so the whole form can be
//!    annotated in a single round trip

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A single field-level violation in a submitted workflow definition.
///
/// Validation collects these into a `Vec<ValidationError>`; each maps 1:1
/// onto a form field via [`ValidationError::field`].
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two steps sharing a step number).
    #[error("{field} '{value}' is already used")]
    Duplicate { field: String, value: String },

    /// A collection that must have at least one entry is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// An amount-range condition with neither bound set.
    #[error("{field} must set at least one of min_amount_cents and max_amount_cents")]
    MissingBounds { field: String },
}

impl ValidationError {
    /// Returns the path of the field this error applies to.
    ///
    /// ## Example
    /// ```rust
    /// use basil_core::error::ValidationError;
    ///
    /// let err = ValidationError::Required { field: "steps[0].name".to_string() };
    /// assert_eq!(err.field(), "steps[0].name");
    /// ```
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::Empty { field }
            | ValidationError::MissingBounds { field } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for validation outcomes carrying every violation.
pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

// =============================================================================
// Unit Tests
// =============================================================================

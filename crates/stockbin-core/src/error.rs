//! # Error Types
//!
//! Validation error types for stockbin-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbin-core errors (this file)                                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbin-ledger errors (separate crate)                               │
//! │  └── LedgerError      - Database operation failures                    │
//! │                                                                         │
//! │  stockbin-engine errors (separate crate)                               │
//! │  └── EngineError      - Whole-call failures (upstream query failed)    │
//! │                                                                         │
//! │  Flow: ValidationError → skipped row; LedgerError → EngineError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note the asymmetry: a validation failure never fails an allocation call.
//! The offending row is skipped and assigned an empty outcome. Only upstream
//! query failures abort the whole call, because candidate ranking cannot be
//! trusted when the source query failed.

use thiserror::Error;

/// Input validation errors.
///
/// These errors occur when a request row doesn't meet requirements.
/// Used by the engine's gate to decide which rows bypass allocation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not a finite number (NaN or infinity).
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Required {
            field: "item_code".to_string(),
        };
        assert_eq!(err.to_string(), "item_code is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::TooLong {
            field: "warehouse".to_string(),
            max: 140,
        };
        assert_eq!(err.to_string(), "warehouse must be at most 140 characters");
    }
}

//! # Validation Module
//!
//! Input validation for allocation requests.
//!
//! ## Validation Strategy
//! A row that fails validation is never fatal to the whole call: the
//! engine's gate skips it and assigns an empty outcome (see the grouping
//! module). These functions exist so that callers who want an eager
//! error - a form validating one field at a time, say - get the same
//! rules the gate applies.

use crate::error::{ValidationError, ValidationResult};
use crate::MAX_IDENTIFIER_LEN;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an item code.
///
/// ## Rules
/// - Must not be empty or whitespace-only
/// - Must be at most [`MAX_IDENTIFIER_LEN`] characters
///
/// ## Example
/// ```rust
/// use stockbin_core::validation::validate_item_code;
///
/// assert!(validate_item_code("WIDGET-42").is_ok());
/// assert!(validate_item_code("").is_err());
/// ```
pub fn validate_item_code(item_code: &str) -> ValidationResult<()> {
    validate_identifier("item_code", item_code)
}

/// Validates a warehouse name.
///
/// Same rules as [`validate_item_code`].
pub fn validate_warehouse(warehouse: &str) -> ValidationResult<()> {
    validate_identifier("warehouse", warehouse)
}

fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_IDENTIFIER_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Quantity Validator
// =============================================================================

/// Validates a requested quantity.
///
/// ## Rules
/// - Must be a finite number (NaN and infinities are rejected - they
///   would poison every comparison in the cursor walk)
/// - Must be positive (> 0). Zero and negative rows are no-ops.
pub fn validate_quantity(quantity: f64) -> ValidationResult<()> {
    if !quantity.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "quantity".to_string(),
        });
    }

    if quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

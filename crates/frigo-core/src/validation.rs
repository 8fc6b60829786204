//! # Validation Module
//!
//! Input validation for catalog, customer, order and linking data.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Front end                                                     │
//! │  ├── Form-level checks, quantity clamping                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names, units, prices, visit days, linking codes                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine rules (inventory, sales)                              │
//! │  └── Existence checks, stock, transitions, credit limit                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine re-validates what the front end already clamps: returned
//! quantities, visit days and linking codes arrive from other devices too.

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Shortest linking code accepted when joining an existing dataset.
pub const LINKING_CODE_MIN_LEN: usize = 4;

/// Length of generated linking codes, and the longest accepted.
pub const LINKING_CODE_MAX_LEN: usize = 6;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name (product, category, business).
///
/// ## Example
/// ```rust
/// use frigo_core::validation::validate_name;
///
/// assert!(validate_name("name", "Dedito de Queso x 20").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a batch code ("LOTE-001", "IMP-1717000000000").
pub fn validate_batch_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "batchCode".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "batchCode".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Normalizes and validates a linking code.
///
/// ## Rules
/// - Surrounding whitespace is ignored, letters are uppercased
/// - 4 to 6 characters
/// - ASCII letters and digits only
///
/// ## Returns
/// The normalized code.
///
/// ## Example
/// ```rust
/// use frigo_core::validation::normalize_linking_code;
///
/// assert_eq!(normalize_linking_code(" ab12cd ").unwrap(), "AB12CD");
/// assert!(normalize_linking_code("AB1").is_err());
/// assert!(normalize_linking_code("AB-12").is_err());
/// ```
pub fn normalize_linking_code(code: &str) -> ValidationResult<String> {
    let code = code.trim().to_uppercase();

    if code.len() < LINKING_CODE_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "linkingCode".to_string(),
            min: LINKING_CODE_MIN_LEN,
        });
    }

    if code.len() > LINKING_CODE_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "linkingCode".to_string(),
            max: LINKING_CODE_MAX_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "linkingCode".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(code)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or batch quantity: 1 to [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a price, fee or limit: not negative and at most [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if amount.pesos() > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

/// Validates a route visit day, 1 (Monday) to 7 (Sunday).
pub fn validate_visit_day(day: u8) -> ValidationResult<()> {
    if !(1..=7).contains(&day) {
        return Err(ValidationError::OutOfRange {
            field: "visitDay".to_string(),
            min: 1,
            max: 7,
        });
    }
    Ok(())
}

/// Validates a non-negative count (min stock, shelf life).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("businessName", "Restaurante El Paisa").is_ok());
        assert!(matches!(
            validate_name("businessName", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_linking_code_rules() {
        assert_eq!(normalize_linking_code("k7p2").unwrap(), "K7P2");
        assert_eq!(normalize_linking_code("  XY99ZZ").unwrap(), "XY99ZZ");
        assert!(matches!(
            normalize_linking_code("abc"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            normalize_linking_code("ABCDEFG"),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            normalize_linking_code("AB CD"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -3).is_err());
        assert!(validate_quantity("quantity", MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_visit_day() {
        assert!(validate_visit_day(1).is_ok());
        assert!(validate_visit_day(7).is_ok());
        assert!(validate_visit_day(0).is_err());
        assert!(validate_visit_day(8).is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_amount("salePrice", Money::zero()).is_ok());
        assert!(validate_amount("salePrice", Money::from_pesos(-1)).is_err());
        assert!(validate_amount("salePrice", Money::from_pesos(MAX_AMOUNT)).is_ok());
        assert!(matches!(
            validate_amount("salePrice", Money::from_pesos(MAX_AMOUNT + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_non_negative("minStock", 0).is_ok());
        assert!(validate_non_negative("minStock", -1).is_err());
    }
}

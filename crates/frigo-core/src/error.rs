//! # Error Types
//!
//! Domain-specific error types for frigo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  frigo-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  frigo-db errors                                                       │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  frigo-sync errors                                                     │
//! │  └── SyncError        - Replication failures (never blocking)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every engine operation either returns `Ok` with all of its mutations
//! applied or an error with none of them persisted.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity referenced by id does not exist.
    ///
    /// `entity` is one of `Customer`, `Sale`, `SaleDetail`, `Product`,
    /// `Batch` or `Category`.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// FEFO allocation found no single Available batch holding the
    /// requested quantity, or a batch no longer holds what a sale needs.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to order (qty: 20)
    ///      │
    ///      ▼
    /// allocate_fefo: best single batch holds 12
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "p3", available: 12, requested: 20 }
    ///      │
    ///      ▼
    /// UI shows: "No batch in date holds 20 units"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A quantity is out of bounds (zero, negative, or more than was sold).
    #[error("Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: i64, reason: String },

    /// A status change that the transition table does not allow.
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// A credit sale would push the customer over their credit limit.
    #[error("Credit limit exceeded for {customer_id}: limit {limit}, balance {balance}, sale {requested}")]
    CreditLimitExceeded {
        customer_id: String,
        limit: Money,
        balance: Money,
        requested: Money,
    },

    /// Restoring stock would push a batch above its initial quantity.
    ///
    /// This points at a data-integrity problem (a mis-keyed return or a
    /// replicated overwrite), so it is surfaced instead of clamped away.
    #[error("Batch {batch_id} would hold {attempted} units, above its initial {initial_qty}")]
    StockOverflow {
        batch_id: String,
        initial_qty: i64,
        attempted: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidQuantity error.
    pub fn invalid_quantity(quantity: i64, reason: impl Into<String>) -> Self {
        CoreError::InvalidQuantity {
            quantity,
            reason: reason.into(),
        }
    }

    /// Creates an InvalidTransition error from two displayable states.
    pub fn invalid_transition(
        entity: impl Into<String>,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        CoreError::InvalidTransition {
            entity: entity.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns true for the NotFound family.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., a linking code with symbols).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two categories with the same name).
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

//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Reconciliation rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  └── DbError          - Lookups, locks, storage failures               │
//! │                         (wraps CoreError transparently)                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → API layer               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the failing entity id in every message
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reconciliation rule violations.
///
/// Raised by the pure rules in this crate and surfaced unchanged by the
/// database layer, which rolls back the unit of work that produced them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A decrement would drive a stock row below zero.
    ///
    /// ## When This Occurs
    /// - Consumer order demand still exceeds stock after replenishment
    /// - Reversing a supplier receipt whose units were already consumed
    ///
    /// ```text
    /// Stock { quantity: 5 }
    ///      │
    ///      ▼
    /// adjust(-8)
    ///      │
    ///      ▼
    /// InsufficientStock { stock_id, available: 5, requested: 8 }
    /// ```
    #[error("Insufficient stock in {stock_id}: available {available}, requested {requested}")]
    InsufficientStock {
        stock_id: String,
        available: i64,
        requested: i64,
    },

    /// A shortfall needs a compensating supplier order but the product has
    /// no linked supplier to place it with.
    #[error("No supplier linked to product {product_id} for replenishment")]
    NoReplenishmentSource { product_id: String },

    /// A transaction names a party that does not own the order it settles.
    #[error("Order {order_id} does not belong to {party} {party_id}")]
    PartyMismatch {
        party: &'static str,
        party_id: String,
        order_id: String,
    },

    /// A supplier order targets a stock row of a different product.
    #[error("Stock {stock_id} does not hold product {product_id}")]
    StockProductMismatch {
        stock_id: String,
        product_id: String,
    },

    /// Quantity × unit price does not fit in the money representation.
    #[error("Amount overflow: {quantity} × {unit_price_cents} cents")]
    AmountOverflow {
        quantity: i64,
        unit_price_cents: i64,
    },

    /// A receipt would push a stock quantity past `i64::MAX`.
    #[error("Stock {stock_id} overflow: {quantity} + {delta}")]
    StockOverflow {
        stock_id: String,
        quantity: i64,
        delta: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Detected before any mutation, so a failing check never leaves state behind.
#[derive(Debug, Error)]
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

    /// Invalid format (contact number, email, decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
        let err = CoreError::InsufficientStock {
            stock_id: "stk-1".to_string(),
            available: 5,
            requested: 8,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock in stk-1: available 5, requested 8"
        );

        let err = CoreError::NoReplenishmentSource {
            product_id: "prd-9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No supplier linked to product prd-9 for replenishment"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected local@domain.tld".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "email has invalid format: expected local@domain.tld"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

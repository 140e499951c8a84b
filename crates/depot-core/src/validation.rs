//! # Validation Module
//!
//! Input validation for catalog writes and order inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer (outside this workspace)                           │
//! │  └── Deserialization into NewProduct / PartyDraft / NewConsumerOrder   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── contact / email format                                            │
//! │  └── names, quantities, prices                                         │
//! │           │  (runs before any write: failure = no side effects)        │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (quantity >= 0)                                  │
//! │  └── UNIQUE + foreign key constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::validation::{validate_contact, validate_email};
//!
//! assert!(validate_contact("+918765456789").is_ok());
//! assert!(validate_email("orders@vetri.in").is_ok());
//! assert!(validate_email("orders@vetri").is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Contact Details
// =============================================================================

/// Validates a contact number: an optional leading `+` followed by one or
/// more digits, nothing else.
///
/// ```rust
/// use depot_core::validation::validate_contact;
///
/// assert!(validate_contact("8765456789").is_ok());
/// assert!(validate_contact("+44").is_ok());
/// assert!(validate_contact("+").is_err());
/// assert!(validate_contact("876 545").is_err());
/// ```
pub fn validate_contact(contact: &str) -> ValidationResult<()> {
    let digits = contact.strip_prefix('+').unwrap_or(contact);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "contact".to_string(),
            reason: "expected an optional '+' followed by digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address of the form `local@domain.tld`.
///
/// ## Rules
/// - Exactly one `@`
/// - Local part: letters, digits, `.`, `_`, `%`, `+`, `-`
/// - Domain: one or more non-empty labels of letters, digits, `-`
/// - Top-level domain: at least two letters
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "expected local@domain.tld".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
    if !local_ok {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;

    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let host_ok = host.split('.').all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !host_ok {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a field is present (non-blank).
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a display name: required, at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_required(field, name)?;

    if name.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order quantity (must be > 0).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock quantity or threshold (must be >= 0).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a unit price in cents (zero allowed).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_non_negative("unit_price", cents)
}

// =============================================================================
// Unit Tests
// =============================================================================

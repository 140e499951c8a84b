//! # depot-core: Pure Reconciliation Logic for Depot
//!
//! This crate holds every rule of the inventory engine that can be expressed
//! without touching storage: how order totals are derived, when a consumer
//! order needs a compensating supplier order, how signed stock deltas apply,
//! and which contact/email strings are acceptable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              API layer (outside this workspace)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                depot-db (units of work)                         │   │
//! │  │    OrderCascade, TransactionRecorder, repositories             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls pure rules                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ reconcile │  │ validation│  │   │
//! │  │   │  Stock    │  │   Money   │  │ shortfall │  │  contact  │  │   │
//! │  │   │  Orders   │  │  totals   │  │  deltas   │  │  email    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Stock, orders, transactions, parties)
//! - [`money`] - Fixed-point money with integer arithmetic
//! - [`reconcile`] - Replenishment and quantity-change rules
//! - [`validation`] - Input validation (contact, email, quantities)
//! - [`clock`] - Time source abstraction
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::money::Money;
//! use depot_core::reconcile::replenishment_shortfall;
//!
//! let unit_price: Money = "12.50".parse().unwrap();
//! assert_eq!(unit_price.multiply_quantity(4).cents(), 5000);
//!
//! // 8 requested against 5 on hand (threshold 3): order 3 more
//! assert_eq!(replenishment_shortfall(8, 5, 3), Some(3));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a name (product, supplier, consumer).
///
/// Matches the `String(255)` columns of the catalog.
pub const MAX_NAME_LEN: usize = 255;

/// Location used when a stock row is created without one.
pub const DEFAULT_LOCATION: &str = "main";

//! # Domain Types
//!
//! Core domain types used throughout Depot.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │   Supplier ──┐                                   ┌── Consumer           │
//! │              │                                   │                      │
//! │              ▼                                   ▼                      │
//! │        SupplierOrder ◄── consumer_order_id ── ConsumerOrder             │
//! │         │  │  (compensating back-reference)      │  │                   │
//! │         │  └──────────► Stock ◄──────────────────┘  │                   │
//! │         │               │                           │                   │
//! │         │               ▼                           │                   │
//! │         │            Product                        │                   │
//! │         ▼                                           ▼                   │
//! │   SupplierTransaction                     ConsumerTransaction           │
//! │   amount = order.total                    amount = order.total          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity has a UUID v4 `id` (string) used for all relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{
    validate_contact, validate_email, validate_name, validate_non_negative,
    validate_price_cents, validate_quantity, validate_required, ValidationResult,
};

// =============================================================================
// Product
// =============================================================================

/// A product that can be stocked, bought from suppliers and sold to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,

    /// Unit price in cents. Changing it never rewrites stored order totals.
    pub unit_price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `quantity × unit_price`, the only way an order total is produced.
    pub fn total_for(&self, quantity: i64) -> CoreResult<Money> {
        self.unit_price()
            .checked_multiply_quantity(quantity)
            .ok_or(CoreError::AmountOverflow {
                quantity,
                unit_price_cents: self.unit_price_cents,
            })
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Money,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_price_cents(self.unit_price.cents())
    }
}

/// Partial update of a product. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Money>,
}

impl ProductPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(price) = self.unit_price {
            validate_price_cents(price.cents())?;
        }
        Ok(())
    }
}

// =============================================================================
// Parties
// =============================================================================

/// Which side of the marketplace a party is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Supplier,
    Consumer,
}

impl PartyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Supplier => "Supplier",
            PartyKind::Consumer => "Consumer",
        }
    }
}

/// Contact details shared by suppliers and consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PartyDraft {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub email: String,
}

impl PartyDraft {
    /// Runs every field check; the first failure wins.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_required("address", &self.address)?;
        validate_contact(&self.contact)?;
        validate_email(&self.email)
    }
}

/// Partial update of a party. Present fields go through the same checks as a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PartyPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
}

impl PartyPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(address) = &self.address {
            validate_required("address", address)?;
        }
        if let Some(contact) = &self.contact {
            validate_contact(contact)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Capability shared by [`Supplier`] and [`Consumer`].
///
/// Catalog code is written once against this trait; each variant keeps its
/// own relationships (supplier orders vs. consumer orders) in its own table.
pub trait Party: Sized {
    const KIND: PartyKind;

    fn from_draft(id: String, draft: PartyDraft, now: DateTime<Utc>) -> Self;

    fn id(&self) -> &str;

    fn details(&self) -> PartyDraft;

    /// Applies a (validated) patch in place and bumps `updated_at`.
    fn apply_patch(&mut self, patch: PartyPatch, now: DateTime<Utc>);
}

macro_rules! party_entity {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
        #[ts(export)]
        pub struct $name {
            pub id: String,
            pub name: String,
            pub address: String,
            pub contact: String,
            pub email: String,
            #[ts(as = "String")]
            pub created_at: DateTime<Utc>,
            #[ts(as = "String")]
            pub updated_at: DateTime<Utc>,
        }

        impl Party for $name {
            const KIND: PartyKind = $kind;

            fn from_draft(id: String, draft: PartyDraft, now: DateTime<Utc>) -> Self {
                $name {
                    id,
                    name: draft.name.trim().to_string(),
                    address: draft.address.trim().to_string(),
                    contact: draft.contact.trim().to_string(),
                    email: draft.email.trim().to_string(),
                    created_at: now,
                    updated_at: now,
                }
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn details(&self) -> PartyDraft {
                PartyDraft {
                    name: self.name.clone(),
                    address: self.address.clone(),
                    contact: self.contact.clone(),
                    email: self.email.clone(),
                }
            }

            fn apply_patch(&mut self, patch: PartyPatch, now: DateTime<Utc>) {
                if let Some(name) = patch.name {
                    self.name = name.trim().to_string();
                }
                if let Some(address) = patch.address {
                    self.address = address.trim().to_string();
                }
                if let Some(contact) = patch.contact {
                    self.contact = contact.trim().to_string();
                }
                if let Some(email) = patch.email {
                    self.email = email.trim().to_string();
                }
                self.updated_at = now;
            }
        }
    };
}

party_entity!(
    /// A party that replenishes stock.
    Supplier,
    PartyKind::Supplier
);

party_entity!(
    /// A party that depletes stock.
    Consumer,
    PartyKind::Consumer
);

// =============================================================================
// Stock
// =============================================================================

/// On-hand quantity of one product at one location.
///
/// The single source of truth for quantity. Only the order cascade moves
/// `quantity`, always through signed deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Stock {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub location: String,

    /// At or below this level any new demand triggers replenishment.
    pub threshold: i64,

    /// Incremented on every write; guards ledger updates.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// Quantity after applying `delta`.
    ///
    /// Fails `InsufficientStock` if the result would go negative and
    /// `StockOverflow` if it would not fit in an `i64`.
    ///
    /// ```rust
    /// # use depot_core::Stock;
    /// # use chrono::Utc;
    /// # let now = Utc::now();
    /// let stock = Stock {
    ///     id: "s".into(), product_id: "p".into(), quantity: 5,
    ///     location: "main".into(), threshold: 3, version: 0,
    ///     created_at: now, updated_at: now,
    /// };
    /// assert_eq!(stock.apply_delta(3).unwrap(), 8);
    /// assert!(stock.apply_delta(-6).is_err());
    /// ```
    pub fn apply_delta(&self, delta: i64) -> CoreResult<i64> {
        match self.quantity.checked_add(delta) {
            Some(next) if next >= 0 => Ok(next),
            // Quantities are never negative, so only a receipt can overflow.
            None if delta > 0 => Err(CoreError::StockOverflow {
                stock_id: self.id.clone(),
                quantity: self.quantity,
                delta,
            }),
            _ => Err(CoreError::InsufficientStock {
                stock_id: self.id.clone(),
                available: self.quantity,
                requested: delta.saturating_neg(),
            }),
        }
    }

    #[inline]
    pub fn is_at_or_below_threshold(&self) -> bool {
        self.quantity <= self.threshold
    }
}

/// Input for opening a stock row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStock {
    pub product_id: String,
    pub quantity: i64,
    pub location: String,
    pub threshold: i64,
}

impl NewStock {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_non_negative("quantity", self.quantity)?;
        validate_non_negative("threshold", self.threshold)?;
        validate_required("location", &self.location)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A purchase from a supplier. Creating one is an instantaneous stock receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierOrder {
    pub id: String,
    pub supplier_id: String,
    pub product_id: String,
    pub stock_id: String,

    /// Set when the order was spawned to cover a consumer order's shortfall.
    pub consumer_order_id: Option<String>,

    pub quantity: i64,
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SupplierOrder {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    #[inline]
    pub fn is_compensating(&self) -> bool {
        self.consumer_order_id.is_some()
    }
}

/// A sale to a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ConsumerOrder {
    pub id: String,
    pub consumer_id: String,
    pub product_id: String,

    /// Stock row the order drew from; updates and deletes settle against it.
    pub stock_id: String,

    pub quantity: i64,
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ConsumerOrder {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// Input for a supplier order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplierOrder {
    pub supplier_id: String,
    pub product_id: String,
    pub stock_id: String,
    pub quantity: i64,
    /// Defaults to the engine clock.
    #[ts(as = "Option<String>")]
    pub order_date: Option<DateTime<Utc>>,
}

impl NewSupplierOrder {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_quantity(self.quantity)
    }
}

/// Input for a consumer order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewConsumerOrder {
    pub consumer_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to the engine clock.
    #[ts(as = "Option<String>")]
    pub order_date: Option<DateTime<Utc>>,
}

impl NewConsumerOrder {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_quantity(self.quantity)
    }
}

/// Update of either kind of order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderUpdate {
    pub quantity: Option<i64>,
    #[ts(as = "Option<String>")]
    pub order_date: Option<DateTime<Utc>>,
}

impl OrderUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        match self.quantity {
            Some(qty) => validate_quantity(qty),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Settlement of a supplier order. `amount_cents` is copied from the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierTransaction {
    pub id: String,
    pub supplier_id: String,
    pub order_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SupplierTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Settlement of a consumer order. `amount_cents` is copied from the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ConsumerTransaction {
    pub id: String,
    pub consumer_id: String,
    pub order_id: String,
    pub stock_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ConsumerTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(quantity: i64, threshold: i64) -> Stock {
        let now = Utc::now();
        Stock {
            id: "stk-1".to_string(),
            product_id: "prd-1".to_string(),
            quantity,
            location: "main".to_string(),
            threshold,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn draft() -> PartyDraft {
        PartyDraft {
            name: "  Vetri Traders ".to_string(),
            address: "Chennai".to_string(),
            contact: "+918765456789".to_string(),
            email: "orders@vetri.in".to_string(),
        }
    }

    #[test]
    fn test_stock_delta_bounds() {
        let s = stock(5, 3);
        assert_eq!(s.apply_delta(0).unwrap(), 5);
        assert_eq!(s.apply_delta(-5).unwrap(), 0);
        match s.apply_delta(-6) {
            Err(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        match s.apply_delta(i64::MAX) {
            Err(CoreError::StockOverflow { quantity, delta, .. }) => {
                assert_eq!(quantity, 5);
                assert_eq!(delta, i64::MAX);
            }
            other => panic!("expected StockOverflow, got {other:?}"),
        }
        match s.apply_delta(i64::MIN) {
            Err(CoreError::InsufficientStock { requested, .. }) => {
                assert_eq!(requested, i64::MAX);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_stock_threshold() {
        assert!(stock(3, 3).is_at_or_below_threshold());
        assert!(!stock(4, 3).is_at_or_below_threshold());
    }

    #[test]
    fn test_product_total_for() {
        let now = Utc::now();
        let product = Product {
            id: "prd-1".to_string(),
            name: "iPhone".to_string(),
            description: Some("Smartphone".to_string()),
            unit_price_cents: 100_000,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(product.total_for(3).unwrap().cents(), 300_000);
        assert!(matches!(
            product.total_for(i64::MAX),
            Err(CoreError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_party_from_draft_trims() {
        let now = Utc::now();
        let supplier = Supplier::from_draft("sup-1".to_string(), draft(), now);
        assert_eq!(supplier.name, "Vetri Traders");
        assert_eq!(Supplier::KIND, PartyKind::Supplier);
        assert_eq!(supplier.id(), "sup-1");
    }

    #[test]
    fn test_party_patch_only_touches_present_fields() {
        let now = Utc::now();
        let mut consumer = Consumer::from_draft("con-1".to_string(), draft(), now);
        let later = now + chrono::Duration::seconds(5);
        consumer.apply_patch(
            PartyPatch {
                address: Some("Bangalore".to_string()),
                ..Default::default()
            },
            later,
        );
        assert_eq!(consumer.address, "Bangalore");
        assert_eq!(consumer.contact, "+918765456789");
        assert_eq!(consumer.updated_at, later);
        assert_eq!(Consumer::KIND.as_str(), "Consumer");
    }

    #[test]
    fn test_party_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut bad = draft();
        bad.email = "orders@vetri".to_string();
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.contact = "87654-56789".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_order_update_validation() {
        assert!(OrderUpdate::default().validate().is_ok());
        assert!(OrderUpdate {
            quantity: Some(0),
            order_date: None
        }
        .validate()
        .is_err());
    }
}

//! # Reconciliation Rules
//!
//! The pure half of the order cascade: given a demand and a stock row, decide
//! whether a compensating supplier order is needed and how large it is; given
//! an old and new order quantity, decide which way the ledger moves.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Consumer order for Q against Stock { quantity: S, threshold: T }      │
//! │                                                                         │
//! │  Q > S  or  S <= T ?                                                   │
//! │     │ no ─────────────────────────────► no replenishment               │
//! │     │ yes                                                              │
//! │     ▼                                                                   │
//! │  shortfall = max(Q - S, 0)                                             │
//! │     │ 0 ──────────────────────────────► no replenishment               │
//! │     │ > 0                                                              │
//! │     ▼                                                                   │
//! │  compensating supplier order for min(shortfall, cap)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer runs these inside a unit of work; nothing here can fail
//! for I/O reasons.

use serde::{Deserialize, Serialize};

use crate::types::Stock;

/// Units missing for `demand` against `on_hand`, when replenishment is triggered.
///
/// Replenishment is considered when demand exceeds stock or stock already sits
/// at/below the threshold, but an order is only worth placing for a positive
/// shortfall.
///
/// ```rust
/// use depot_core::reconcile::replenishment_shortfall;
///
/// assert_eq!(replenishment_shortfall(8, 5, 3), Some(3));
/// assert_eq!(replenishment_shortfall(2, 5, 3), None);
/// // at threshold but demand is covered: nothing to order
/// assert_eq!(replenishment_shortfall(2, 3, 3), None);
/// ```
pub fn replenishment_shortfall(demand: i64, on_hand: i64, threshold: i64) -> Option<i64> {
    if demand > on_hand || on_hand <= threshold {
        let shortfall = demand.saturating_sub(on_hand).max(0);
        if shortfall > 0 {
            return Some(shortfall);
        }
    }
    None
}

/// A compensating order the cascade should place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentPlan {
    /// Units missing to satisfy the demand.
    pub shortfall: i64,
    /// Units actually ordered (`shortfall`, limited by the configured cap).
    pub order_quantity: i64,
}

impl ReplenishmentPlan {
    /// Whether the order covers the whole shortfall.
    #[inline]
    pub fn covers_shortfall(&self) -> bool {
        self.order_quantity >= self.shortfall
    }
}

/// Plans replenishment for `demand` against `stock`, honouring an optional
/// per-order cap.
pub fn plan_replenishment(demand: i64, stock: &Stock, cap: Option<i64>) -> Option<ReplenishmentPlan> {
    let shortfall = replenishment_shortfall(demand, stock.quantity, stock.threshold)?;
    let order_quantity = match cap {
        Some(cap) if cap > 0 => shortfall.min(cap),
        _ => shortfall,
    };
    Some(ReplenishmentPlan {
        shortfall,
        order_quantity,
    })
}

/// Direction of an order quantity edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityChange {
    /// Demand grew by this many units.
    Grow(i64),
    /// Demand shrank by this many units.
    Shrink(i64),
    Unchanged,
}

impl QuantityChange {
    /// Classifies `previous → next`; a missing `next` means the quantity was not edited.
    ///
    /// ```rust
    /// use depot_core::reconcile::QuantityChange;
    ///
    /// assert_eq!(QuantityChange::between(8, Some(2)), QuantityChange::Shrink(6));
    /// assert_eq!(QuantityChange::between(8, Some(10)), QuantityChange::Grow(2));
    /// assert_eq!(QuantityChange::between(8, None), QuantityChange::Unchanged);
    /// ```
    pub fn between(previous: i64, next: Option<i64>) -> Self {
        match next {
            Some(next) if next > previous => QuantityChange::Grow(next - previous),
            Some(next) if next < previous => QuantityChange::Shrink(previous - next),
            _ => QuantityChange::Unchanged,
        }
    }

    /// Signed stock delta for a supplier order edit (receipts add stock).
    pub fn receipt_delta(&self) -> i64 {
        match *self {
            QuantityChange::Grow(d) => d,
            QuantityChange::Shrink(d) => -d,
            QuantityChange::Unchanged => 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    #[test]
    fn test_no_replenishment_when_covered_above_threshold() {
        assert_eq!(replenishment_shortfall(4, 10, 3), None);
        assert_eq!(replenishment_shortfall(10, 10, 3), None);
    }

    #[test]
    fn test_shortfall_is_demand_minus_on_hand() {
        assert_eq!(replenishment_shortfall(8, 5, 3), Some(3));
        assert_eq!(replenishment_shortfall(1, 0, 0), Some(1));
        assert_eq!(replenishment_shortfall(6, 5, 10), Some(1));
    }

    #[test]
    fn test_threshold_alone_orders_nothing() {
        assert_eq!(replenishment_shortfall(1, 2, 5), None);
    }

    #[test]
    fn test_plan_respects_cap() {
        let plan = plan_replenishment(8, &stock(5, 3), None).unwrap();
        assert_eq!(plan.order_quantity, 3);
        assert!(plan.covers_shortfall());

        let capped = plan_replenishment(20, &stock(5, 3), Some(4)).unwrap();
        assert_eq!(capped.shortfall, 15);
        assert_eq!(capped.order_quantity, 4);
        assert!(!capped.covers_shortfall());

        assert!(plan_replenishment(2, &stock(5, 3), Some(4)).is_none());
    }

    #[test]
    fn test_quantity_change() {
        assert_eq!(QuantityChange::between(5, Some(5)), QuantityChange::Unchanged);
        assert_eq!(QuantityChange::between(5, Some(7)).receipt_delta(), 2);
        assert_eq!(QuantityChange::between(5, Some(1)).receipt_delta(), -4);
        assert_eq!(QuantityChange::Unchanged.receipt_delta(), 0);
    }
}

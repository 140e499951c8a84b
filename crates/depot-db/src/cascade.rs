//! # Order Cascade
//!
//! Every order write, with its effect on the stock ledger, as one unit of work.
//!
//! ## Consumer Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_consumer_order { consumer, product, quantity: 8 }              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock product ─► BEGIN                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve consumer, product, primary stock { quantity: 5, threshold: 3 }│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT consumer order (total = 8 × unit price)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shortfall 3 ─► INSERT compensating supplier order (3) ─► stock 8      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stock 8 − 8 = 0 ─► COMMIT                                             │
//! │       │                                                                 │
//! │       └── InsufficientStock / NotFound / ... ─► ROLLBACK (nothing kept)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Effects
//!
//! | Operation                      | Stock delta                              |
//! |--------------------------------|------------------------------------------|
//! | create consumer order (Q)      | + compensating quantity, then −Q         |
//! | grow consumer order (+Δ)       | + compensating growth, then −Δ           |
//! | shrink consumer order (−Δ)     | compensating order dropped, then +Δ      |
//! | delete consumer order (Q)      | compensating order dropped, then +Q      |
//! | create supplier order (Q)      | +Q (instantaneous receipt)               |
//! | update supplier order (Q → Q') | Q' − Q                                   |
//! | delete supplier order (Q)      | −Q                                       |
//!
//! A dropped compensating order is deleted without reversing its receipt:
//! those units went out with the consumer order that triggered it.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::order::{ConsumerOrderRepository, SupplierOrderRepository};
use crate::repository::party::PartyRepository;
use crate::repository::product::ProductRepository;
use crate::repository::required;
use crate::repository::stock::StockRepository;
use depot_core::reconcile::{plan_replenishment, QuantityChange};
use depot_core::{
    Consumer, ConsumerOrder, CoreError, NewConsumerOrder, NewSupplierOrder, OrderUpdate, Product,
    Stock, Supplier, SupplierOrder,
};

/// Entry point for order writes. Obtain one with [`Database::cascade`].
#[derive(Debug, Clone)]
pub struct OrderCascade {
    db: Database,
}

impl OrderCascade {
    pub fn new(db: Database) -> Self {
        OrderCascade { db }
    }

    // =========================================================================
    // Consumer orders
    // =========================================================================

    /// Places a consumer order against the product's primary stock.
    ///
    /// ## Errors
    /// * `NotFound` - consumer, product, or a stock row for the product
    /// * `NoReplenishmentSource` - a shortfall exists but no supplier is linked
    /// * `InsufficientStock` - stock (after replenishment) cannot cover the order
    /// * `Busy` - the product's stock lock was not acquired within `lock_wait`
    pub async fn create_consumer_order(&self, input: NewConsumerOrder) -> DbResult<ConsumerOrder> {
        input.validate()?;

        let mut uow = self.db.begin([input.product_id.as_str()]).await?;
        let conn = uow.conn();

        required(
            PartyRepository::<Consumer>::find(conn, &input.consumer_id).await?,
            "Consumer",
            &input.consumer_id,
        )?;
        let product = required(
            ProductRepository::find(conn, &input.product_id).await?,
            "Product",
            &input.product_id,
        )?;
        let stock = required(
            StockRepository::primary_for(conn, &product.id).await?,
            "Stock",
            &product.id,
        )?;

        let now = self.db.clock().now();
        let order = ConsumerOrder {
            id: Uuid::new_v4().to_string(),
            consumer_id: input.consumer_id,
            product_id: product.id.clone(),
            stock_id: stock.id.clone(),
            quantity: input.quantity,
            total_price_cents: product.total_for(input.quantity)?.cents(),
            order_date: input.order_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        ConsumerOrderRepository::insert(conn, &order).await?;

        self.replenish(conn, &product, &stock, &order, order.quantity, now)
            .await?;
        let after = StockRepository::adjust(conn, &stock.id, -order.quantity, now).await?;

        uow.commit().await?;

        info!(
            order_id = %order.id,
            product_id = %order.product_id,
            quantity = order.quantity,
            total_cents = order.total_price_cents,
            stock_after = after.quantity,
            "Consumer order created"
        );
        Ok(order)
    }

    /// Edits quantity and/or date and settles the difference against stock.
    ///
    /// The total is recomputed with the product's current unit price.
    pub async fn update_consumer_order(
        &self,
        id: &str,
        update: OrderUpdate,
    ) -> DbResult<ConsumerOrder> {
        update.validate()?;

        let product_id = self.consumer_order_product(id).await?;
        let mut uow = self.db.begin([product_id.as_str()]).await?;
        let conn = uow.conn();

        let mut order = required(ConsumerOrderRepository::find(conn, id).await?, "ConsumerOrder", id)?;
        let product = required(
            ProductRepository::find(conn, &order.product_id).await?,
            "Product",
            &order.product_id,
        )?;

        let now = self.db.clock().now();
        let change = QuantityChange::between(order.quantity, update.quantity);

        if let Some(quantity) = update.quantity {
            order.quantity = quantity;
        }
        if let Some(date) = update.order_date {
            order.order_date = date;
        }
        order.total_price_cents = product.total_for(order.quantity)?.cents();
        order.updated_at = now;
        ConsumerOrderRepository::update(conn, &order).await?;

        match change {
            QuantityChange::Grow(delta) => {
                let stock = required(
                    StockRepository::find(conn, &order.stock_id).await?,
                    "Stock",
                    &order.stock_id,
                )?;
                self.replenish(conn, &product, &stock, &order, delta, now)
                    .await?;
                StockRepository::adjust(conn, &order.stock_id, -delta, now).await?;
            }
            QuantityChange::Shrink(delta) => {
                self.drop_compensating(conn, &order.id).await?;
                StockRepository::adjust(conn, &order.stock_id, delta, now).await?;
            }
            QuantityChange::Unchanged => {}
        }

        uow.commit().await?;

        info!(
            order_id = %order.id,
            change = ?change,
            total_cents = order.total_price_cents,
            "Consumer order updated"
        );
        Ok(order)
    }

    /// Deletes a consumer order, returning its quantity to stock.
    ///
    /// Its compensating supplier order and its transaction go with it.
    pub async fn delete_consumer_order(&self, id: &str) -> DbResult<ConsumerOrder> {
        let product_id = self.consumer_order_product(id).await?;
        let mut uow = self.db.begin([product_id.as_str()]).await?;
        let conn = uow.conn();

        let order = required(ConsumerOrderRepository::find(conn, id).await?, "ConsumerOrder", id)?;
        let now = self.db.clock().now();

        self.drop_compensating(conn, &order.id).await?;
        let after = StockRepository::adjust(conn, &order.stock_id, order.quantity, now).await?;
        ConsumerOrderRepository::delete(conn, &order.id).await?;

        uow.commit().await?;

        info!(
            order_id = %order.id,
            returned = order.quantity,
            stock_after = after.quantity,
            "Consumer order deleted"
        );
        Ok(order)
    }

    // =========================================================================
    // Supplier orders
    // =========================================================================

    /// Records a purchase; the quantity is received into `stock_id` at once.
    ///
    /// ## Errors
    /// * `NotFound` - supplier, product or stock
    /// * `StockProductMismatch` - the stock row holds a different product
    pub async fn create_supplier_order(&self, input: NewSupplierOrder) -> DbResult<SupplierOrder> {
        input.validate()?;

        let mut uow = self.db.begin([input.product_id.as_str()]).await?;
        let conn = uow.conn();

        required(
            PartyRepository::<Supplier>::find(conn, &input.supplier_id).await?,
            "Supplier",
            &input.supplier_id,
        )?;
        let product = required(
            ProductRepository::find(conn, &input.product_id).await?,
            "Product",
            &input.product_id,
        )?;
        let stock = required(
            StockRepository::find(conn, &input.stock_id).await?,
            "Stock",
            &input.stock_id,
        )?;
        if stock.product_id != product.id {
            return Err(CoreError::StockProductMismatch {
                stock_id: stock.id,
                product_id: product.id,
            }
            .into());
        }

        let now = self.db.clock().now();
        let order = self
            .place_supplier_order(
                conn,
                input.supplier_id,
                &product,
                &stock.id,
                input.quantity,
                None,
                input.order_date.unwrap_or(now),
                now,
            )
            .await?;

        uow.commit().await?;

        info!(
            order_id = %order.id,
            product_id = %order.product_id,
            quantity = order.quantity,
            total_cents = order.total_price_cents,
            "Supplier order created"
        );
        Ok(order)
    }

    /// Edits quantity and/or date; stock moves by the quantity difference.
    pub async fn update_supplier_order(
        &self,
        id: &str,
        update: OrderUpdate,
    ) -> DbResult<SupplierOrder> {
        update.validate()?;

        let product_id = self.supplier_order_product(id).await?;
        let mut uow = self.db.begin([product_id.as_str()]).await?;
        let conn = uow.conn();

        let mut order = required(SupplierOrderRepository::find(conn, id).await?, "SupplierOrder", id)?;
        let product = required(
            ProductRepository::find(conn, &order.product_id).await?,
            "Product",
            &order.product_id,
        )?;

        let now = self.db.clock().now();
        let change = QuantityChange::between(order.quantity, update.quantity);

        if let Some(quantity) = update.quantity {
            order.quantity = quantity;
        }
        if let Some(date) = update.order_date {
            order.order_date = date;
        }
        order.total_price_cents = product.total_for(order.quantity)?.cents();
        order.updated_at = now;

        SupplierOrderRepository::update(conn, &order).await?;
        StockRepository::adjust(conn, &order.stock_id, change.receipt_delta(), now).await?;

        uow.commit().await?;

        info!(order_id = %order.id, change = ?change, "Supplier order updated");
        Ok(order)
    }

    /// Deletes a supplier order, reversing its receipt.
    ///
    /// Fails `InsufficientStock` when the received units have already gone out.
    pub async fn delete_supplier_order(&self, id: &str) -> DbResult<SupplierOrder> {
        let product_id = self.supplier_order_product(id).await?;
        let mut uow = self.db.begin([product_id.as_str()]).await?;
        let conn = uow.conn();

        let order = required(SupplierOrderRepository::find(conn, id).await?, "SupplierOrder", id)?;
        let now = self.db.clock().now();

        StockRepository::adjust(conn, &order.stock_id, -order.quantity, now).await?;
        SupplierOrderRepository::delete(conn, &order.id).await?;

        uow.commit().await?;

        info!(order_id = %order.id, reversed = order.quantity, "Supplier order deleted");
        Ok(order)
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Places (or grows) the compensating order covering `demand` against `stock`.
    async fn replenish(
        &self,
        conn: &mut SqliteConnection,
        product: &Product,
        stock: &Stock,
        consumer_order: &ConsumerOrder,
        demand: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SupplierOrder>> {
        let cap = self.db.engine().max_replenishment_quantity;
        let Some(plan) = plan_replenishment(demand, stock, cap) else {
            return Ok(None);
        };

        if !plan.covers_shortfall() {
            warn!(
                product_id = %product.id,
                shortfall = plan.shortfall,
                ordered = plan.order_quantity,
                "Replenishment capped below shortfall"
            );
        }

        if let Some(mut existing) =
            SupplierOrderRepository::find_compensating(conn, &consumer_order.id).await?
        {
            existing.quantity = existing
                .quantity
                .checked_add(plan.order_quantity)
                .ok_or(CoreError::AmountOverflow {
                    quantity: existing.quantity,
                    unit_price_cents: product.unit_price_cents,
                })?;
            existing.total_price_cents = product.total_for(existing.quantity)?.cents();
            existing.updated_at = now;

            SupplierOrderRepository::update(conn, &existing).await?;
            StockRepository::adjust(conn, &existing.stock_id, plan.order_quantity, now).await?;

            debug!(
                supplier_order_id = %existing.id,
                consumer_order_id = %consumer_order.id,
                grown_by = plan.order_quantity,
                "Compensating order grown"
            );
            return Ok(Some(existing));
        }

        let supplier_id = ProductRepository::replenishment_source(conn, &product.id)
            .await?
            .ok_or_else(|| CoreError::NoReplenishmentSource {
                product_id: product.id.clone(),
            })?;

        let order = self
            .place_supplier_order(
                conn,
                supplier_id,
                product,
                &stock.id,
                plan.order_quantity,
                Some(consumer_order.id.clone()),
                consumer_order.order_date,
                now,
            )
            .await?;

        debug!(
            supplier_order_id = %order.id,
            consumer_order_id = %consumer_order.id,
            quantity = order.quantity,
            "Compensating order placed"
        );
        Ok(Some(order))
    }

    /// Deletes the compensating order of `consumer_order_id`, if there is one.
    async fn drop_compensating(
        &self,
        conn: &mut SqliteConnection,
        consumer_order_id: &str,
    ) -> DbResult<Option<SupplierOrder>> {
        let Some(order) = SupplierOrderRepository::find_compensating(conn, consumer_order_id).await?
        else {
            return Ok(None);
        };

        SupplierOrderRepository::delete(conn, &order.id).await?;

        debug!(
            supplier_order_id = %order.id,
            consumer_order_id = %consumer_order_id,
            "Compensating order removed"
        );
        Ok(Some(order))
    }

    /// Inserts a supplier order and receives its quantity into stock.
    #[allow(clippy::too_many_arguments)]
    async fn place_supplier_order(
        &self,
        conn: &mut SqliteConnection,
        supplier_id: String,
        product: &Product,
        stock_id: &str,
        quantity: i64,
        consumer_order_id: Option<String>,
        order_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DbResult<SupplierOrder> {
        let order = SupplierOrder {
            id: Uuid::new_v4().to_string(),
            supplier_id,
            product_id: product.id.clone(),
            stock_id: stock_id.to_string(),
            consumer_order_id,
            quantity,
            total_price_cents: product.total_for(quantity)?.cents(),
            order_date,
            created_at: now,
            updated_at: now,
        };

        SupplierOrderRepository::insert(conn, &order).await?;
        StockRepository::adjust(conn, stock_id, quantity, now).await?;
        Ok(order)
    }

    async fn consumer_order_product(&self, id: &str) -> DbResult<String> {
        let order = required(self.db.consumer_orders().get(id).await?, "ConsumerOrder", id)?;
        Ok(order.product_id)
    }

    async fn supplier_order_product(&self, id: &str) -> DbResult<String> {
        let order = required(self.db.supplier_orders().get(id).await?, "SupplierOrder", id)?;
        Ok(order.product_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::DbError;
    use crate::pool::DbConfig;
    use depot_core::{Money, NewProduct, NewStock, PartyDraft};

    struct Fixture {
        db: Database,
        consumer_id: String,
        supplier_id: String,
        product_id: String,
        stock_id: String,
    }

    fn party(name: &str) -> PartyDraft {
        PartyDraft {
            name: name.to_string(),
            address: "Coimbatore".to_string(),
            contact: "+919000000001".to_string(),
            email: "desk@example.com".to_string(),
        }
    }

    async fn fixture_with(config: DbConfig, quantity: i64, threshold: i64, link: bool) -> Fixture {
        let db = Database::new(config).await.unwrap();
        let consumer = db.consumers().create(party("Meena")).await.unwrap();
        let supplier = db.suppliers().create(party("Vetri Traders")).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Headphones".to_string(),
                description: None,
                unit_price: Money::from_major_minor(25, 50),
            })
            .await
            .unwrap();
        if link {
            db.products().link_supplier(&product.id, &supplier.id).await.unwrap();
        }
        let stock = db
            .stocks()
            .create(NewStock {
                product_id: product.id.clone(),
                quantity,
                location: "main".to_string(),
                threshold,
            })
            .await
            .unwrap();

        Fixture {
            db,
            consumer_id: consumer.id,
            supplier_id: supplier.id,
            product_id: product.id,
            stock_id: stock.id,
        }
    }

    async fn fixture(quantity: i64, threshold: i64) -> Fixture {
        fixture_with(DbConfig::in_memory(), quantity, threshold, true).await
    }

    impl Fixture {
        fn consumer_order(&self, quantity: i64) -> NewConsumerOrder {
            NewConsumerOrder {
                consumer_id: self.consumer_id.clone(),
                product_id: self.product_id.clone(),
                quantity,
                order_date: None,
            }
        }

        fn supplier_order(&self, quantity: i64) -> NewSupplierOrder {
            NewSupplierOrder {
                supplier_id: self.supplier_id.clone(),
                product_id: self.product_id.clone(),
                stock_id: self.stock_id.clone(),
                quantity,
                order_date: None,
            }
        }

        async fn stock(&self) -> i64 {
            self.db.stocks().get(&self.stock_id).await.unwrap().unwrap().quantity
        }
    }

    #[tokio::test]
    async fn test_covered_order_only_decrements() {
        let f = fixture(10, 3).await;
        let order = f.db.cascade().create_consumer_order(f.consumer_order(4)).await.unwrap();

        assert_eq!(order.total_price_cents, 4 * 2550);
        assert_eq!(order.stock_id, f.stock_id);
        assert_eq!(f.stock().await, 6);
        assert!(f.db.supplier_orders().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shortfall_spawns_compensating_order() {
        let f = fixture(5, 3).await;
        let order = f.db.cascade().create_consumer_order(f.consumer_order(8)).await.unwrap();

        let compensating = f
            .db
            .supplier_orders()
            .compensating_for(&order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(compensating.quantity, 3);
        assert_eq!(compensating.supplier_id, f.supplier_id);
        assert_eq!(compensating.total_price_cents, 3 * 2550);
        assert_eq!(compensating.order_date, order.order_date);
        assert_eq!(f.stock().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_refs_are_not_found() {
        let f = fixture(5, 3).await;

        let mut input = f.consumer_order(1);
        input.consumer_id = "ghost".to_string();
        let err = f.db.cascade().create_consumer_order(input).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, ref id } if entity == "Consumer" && id == "ghost"));

        let mut input = f.consumer_order(1);
        input.product_id = "ghost".to_string();
        assert!(f.db.cascade().create_consumer_order(input).await.unwrap_err().is_not_found());

        assert!(f
            .db
            .cascade()
            .delete_consumer_order("ghost")
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(f.stock().await, 5);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_before_any_write() {
        let f = fixture(5, 3).await;
        let err = f.db.cascade().create_consumer_order(f.consumer_order(0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert!(f.db.consumer_orders().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_linked_supplier_rolls_back() {
        let f = fixture_with(DbConfig::in_memory(), 5, 3, false).await;
        let err = f.db.cascade().create_consumer_order(f.consumer_order(8)).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::NoReplenishmentSource { ref product_id }) if *product_id == f.product_id
        ));
        assert!(f.db.consumer_orders().list().await.unwrap().is_empty());
        assert_eq!(f.stock().await, 5);
    }

    #[tokio::test]
    async fn test_growth_grows_existing_compensating_order() {
        let f = fixture(5, 3).await;
        let order = f.db.cascade().create_consumer_order(f.consumer_order(8)).await.unwrap();

        let updated = f
            .db
            .cascade()
            .update_consumer_order(
                &order.id,
                OrderUpdate {
                    quantity: Some(10),
                    order_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_price_cents, 10 * 2550);

        let orders = f.db.supplier_orders().list().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].quantity, 5);
        assert_eq!(orders[0].total_price_cents, 5 * 2550);
        assert_eq!(f.stock().await, 0);
    }

    #[tokio::test]
    async fn test_supplier_order_receipt_lifecycle() {
        let f = fixture(5, 3).await;
        let cascade = f.db.cascade();

        let order = cascade.create_supplier_order(f.supplier_order(10)).await.unwrap();
        assert!(!order.is_compensating());
        assert_eq!(f.stock().await, 15);

        let order = cascade
            .update_supplier_order(
                &order.id,
                OrderUpdate {
                    quantity: Some(4),
                    order_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(order.total_price_cents, 4 * 2550);
        assert_eq!(f.stock().await, 9);

        cascade.delete_supplier_order(&order.id).await.unwrap();
        assert_eq!(f.stock().await, 5);
        assert!(f.db.supplier_orders().get(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_supplier_order_reversal_cannot_go_negative() {
        let f = fixture(0, 0).await;
        let cascade = f.db.cascade();

        let receipt = cascade.create_supplier_order(f.supplier_order(4)).await.unwrap();
        cascade.create_consumer_order(f.consumer_order(3)).await.unwrap();
        assert_eq!(f.stock().await, 1);

        let err = cascade.delete_supplier_order(&receipt.id).await.unwrap_err();
        assert!(err.is_insufficient_stock());
        assert!(f.db.supplier_orders().get(&receipt.id).await.unwrap().is_some());
        assert_eq!(f.stock().await, 1);
    }

    #[tokio::test]
    async fn test_supplier_order_stock_must_match_product() {
        let f = fixture(5, 3).await;
        let other = f
            .db
            .products()
            .create(NewProduct {
                name: "Charger".to_string(),
                description: None,
                unit_price: Money::from_major_minor(5, 0),
            })
            .await
            .unwrap();

        let mut input = f.supplier_order(2);
        input.product_id = other.id;
        let err = f.db.cascade().create_supplier_order(input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::StockProductMismatch { .. })));
        assert_eq!(f.stock().await, 5);
    }

    #[tokio::test]
    async fn test_date_only_update_leaves_stock() {
        let f = fixture(10, 3).await;
        let order = f.db.cascade().create_consumer_order(f.consumer_order(4)).await.unwrap();
        let date = order.order_date - chrono::Duration::days(2);

        let updated = f
            .db
            .cascade()
            .update_consumer_order(
                &order.id,
                OrderUpdate {
                    quantity: None,
                    order_date: Some(date),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.order_date, date);
        assert_eq!(updated.quantity, 4);
        assert_eq!(f.stock().await, 6);
    }

    #[tokio::test]
    async fn test_capped_replenishment_is_insufficient() {
        let config =
            DbConfig::in_memory().engine(EngineConfig::default().max_replenishment_quantity(2));
        let f = fixture_with(config, 5, 3, true).await;

        let err = f.db.cascade().create_consumer_order(f.consumer_order(8)).await.unwrap_err();
        assert!(err.is_insufficient_stock());
        assert!(f.db.supplier_orders().list().await.unwrap().is_empty());
        assert!(f.db.consumer_orders().list().await.unwrap().is_empty());
        assert_eq!(f.stock().await, 5);
    }
}

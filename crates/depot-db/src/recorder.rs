//! # Transaction Recorder
//!
//! Settlement records for orders. The amount is never an input: it is copied
//! from the order's `total_price_cents` when the transaction is created, and
//! only the transaction date can change afterwards.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::order::{ConsumerOrderRepository, SupplierOrderRepository};
use crate::repository::party::PartyRepository;
use crate::repository::required;
use crate::repository::transaction::{
    ConsumerTransactionRepository, SupplierTransactionRepository,
};
use crate::unit_of_work::UnitOfWork;
use depot_core::{Consumer, ConsumerTransaction, CoreError, Supplier, SupplierTransaction};

/// Entry point for transaction writes. Obtain one with [`Database::recorder`].
#[derive(Debug, Clone)]
pub struct TransactionRecorder {
    db: Database,
}

impl TransactionRecorder {
    pub fn new(db: Database) -> Self {
        TransactionRecorder { db }
    }

    async fn begin(&self) -> DbResult<UnitOfWork> {
        // Settlements never move stock, so no stock lock is taken.
        UnitOfWork::begin(self.db.pool(), None).await
    }

    /// Records the settlement of a supplier order.
    ///
    /// ## Errors
    /// * `NotFound` - supplier or order
    /// * `PartyMismatch` - the order was placed with another supplier
    /// * `UniqueViolation` - the order already has a transaction
    pub async fn create_supplier_transaction(
        &self,
        supplier_id: &str,
        order_id: &str,
        transaction_date: Option<DateTime<Utc>>,
    ) -> DbResult<SupplierTransaction> {
        let mut uow = self.begin().await?;
        let conn = uow.conn();

        required(
            PartyRepository::<Supplier>::find(conn, supplier_id).await?,
            "Supplier",
            supplier_id,
        )?;
        let order = required(
            SupplierOrderRepository::find(conn, order_id).await?,
            "SupplierOrder",
            order_id,
        )?;
        if order.supplier_id != supplier_id {
            return Err(CoreError::PartyMismatch {
                party: "Supplier",
                party_id: supplier_id.to_string(),
                order_id: order.id,
            }
            .into());
        }

        let now = self.db.clock().now();
        let tx = SupplierTransaction {
            id: Uuid::new_v4().to_string(),
            supplier_id: order.supplier_id,
            order_id: order.id,
            amount_cents: order.total_price_cents,
            transaction_date: transaction_date.unwrap_or(now),
            created_at: now,
        };
        SupplierTransactionRepository::insert(conn, &tx)
            .await
            .map_err(|e| one_per_order(e, &tx.order_id))?;

        uow.commit().await?;

        info!(transaction_id = %tx.id, order_id = %tx.order_id, amount_cents = tx.amount_cents, "Supplier transaction recorded");
        Ok(tx)
    }

    /// Records the settlement of a consumer order; the stock reference is
    /// copied from the order.
    pub async fn create_consumer_transaction(
        &self,
        consumer_id: &str,
        order_id: &str,
        transaction_date: Option<DateTime<Utc>>,
    ) -> DbResult<ConsumerTransaction> {
        let mut uow = self.begin().await?;
        let conn = uow.conn();

        required(
            PartyRepository::<Consumer>::find(conn, consumer_id).await?,
            "Consumer",
            consumer_id,
        )?;
        let order = required(
            ConsumerOrderRepository::find(conn, order_id).await?,
            "ConsumerOrder",
            order_id,
        )?;
        if order.consumer_id != consumer_id {
            return Err(CoreError::PartyMismatch {
                party: "Consumer",
                party_id: consumer_id.to_string(),
                order_id: order.id,
            }
            .into());
        }

        let now = self.db.clock().now();
        let tx = ConsumerTransaction {
            id: Uuid::new_v4().to_string(),
            consumer_id: order.consumer_id,
            order_id: order.id,
            stock_id: order.stock_id,
            amount_cents: order.total_price_cents,
            transaction_date: transaction_date.unwrap_or(now),
            created_at: now,
        };
        ConsumerTransactionRepository::insert(conn, &tx)
            .await
            .map_err(|e| one_per_order(e, &tx.order_id))?;

        uow.commit().await?;

        info!(transaction_id = %tx.id, order_id = %tx.order_id, amount_cents = tx.amount_cents, "Consumer transaction recorded");
        Ok(tx)
    }

    /// Changes the transaction date; the amount is untouched.
    pub async fn update_supplier_transaction(
        &self,
        id: &str,
        transaction_date: DateTime<Utc>,
    ) -> DbResult<SupplierTransaction> {
        let mut uow = self.begin().await?;
        let conn = uow.conn();

        if !SupplierTransactionRepository::set_date(conn, id, transaction_date).await? {
            return Err(DbError::not_found("SupplierTransaction", id));
        }
        let tx = required(
            SupplierTransactionRepository::find(conn, id).await?,
            "SupplierTransaction",
            id,
        )?;

        uow.commit().await?;
        Ok(tx)
    }

    pub async fn update_consumer_transaction(
        &self,
        id: &str,
        transaction_date: DateTime<Utc>,
    ) -> DbResult<ConsumerTransaction> {
        let mut uow = self.begin().await?;
        let conn = uow.conn();

        if !ConsumerTransactionRepository::set_date(conn, id, transaction_date).await? {
            return Err(DbError::not_found("ConsumerTransaction", id));
        }
        let tx = required(
            ConsumerTransactionRepository::find(conn, id).await?,
            "ConsumerTransaction",
            id,
        )?;

        uow.commit().await?;
        Ok(tx)
    }

    pub async fn delete_supplier_transaction(&self, id: &str) -> DbResult<()> {
        let mut uow = self.begin().await?;
        if !SupplierTransactionRepository::delete(uow.conn(), id).await? {
            return Err(DbError::not_found("SupplierTransaction", id));
        }
        uow.commit().await?;

        info!(transaction_id = %id, "Supplier transaction deleted");
        Ok(())
    }

    pub async fn delete_consumer_transaction(&self, id: &str) -> DbResult<()> {
        let mut uow = self.begin().await?;
        if !ConsumerTransactionRepository::delete(uow.conn(), id).await? {
            return Err(DbError::not_found("ConsumerTransaction", id));
        }
        uow.commit().await?;

        info!(transaction_id = %id, "Consumer transaction deleted");
        Ok(())
    }
}

/// A unique violation on insert means the order is already settled.
fn one_per_order(err: DbError, order_id: &str) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, order_id),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

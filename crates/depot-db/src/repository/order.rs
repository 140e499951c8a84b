//! # Order Repositories
//!
//! Reads of supplier and consumer orders, plus the row-level writes the order
//! cascade composes. Nothing here touches the stock ledger: creating, editing
//! or deleting an order with its stock effect goes through
//! [`OrderCascade`](crate::cascade::OrderCascade).

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use depot_core::{ConsumerOrder, SupplierOrder};

const SUPPLIER_ORDER_COLUMNS: &str = "id, supplier_id, product_id, stock_id, consumer_order_id, \
     quantity, total_price_cents, order_date, created_at, updated_at";

const CONSUMER_ORDER_COLUMNS: &str = "id, consumer_id, product_id, stock_id, \
     quantity, total_price_cents, order_date, created_at, updated_at";

// =============================================================================
// Supplier Orders
// =============================================================================

/// Repository for supplier order queries.
#[derive(Debug, Clone)]
pub struct SupplierOrderRepository {
    pool: SqlitePool,
}

impl SupplierOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierOrderRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SupplierOrder>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<SupplierOrder>> {
        let orders = sqlx::query_as::<_, SupplierOrder>(&format!(
            "SELECT {SUPPLIER_ORDER_COLUMNS} FROM supplier_orders ORDER BY order_date, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders placed with one supplier.
    pub async fn list_by_supplier(&self, supplier_id: &str) -> DbResult<Vec<SupplierOrder>> {
        let orders = sqlx::query_as::<_, SupplierOrder>(&format!(
            "SELECT {SUPPLIER_ORDER_COLUMNS} FROM supplier_orders WHERE supplier_id = ?1 ORDER BY order_date, rowid"
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn list_by_product(&self, product_id: &str) -> DbResult<Vec<SupplierOrder>> {
        let orders = sqlx::query_as::<_, SupplierOrder>(&format!(
            "SELECT {SUPPLIER_ORDER_COLUMNS} FROM supplier_orders WHERE product_id = ?1 ORDER BY order_date, rowid"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// The compensating order spawned for a consumer order, if any.
    pub async fn compensating_for(&self, consumer_order_id: &str) -> DbResult<Option<SupplierOrder>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_compensating(&mut conn, consumer_order_id).await
    }

    // -------------------------------------------------------------------------
    // Connection-level (unit of work)
    // -------------------------------------------------------------------------

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SupplierOrder>> {
        let order = sqlx::query_as::<_, SupplierOrder>(&format!(
            "SELECT {SUPPLIER_ORDER_COLUMNS} FROM supplier_orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    /// Looks up by the indexed `consumer_order_id` back-reference.
    pub async fn find_compensating(
        conn: &mut SqliteConnection,
        consumer_order_id: &str,
    ) -> DbResult<Option<SupplierOrder>> {
        let order = sqlx::query_as::<_, SupplierOrder>(&format!(
            "SELECT {SUPPLIER_ORDER_COLUMNS} FROM supplier_orders WHERE consumer_order_id = ?1"
        ))
        .bind(consumer_order_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    pub async fn insert(conn: &mut SqliteConnection, order: &SupplierOrder) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO supplier_orders (
                id, supplier_id, product_id, stock_id, consumer_order_id,
                quantity, total_price_cents, order_date, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.supplier_id)
        .bind(&order.product_id)
        .bind(&order.stock_id)
        .bind(&order.consumer_order_id)
        .bind(order.quantity)
        .bind(order.total_price_cents)
        .bind(order.order_date)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes quantity, total, date and `updated_at`.
    pub async fn update(conn: &mut SqliteConnection, order: &SupplierOrder) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE supplier_orders
            SET quantity = ?1, total_price_cents = ?2, order_date = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(order.quantity)
        .bind(order.total_price_cents)
        .bind(order.order_date)
        .bind(order.updated_at)
        .bind(&order.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Removes the row (its transaction follows by cascade).
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM supplier_orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Consumer Orders
// =============================================================================

/// Repository for consumer order queries.
#[derive(Debug, Clone)]
pub struct ConsumerOrderRepository {
    pool: SqlitePool,
}

impl ConsumerOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ConsumerOrderRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<ConsumerOrder>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<ConsumerOrder>> {
        let orders = sqlx::query_as::<_, ConsumerOrder>(&format!(
            "SELECT {CONSUMER_ORDER_COLUMNS} FROM consumer_orders ORDER BY order_date, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders placed by one consumer.
    pub async fn list_by_consumer(&self, consumer_id: &str) -> DbResult<Vec<ConsumerOrder>> {
        let orders = sqlx::query_as::<_, ConsumerOrder>(&format!(
            "SELECT {CONSUMER_ORDER_COLUMNS} FROM consumer_orders WHERE consumer_id = ?1 ORDER BY order_date, rowid"
        ))
        .bind(consumer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn list_by_product(&self, product_id: &str) -> DbResult<Vec<ConsumerOrder>> {
        let orders = sqlx::query_as::<_, ConsumerOrder>(&format!(
            "SELECT {CONSUMER_ORDER_COLUMNS} FROM consumer_orders WHERE product_id = ?1 ORDER BY order_date, rowid"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    // -------------------------------------------------------------------------
    // Connection-level (unit of work)
    // -------------------------------------------------------------------------

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ConsumerOrder>> {
        let order = sqlx::query_as::<_, ConsumerOrder>(&format!(
            "SELECT {CONSUMER_ORDER_COLUMNS} FROM consumer_orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    pub async fn insert(conn: &mut SqliteConnection, order: &ConsumerOrder) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_orders (
                id, consumer_id, product_id, stock_id,
                quantity, total_price_cents, order_date, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.consumer_id)
        .bind(&order.product_id)
        .bind(&order.stock_id)
        .bind(order.quantity)
        .bind(order.total_price_cents)
        .bind(order.order_date)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn update(conn: &mut SqliteConnection, order: &ConsumerOrder) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE consumer_orders
            SET quantity = ?1, total_price_cents = ?2, order_date = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(order.quantity)
        .bind(order.total_price_cents)
        .bind(order.order_date)
        .bind(order.updated_at)
        .bind(&order.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM consumer_orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

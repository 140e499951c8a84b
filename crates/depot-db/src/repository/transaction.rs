//! # Transaction Repositories
//!
//! Reads of settlement records, and the row-level writes used by the
//! [`TransactionRecorder`](crate::recorder::TransactionRecorder).
//! There is at most one transaction per order (`order_id` is UNIQUE).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use depot_core::{ConsumerTransaction, SupplierTransaction};

const SUPPLIER_TX_COLUMNS: &str =
    "id, supplier_id, order_id, amount_cents, transaction_date, created_at";

const CONSUMER_TX_COLUMNS: &str =
    "id, consumer_id, order_id, stock_id, amount_cents, transaction_date, created_at";

/// Table-generic statements shared by both kinds.
async fn write_date(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
    date: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(&format!(
        "UPDATE {table} SET transaction_date = ?1 WHERE id = ?2"
    ))
    .bind(date)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn delete_row(conn: &mut SqliteConnection, table: &str, id: &str) -> DbResult<bool> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Supplier Transactions
// =============================================================================

#[derive(Debug, Clone)]
pub struct SupplierTransactionRepository {
    pool: SqlitePool,
}

impl SupplierTransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierTransactionRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SupplierTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<SupplierTransaction>> {
        let tx = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "SELECT {SUPPLIER_TX_COLUMNS} FROM supplier_transactions WHERE order_id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    pub async fn list(&self) -> DbResult<Vec<SupplierTransaction>> {
        let txs = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "SELECT {SUPPLIER_TX_COLUMNS} FROM supplier_transactions ORDER BY transaction_date, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    pub async fn list_by_supplier(&self, supplier_id: &str) -> DbResult<Vec<SupplierTransaction>> {
        let txs = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "SELECT {SUPPLIER_TX_COLUMNS} FROM supplier_transactions WHERE supplier_id = ?1 ORDER BY transaction_date, rowid"
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<SupplierTransaction>> {
        let tx = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "SELECT {SUPPLIER_TX_COLUMNS} FROM supplier_transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(tx)
    }

    pub async fn insert(conn: &mut SqliteConnection, tx: &SupplierTransaction) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO supplier_transactions (id, supplier_id, order_id, amount_cents, transaction_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.supplier_id)
        .bind(&tx.order_id)
        .bind(tx.amount_cents)
        .bind(tx.transaction_date)
        .bind(tx.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn set_date(
        conn: &mut SqliteConnection,
        id: &str,
        date: DateTime<Utc>,
    ) -> DbResult<bool> {
        write_date(conn, "supplier_transactions", id, date).await
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        delete_row(conn, "supplier_transactions", id).await
    }
}

// =============================================================================
// Consumer Transactions
// =============================================================================

#[derive(Debug, Clone)]
pub struct ConsumerTransactionRepository {
    pool: SqlitePool,
}

impl ConsumerTransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ConsumerTransactionRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<ConsumerTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<ConsumerTransaction>> {
        let tx = sqlx::query_as::<_, ConsumerTransaction>(&format!(
            "SELECT {CONSUMER_TX_COLUMNS} FROM consumer_transactions WHERE order_id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    pub async fn list(&self) -> DbResult<Vec<ConsumerTransaction>> {
        let txs = sqlx::query_as::<_, ConsumerTransaction>(&format!(
            "SELECT {CONSUMER_TX_COLUMNS} FROM consumer_transactions ORDER BY transaction_date, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    pub async fn list_by_consumer(&self, consumer_id: &str) -> DbResult<Vec<ConsumerTransaction>> {
        let txs = sqlx::query_as::<_, ConsumerTransaction>(&format!(
            "SELECT {CONSUMER_TX_COLUMNS} FROM consumer_transactions WHERE consumer_id = ?1 ORDER BY transaction_date, rowid"
        ))
        .bind(consumer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<ConsumerTransaction>> {
        let tx = sqlx::query_as::<_, ConsumerTransaction>(&format!(
            "SELECT {CONSUMER_TX_COLUMNS} FROM consumer_transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(tx)
    }

    pub async fn insert(conn: &mut SqliteConnection, tx: &ConsumerTransaction) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_transactions (id, consumer_id, order_id, stock_id, amount_cents, transaction_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.consumer_id)
        .bind(&tx.order_id)
        .bind(&tx.stock_id)
        .bind(tx.amount_cents)
        .bind(tx.transaction_date)
        .bind(tx.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn set_date(
        conn: &mut SqliteConnection,
        id: &str,
        date: DateTime<Utc>,
    ) -> DbResult<bool> {
        write_date(conn, "consumer_transactions", id, date).await
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        delete_row(conn, "consumer_transactions", id).await
    }
}

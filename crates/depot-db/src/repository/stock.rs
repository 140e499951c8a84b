//! # Stock Ledger
//!
//! The single source of truth for on-hand quantity.
//!
//! ## Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  adjust(conn, stock_id, delta)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT … WHERE id = ?          → quantity = 5, version = 7            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Stock::apply_delta(delta)      → InsufficientStock if < 0             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE … SET quantity = ?, version = version + 1                      │
//! │           WHERE id = ? AND version = 7                                  │
//! │       │                                                                 │
//! │       └── 0 rows → Conflict                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantity only moves through [`StockRepository::adjust`], which the order
//! cascade calls inside a unit of work. Threshold and location are plain
//! field updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::required;
use depot_core::validation::{validate_non_negative, validate_required};
use depot_core::{Clock, NewStock, Stock};

const STOCK_COLUMNS: &str =
    "id, product_id, quantity, location, threshold, version, created_at, updated_at";

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl StockRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        StockRepository { pool, clock }
    }

    /// Opens a stock row for a product at a location.
    ///
    /// One row per (product, location); a second is `UniqueViolation`.
    pub async fn create(&self, input: NewStock) -> DbResult<Stock> {
        input.validate()?;

        let mut conn = self.pool.acquire().await?;
        required(
            ProductRepository::find(&mut conn, &input.product_id).await?,
            "Product",
            &input.product_id,
        )?;

        let now = self.clock.now();
        let stock = Stock {
            id: Uuid::new_v4().to_string(),
            product_id: input.product_id,
            quantity: input.quantity,
            location: input.location.trim().to_string(),
            threshold: input.threshold,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock (id, product_id, quantity, location, threshold, version, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&stock.id)
        .bind(&stock.product_id)
        .bind(stock.quantity)
        .bind(&stock.location)
        .bind(stock.threshold)
        .bind(stock.version)
        .bind(stock.created_at)
        .bind(stock.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: format!("{}@{}", stock.product_id, stock.location),
            },
            other => other,
        })?;

        info!(
            stock_id = %stock.id,
            product_id = %stock.product_id,
            quantity = stock.quantity,
            threshold = stock.threshold,
            "Stock opened"
        );
        Ok(stock)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Stock>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// The product's primary stock row (the earliest created).
    pub async fn get_for_product(&self, product_id: &str) -> DbResult<Option<Stock>> {
        let mut conn = self.pool.acquire().await?;
        Self::primary_for(&mut conn, product_id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock ORDER BY created_at, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(stocks)
    }

    /// Every stock row of a product, primary first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE product_id = ?1 ORDER BY created_at, rowid"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stocks)
    }

    pub async fn set_threshold(&self, id: &str, threshold: i64) -> DbResult<Stock> {
        validate_non_negative("threshold", threshold)?;
        self.set_field(id, "threshold", threshold).await
    }

    pub async fn set_location(&self, id: &str, location: &str) -> DbResult<Stock> {
        validate_required("location", location)?;
        self.set_field(id, "location", location.trim().to_string()).await
    }

    /// Deletes a stock row; orders drawing from it are removed by cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock", id));
        }

        info!(stock_id = %id, "Stock deleted");
        Ok(())
    }

    async fn set_field<T>(&self, id: &str, column: &'static str, value: T) -> DbResult<Stock>
    where
        T: for<'q> sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send + 'static,
    {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(&format!(
            "UPDATE stock SET {column} = ?1, version = version + 1, updated_at = ?2 WHERE id = ?3"
        ))
        .bind(value)
        .bind(self.clock.now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock", id));
        }

        debug!(stock_id = %id, column, "Stock field updated");
        required(Self::find(&mut conn, id).await?, "Stock", id)
    }

    // -------------------------------------------------------------------------
    // Connection-level (unit of work)
    // -------------------------------------------------------------------------

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Stock>> {
        let stock = sqlx::query_as::<_, Stock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(stock)
    }

    pub async fn primary_for(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<Stock>> {
        let stock = sqlx::query_as::<_, Stock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE product_id = ?1 ORDER BY created_at, rowid LIMIT 1"
        ))
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(stock)
    }

    /// Applies `quantity += delta` and returns the updated row.
    ///
    /// ## Errors
    /// * `NotFound` - no such stock row
    /// * `InsufficientStock` - the result would be negative (nothing written)
    /// * `Conflict` - the row changed since it was read
    pub async fn adjust(
        conn: &mut SqliteConnection,
        stock_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Stock> {
        let stock = required(Self::find(conn, stock_id).await?, "Stock", stock_id)?;
        if delta == 0 {
            return Ok(stock);
        }

        let quantity = stock.apply_delta(delta)?;

        let result = sqlx::query(
            r#"
            UPDATE stock
            SET quantity = ?1, version = version + 1, updated_at = ?2
            WHERE id = ?3 AND version = ?4
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(stock_id)
        .bind(stock.version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Stock", stock_id));
        }

        debug!(
            stock_id = %stock_id,
            delta,
            before = stock.quantity,
            after = quantity,
            "Stock adjusted"
        );

        Ok(Stock {
            quantity,
            version: stock.version + 1,
            updated_at: now,
            ..stock
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use depot_core::{CoreError, Money, NewProduct};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Laptop".to_string(),
                description: None,
                unit_price: Money::from_major_minor(1500, 0),
            })
            .await
            .unwrap();
        (db, product.id)
    }

    fn new_stock(product_id: &str, location: &str) -> NewStock {
        NewStock {
            product_id: product_id.to_string(),
            quantity: 5,
            location: location.to_string(),
            threshold: 3,
        }
    }

    #[tokio::test]
    async fn test_create_and_primary() {
        let (db, product_id) = setup().await;

        let main = db.stocks().create(new_stock(&product_id, "main")).await.unwrap();
        db.stocks().create(new_stock(&product_id, "annex")).await.unwrap();

        let primary = db.stocks().get_for_product(&product_id).await.unwrap().unwrap();
        assert_eq!(primary.id, main.id);
        assert_eq!(db.stocks().list_for_product(&product_id).await.unwrap().len(), 2);

        let err = db
            .stocks()
            .create(new_stock(&product_id, "main"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_create_requires_product() {
        let (db, _) = setup().await;
        let err = db.stocks().create(new_stock("nope", "main")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_adjust_is_visible_within_unit_of_work() {
        let (db, product_id) = setup().await;
        let stock = db.stocks().create(new_stock(&product_id, "main")).await.unwrap();
        let now = db.clock().now();

        let mut uow = db.begin([product_id.as_str()]).await.unwrap();
        let after = StockRepository::adjust(uow.conn(), &stock.id, 3, now).await.unwrap();
        assert_eq!(after.quantity, 8);
        assert_eq!(after.version, 1);

        let reread = StockRepository::find(uow.conn(), &stock.id).await.unwrap().unwrap();
        assert_eq!(reread.quantity, 8);

        let after = StockRepository::adjust(uow.conn(), &stock.id, -8, now).await.unwrap();
        assert_eq!(after.quantity, 0);
        uow.commit().await.unwrap();

        assert_eq!(db.stocks().get(&stock.id).await.unwrap().unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_adjust_never_goes_negative() {
        let (db, product_id) = setup().await;
        let stock = db.stocks().create(new_stock(&product_id, "main")).await.unwrap();
        let now = db.clock().now();

        let mut uow = db.begin([product_id.as_str()]).await.unwrap();
        let err = StockRepository::adjust(uow.conn(), &stock.id, -6, now)
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                stock_id,
                available,
                requested,
            }) => {
                assert_eq!(stock_id, stock.id);
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        drop(uow);

        assert_eq!(db.stocks().get(&stock.id).await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let (db, product_id) = setup().await;
        let stock = db.stocks().create(new_stock(&product_id, "main")).await.unwrap();
        let now = db.clock().now();

        let mut uow = db.begin([product_id.as_str()]).await.unwrap();
        StockRepository::adjust(uow.conn(), &stock.id, 10, now).await.unwrap();
        drop(uow);

        let stored = db.stocks().get(&stock.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 5);
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn test_field_updates() {
        let (db, product_id) = setup().await;
        let stock = db.stocks().create(new_stock(&product_id, "main")).await.unwrap();

        let updated = db.stocks().set_threshold(&stock.id, 10).await.unwrap();
        assert_eq!(updated.threshold, 10);
        assert_eq!(updated.quantity, 5);

        let updated = db.stocks().set_location(&stock.id, "warehouse-2").await.unwrap();
        assert_eq!(updated.location, "warehouse-2");
        assert_eq!(updated.version, 2);

        assert!(db.stocks().set_threshold(&stock.id, -1).await.is_err());
        assert!(db.stocks().set_threshold("missing", 1).await.unwrap_err().is_not_found());

        db.stocks().delete(&stock.id).await.unwrap();
        assert!(db.stocks().get(&stock.id).await.unwrap().is_none());
    }
}

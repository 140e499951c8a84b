//! # Product Repository
//!
//! Database operations for products and the product↔supplier links.
//!
//! ## Links
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product_suppliers                                                      │
//! │                                                                         │
//! │  iPhone ── Vetri Traders   (linked first  → replenishment source)      │
//! │        └── Kaveri Imports  (linked later)                              │
//! │                                                                         │
//! │  A consumer order short of stock places its compensating order with    │
//! │  the earliest-linked supplier of the product.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::required;
use depot_core::{Clock, NewProduct, Product, ProductPatch, Supplier};

const PRODUCT_COLUMNS: &str = "id, name, description, unit_price_cents, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let phone = repo
///     .create(NewProduct { name: "iPhone".into(), description: None, unit_price: "999.00".parse()? })
///     .await?;
/// repo.link_supplier(&phone.id, &supplier.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ProductRepository { pool, clock }
    }

    /// Creates a product after validating name and price.
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        input.validate()?;

        let now = self.clock.now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            unit_price_cents: input.unit_price.cents(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, unit_price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// Lists all products by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial update.
    ///
    /// A new unit price only affects orders whose quantity is written afterwards.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        patch.validate()?;

        let mut conn = self.pool.acquire().await?;
        let mut product = required(Self::find(&mut conn, id).await?, "Product", id)?;

        if let Some(name) = patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(price) = patch.unit_price {
            product.unit_price_cents = price.cents();
        }
        product.updated_at = self.clock.now();

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?1, description = ?2, unit_price_cents = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price_cents)
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&mut *conn)
        .await?;

        debug!(product_id = %product.id, price_cents = product.unit_price_cents, "Product updated");
        Ok(product)
    }

    /// Deletes a product; its stock rows, orders and links go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Supplier links
    // -------------------------------------------------------------------------

    /// Records that `supplier_id` can replenish `product_id`. Linking twice is a no-op.
    pub async fn link_supplier(&self, product_id: &str, supplier_id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        required(Self::find(&mut conn, product_id).await?, "Product", product_id)?;
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?1")
            .bind(supplier_id)
            .fetch_optional(&mut *conn)
            .await?;
        required(exists, "Supplier", supplier_id)?;

        sqlx::query(
            r#"
            INSERT INTO product_suppliers (product_id, supplier_id, linked_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (product_id, supplier_id) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(supplier_id)
        .bind(self.clock.now())
        .execute(&mut *conn)
        .await?;

        debug!(product_id = %product_id, supplier_id = %supplier_id, "Supplier linked");
        Ok(())
    }

    /// Removes a link; `NotFound` if it did not exist.
    pub async fn unlink_supplier(&self, product_id: &str, supplier_id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM product_suppliers WHERE product_id = ?1 AND supplier_id = ?2")
                .bind(product_id)
                .bind(supplier_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "ProductSupplier",
                format!("{product_id}/{supplier_id}"),
            ));
        }
        Ok(())
    }

    /// Suppliers of a product, earliest-linked first.
    pub async fn suppliers_of(&self, product_id: &str) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT s.id, s.name, s.address, s.contact, s.email, s.created_at, s.updated_at
            FROM suppliers s
            INNER JOIN product_suppliers ps ON ps.supplier_id = s.id
            WHERE ps.product_id = ?1
            ORDER BY ps.linked_at, ps.rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Products a supplier can replenish.
    pub async fn products_of(&self, supplier_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.description, p.unit_price_cents, p.created_at, p.updated_at
            FROM products p
            INNER JOIN product_suppliers ps ON ps.product_id = p.id
            WHERE ps.supplier_id = ?1
            ORDER BY p.name, p.rowid
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    // -------------------------------------------------------------------------
    // Connection-level (unit of work)
    // -------------------------------------------------------------------------

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Supplier that replenishes `product_id`: the earliest linked one.
    pub async fn replenishment_source(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<String>> {
        let supplier_id = sqlx::query_scalar::<_, String>(
            r#"
            SELECT supplier_id FROM product_suppliers
            WHERE product_id = ?1
            ORDER BY linked_at, rowid
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(supplier_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

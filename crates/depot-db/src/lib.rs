//! # depot-db: Database Layer and Reconciliation Engine for Depot
//!
//! This crate owns every write against the inventory database: catalog
//! records, the stock ledger, and the order cascade that keeps the two in
//! step. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Data Flow                                  │
//! │                                                                         │
//! │  API layer (create consumer order)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ OrderCascade  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ Transaction-  │───►│ product/party │    │  (embedded)  │  │   │
//! │  │   │ Recorder      │    │ stock/order/  │    │ 001_initial  │  │   │
//! │  │   └───────┬───────┘    │ transaction   │    └──────────────┘  │   │
//! │  │           │            └───────────────┘                       │   │
//! │  │           ▼                                                     │   │
//! │  │   UnitOfWork = SQLite transaction + StockLocks guard            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL, foreign keys on)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, `DbConfig`, the `Database` handle
//! - [`config`] - Engine settings and environment loading
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`lock`] - Per-product stock locks
//! - [`unit_of_work`] - Transaction + locks, rolled back on drop
//! - [`repository`] - Catalog, stock ledger, order and transaction queries
//! - [`cascade`] - Order cascade (orders and their stock effects)
//! - [`recorder`] - Transaction recorder
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let order = db.cascade().create_consumer_order(new_order).await?;
//! let stock = db.stocks().get(&order.stock_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cascade;
pub mod config;
pub mod error;
pub mod lock;
pub mod migrations;
pub mod pool;
pub mod recorder;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use cascade::OrderCascade;
pub use config::{ConfigError, EngineConfig};
pub use error::{DbError, DbResult};
pub use lock::{StockGuard, StockLocks};
pub use pool::{Database, DbConfig};
pub use recorder::TransactionRecorder;
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::order::{ConsumerOrderRepository, SupplierOrderRepository};
pub use repository::party::{PartyRepository, PartyTable};
pub use repository::product::ProductRepository;
pub use repository::stock::StockRepository;
pub use repository::transaction::{ConsumerTransactionRepository, SupplierTransactionRepository};

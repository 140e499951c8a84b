//! # Repository Module
//!
//! Database repository implementations for Depot.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-level methods (&self)            Connection-level fns (conn)      │
//! │  ──────────────────────────            ───────────────────────────      │
//! │  db.stocks().get(id)                   StockRepository::find(conn, id)  │
//! │  db.products().create(input)           StockRepository::adjust(conn..)  │
//! │       │                                     ▲                           │
//! │       │ acquire a pooled connection         │ uow.conn() inside a       │
//! │       └────────────── delegates ────────────┘ unit of work              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order cascade only ever uses the connection-level functions, so every
//! step of one cascade sees the writes of the previous step.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products and product↔supplier links
//! - [`PartyRepository`](party::PartyRepository) - Suppliers and consumers
//! - [`StockRepository`](stock::StockRepository) - Stock ledger
//! - [`order`] - Supplier / consumer order queries
//! - [`transaction`] - Supplier / consumer transaction queries

pub mod order;
pub mod party;
pub mod product;
pub mod stock;
pub mod transaction;

/// Maps "no row" to a `NotFound` carrying the entity and id.
pub(crate) fn required<T>(row: Option<T>, entity: &str, id: &str) -> crate::error::DbResult<T> {
    row.ok_or_else(|| crate::error::DbError::not_found(entity, id))
}

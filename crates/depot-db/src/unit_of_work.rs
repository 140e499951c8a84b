//! # Unit of Work
//!
//! One SQLite transaction plus the stock locks it runs under.
//!
//! ```text
//! StockLocks::acquire ──► BEGIN IMMEDIATE ──► steps on uow.conn() ──► commit()
//!                                              │
//!                                              └── any `?` → drop → ROLLBACK, unlock
//! ```
//!
//! Every step of a cascade receives the same connection, so each write is
//! visible to the next read inside the unit of work.
//!
//! The transaction takes SQLite's write lock up front. A deferred
//! read-then-write transaction fails with `SQLITE_BUSY_SNAPSHOT`, without
//! waiting, once another connection commits in between.

use std::time::Instant;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::lock::StockGuard;

/// An open transaction holding its stock locks.
///
/// Dropping it without [`commit`](UnitOfWork::commit) rolls back.
#[derive(Debug)]
pub struct UnitOfWork {
    // Field order matters: the rollback is queued before the locks are released.
    tx: Option<Transaction<'static, Sqlite>>,
    guard: Option<StockGuard>,
    started: Instant,
}

impl UnitOfWork {
    /// Begins an immediate transaction under `guard`; waits up to the pool's
    /// `busy_timeout` for SQLite's write lock.
    pub async fn begin(pool: &SqlitePool, guard: Option<StockGuard>) -> DbResult<Self> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        debug!(locks = ?guard.as_ref().map(StockGuard::keys), "Unit of work started");
        Ok(UnitOfWork {
            tx: Some(tx),
            guard,
            started: Instant::now(),
        })
    }

    /// Connection every step of the unit of work runs on.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self.tx.as_mut() {
            Some(tx) => &mut **tx,
            // `tx` is only taken by `commit`, which consumes `self`.
            None => unreachable!("unit of work used after commit"),
        }
    }

    /// Commits and releases the locks.
    pub async fn commit(mut self) -> DbResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        }
        self.guard.take();
        debug!(elapsed_ms = self.started.elapsed().as_millis() as u64, "Unit of work committed");
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Unit of work rolled back"
            );
        }
    }
}

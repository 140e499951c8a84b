//! # Stock Locks
//!
//! In-process single-writer-per-product table.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit of work A: products [p2, p1] ──► sorted [p1, p2] ──► lock p1, p2 │
//! │  unit of work B: products [p1]     ──► waits on p1 until A drops       │
//! │                                        (or `lock_wait` elapses → Busy) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are always taken in sorted order, so two units of work can never hold
//! each other's locks. The whole acquisition shares one deadline.
//!
//! A slot lives only while someone holds or waits on it: releasing the last
//! guard removes it, so the table is bounded by the products in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

type Slot = Arc<AsyncMutex<()>>;
type Slots = Arc<Mutex<HashMap<String, Slot>>>;

/// Per-product async mutexes, created on first use.
#[derive(Debug, Default)]
pub struct StockLocks {
    slots: Slots,
}

/// Held locks; released on drop.
#[derive(Debug)]
pub struct StockGuard {
    keys: Vec<String>,
    held: Vec<OwnedMutexGuard<()>>,
    slots: Slots,
}

impl StockGuard {
    /// Product ids this guard holds, sorted.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for StockGuard {
    fn drop(&mut self) {
        self.held.clear();
        prune(&self.slots, &self.keys);
    }
}

impl StockLocks {
    pub fn new() -> Self {
        StockLocks::default()
    }

    /// Locks every product in `keys`, waiting at most `wait` overall.
    pub async fn acquire<I, S>(&self, keys: I, wait: Duration) -> DbResult<StockGuard>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();

        let deadline = Instant::now() + wait;
        let mut held = Vec::with_capacity(keys.len());

        for key in &keys {
            let slot = self.slot(key);
            match tokio::time::timeout_at(deadline, slot.lock_owned()).await {
                Ok(guard) => held.push(guard),
                Err(_) => {
                    drop(held);
                    prune(&self.slots, &keys);
                    warn!(product_id = %key, wait_ms = wait.as_millis() as u64, "Stock lock wait exceeded");
                    return Err(DbError::busy(format!("stock of product {key}"), wait));
                }
            }
        }

        debug!(keys = ?keys, "Stock locks acquired");
        Ok(StockGuard {
            keys,
            held,
            slots: Arc::clone(&self.slots),
        })
    }

    /// Number of products currently held or waited on.
    pub fn in_flight(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }
}

/// Drops the slots of `keys` that only the table still references.
fn prune(slots: &Slots, keys: &[String]) {
    let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
    for key in keys {
        if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keys_sorted_and_deduplicated() {
        let locks = StockLocks::new();
        let guard = locks
            .acquire(["p2", "p1", "p2"], Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(guard.keys(), ["p1".to_string(), "p2".to_string()]);
    }

    #[tokio::test]
    async fn test_second_holder_times_out() {
        let locks = StockLocks::new();
        let _held = locks.acquire(["p1"], Duration::from_millis(50)).await.unwrap();

        let err = locks
            .acquire(["p1"], Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Busy { waited_ms: Some(30), .. }));

        // Unrelated product is unaffected.
        assert!(locks.acquire(["p9"], Duration::from_millis(30)).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_on_drop() {
        let locks = StockLocks::new();
        let held = locks.acquire(["p1"], Duration::from_millis(50)).await.unwrap();
        drop(held);
        assert!(locks.acquire(["p1"], Duration::from_millis(50)).await.is_ok());
    }

    #[tokio::test]
    async fn test_released_slots_are_removed() {
        let locks = StockLocks::new();
        for i in 0..100 {
            let guard = locks
                .acquire([format!("p{i}"), format!("q{i}")], Duration::from_millis(50))
                .await
                .unwrap();
            assert_eq!(locks.in_flight(), 2);
            drop(guard);
        }
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_slot_kept_while_another_task_waits() {
        let locks = Arc::new(StockLocks::new());
        let held = locks.acquire(["p1"], Duration::from_millis(50)).await.unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let guard = locks.acquire(["p1"], Duration::from_secs(2)).await?;
                Ok::<usize, DbError>(guard.keys().len())
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The waiter still references the slot, so releasing keeps it.
        drop(held);
        assert_eq!(waiter.await.unwrap().unwrap(), 1);
        assert_eq!(locks.in_flight(), 0);

        // A timed-out acquisition leaves nothing behind either.
        let _held = locks.acquire(["p2"], Duration::from_millis(50)).await.unwrap();
        assert!(locks.acquire(["p1", "p2"], Duration::from_millis(20)).await.is_err());
        assert_eq!(locks.in_flight(), 1);
    }
}

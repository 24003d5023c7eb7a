//! Per-item stock counters.
//!
//! `reserve` is the single atomic primitive in the system: the
//! read / lazy-initialize / check / decrement sequence is indivisible with
//! respect to concurrent callers on the same item. All stock mutation goes
//! through it; no other code path may read-modify-write a counter.

mod in_memory;
mod redis_script;

pub use in_memory::InMemoryStockStore;
pub use redis_script::RedisStockStore;

use orderflow_core::Reservation;

#[derive(Debug, thiserror::Error)]
pub enum StockStoreError {
    #[error("stock store connection error: {0}")]
    Connection(String),

    #[error("stock store command error: {0}")]
    Command(String),
}

/// Store holding one counter per item.
pub trait StockStore: Send + Sync {
    /// Current stock for `item`; `None` if the item has never been seen.
    fn level(&self, item: &str) -> Result<Option<i64>, StockStoreError>;

    /// Atomically reserve `quantity` units of `item`.
    ///
    /// An unseen item is first initialized to `default_stock`. Callers
    /// validate `quantity >= 0` before reaching the store; zero is a valid
    /// no-op returning the current level as remaining.
    fn reserve(
        &self,
        item: &str,
        quantity: i64,
        default_stock: i64,
    ) -> Result<Reservation, StockStoreError>;
}

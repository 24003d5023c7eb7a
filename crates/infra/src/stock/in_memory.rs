use std::collections::HashMap;
use std::sync::Mutex;

use orderflow_core::Reservation;

use super::{StockStore, StockStoreError};

/// In-memory stock store for dev/test.
///
/// The mutex makes `reserve` atomic within one process; deployments with
/// multiple service instances need the Redis store.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    levels: Mutex<HashMap<String, i64>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for InMemoryStockStore {
    fn level(&self, item: &str) -> Result<Option<i64>, StockStoreError> {
        let levels = self
            .levels
            .lock()
            .map_err(|_| StockStoreError::Command("stock table lock poisoned".to_string()))?;
        Ok(levels.get(item).copied())
    }

    fn reserve(
        &self,
        item: &str,
        quantity: i64,
        default_stock: i64,
    ) -> Result<Reservation, StockStoreError> {
        let mut levels = self
            .levels
            .lock()
            .map_err(|_| StockStoreError::Command("stock table lock poisoned".to_string()))?;

        let current = *levels.entry(item.to_string()).or_insert(default_stock);
        if current < quantity {
            return Ok(Reservation::Insufficient { remaining: current });
        }

        let remaining = current - quantity;
        levels.insert(item.to_string(), remaining);
        Ok(Reservation::Reserved { remaining })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_reservation_initializes_to_default() {
        let store = InMemoryStockStore::new();
        assert_eq!(store.level("widget").unwrap(), None);

        let outcome = store.reserve("widget", 30, 100).unwrap();
        assert_eq!(outcome, Reservation::Reserved { remaining: 70 });
        assert_eq!(store.level("widget").unwrap(), Some(70));
    }

    #[test]
    fn zero_quantity_is_a_no_op() {
        let store = InMemoryStockStore::new();
        let outcome = store.reserve("widget", 0, 100).unwrap();
        assert_eq!(outcome, Reservation::Reserved { remaining: 100 });
        assert_eq!(store.level("widget").unwrap(), Some(100));
    }

    #[test]
    fn insufficient_leaves_stock_unchanged() {
        let store = InMemoryStockStore::new();
        store.reserve("widget", 90, 100).unwrap();

        let outcome = store.reserve("widget", 11, 100).unwrap();
        assert_eq!(outcome, Reservation::Insufficient { remaining: 10 });
        assert_eq!(store.level("widget").unwrap(), Some(10));
    }

    #[test]
    fn concurrent_reservations_never_go_negative() {
        let store = Arc::new(InMemoryStockStore::new());
        let threads = 8;
        let attempts_per_thread = 25;
        let initial = 100;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    let mut successes = 0;
                    for _ in 0..attempts_per_thread {
                        let outcome = store.reserve("widget", 1, initial).unwrap();
                        assert!(outcome.remaining() >= 0);
                        if outcome.is_reserved() {
                            successes += 1;
                        }
                    }
                    successes
                })
            })
            .collect();

        let total_reserved: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let remaining = store.level("widget").unwrap().unwrap();

        // 8 * 25 = 200 attempts against 100 units: exactly the initial stock
        // is handed out, and the books balance.
        assert_eq!(total_reserved, initial);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn concurrent_first_access_initializes_exactly_once() {
        let store = Arc::new(InMemoryStockStore::new());
        let threads = 8;
        let initial = 50;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.reserve("fresh", 1, initial).unwrap())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_reserved());
        }

        // Had any racing first access re-initialized the counter, decrements
        // would have been lost and the level would sit above this.
        assert_eq!(store.level("fresh").unwrap(), Some(initial - threads));
    }

    proptest! {
        /// For any sequence of reservation quantities, stock never goes
        /// negative and successful decrements plus the final level equal the
        /// initial stock.
        #[test]
        fn reservations_conserve_stock(
            quantities in prop::collection::vec(0i64..40, 1..50),
            initial in 0i64..200,
        ) {
            let store = InMemoryStockStore::new();
            let mut reserved_total = 0;

            for quantity in quantities {
                let outcome = store.reserve("widget", quantity, initial).unwrap();
                prop_assert!(outcome.remaining() >= 0);
                if outcome.is_reserved() {
                    reserved_total += quantity;
                }
            }

            let remaining = store.level("widget").unwrap().unwrap();
            prop_assert_eq!(reserved_total + remaining, initial);
        }
    }
}

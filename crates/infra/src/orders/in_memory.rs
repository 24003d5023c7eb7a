use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use orderflow_core::{NewOrder, Order, OrderId};

use super::{OrderStore, OrderStoreError};

/// In-memory order store for dev/test. Ids are assigned sequentially
/// starting at 1, matching the database sequence.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    rows: Mutex<Vec<Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Order> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn ensure_schema(&self) -> Result<(), OrderStoreError> {
        Ok(())
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderStoreError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| OrderStoreError::new("insert", "order table lock poisoned"))?;

        let order = Order {
            id: OrderId(rows.len() as i64 + 1),
            item: order.item().to_string(),
            quantity: order.quantity(),
            created_at: Utc::now(),
        };
        rows.push(order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let store = InMemoryOrderStore::new();
        let first = store
            .insert(&NewOrder::new("widget", 5).unwrap())
            .await
            .unwrap();
        let second = store
            .insert(&NewOrder::new("gadget", 2).unwrap())
            .await
            .unwrap();

        assert_eq!(first.id, OrderId(1));
        assert_eq!(second.id, OrderId(2));
        assert_eq!(store.all().len(), 2);
    }
}

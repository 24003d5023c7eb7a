//! Durable order rows.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

use async_trait::async_trait;

use orderflow_core::{NewOrder, Order};

#[derive(Debug, thiserror::Error)]
pub enum OrderStoreError {
    #[error("order store error in {operation}: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },
}

impl OrderStoreError {
    fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            message: message.into(),
        }
    }
}

/// Store for order rows.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Idempotent create-if-missing, run once at startup (never per request).
    async fn ensure_schema(&self) -> Result<(), OrderStoreError>;

    /// Persist a validated order and return the stored row with its
    /// store-assigned id. On failure no partial order is visible.
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderStoreError>;
}

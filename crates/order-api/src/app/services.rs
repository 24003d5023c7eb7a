use std::sync::Arc;

use anyhow::Context;

use orderflow_channel::{InMemoryQueue, MessageQueue};
use orderflow_core::{NewOrder, Order, OrderCreated};
use orderflow_infra::orders::{
    InMemoryOrderStore, OrderStore, OrderStoreError, PostgresOrderStore,
};
use orderflow_infra::queue::RedisStreamQueue;
use orderflow_observability::metrics::PipelineMetrics;

use crate::config::OrderApiConfig;

#[derive(Debug, thiserror::Error)]
pub enum CreateOrderError {
    #[error("order storage failed: {0}")]
    Storage(#[from] OrderStoreError),

    #[error("event publish failed: {0}")]
    Publish(String),
}

/// Store + queue wiring for the order role.
pub enum AppServices {
    InMemory {
        orders: Arc<InMemoryOrderStore>,
        queue: Arc<InMemoryQueue>,
    },
    Persistent {
        orders: Arc<PostgresOrderStore>,
        queue: Arc<RedisStreamQueue>,
    },
}

pub async fn build_services(config: &OrderApiConfig) -> anyhow::Result<AppServices> {
    if config.persistent {
        build_persistent_services(config).await
    } else {
        Ok(build_in_memory_services())
    }
}

/// Local-fallback wiring (dev/test): in-memory store + queue.
pub fn build_in_memory_services() -> AppServices {
    AppServices::InMemory {
        orders: Arc::new(InMemoryOrderStore::new()),
        queue: Arc::new(InMemoryQueue::new()),
    }
}

async fn build_persistent_services(config: &OrderApiConfig) -> anyhow::Result<AppServices> {
    let database = config
        .database
        .as_ref()
        .context("database configuration missing")?;

    let orders = PostgresOrderStore::connect(&database.url)
        .await
        .context("failed to connect to Postgres")?;
    // Table existence is ensured once at startup, not per request.
    orders
        .ensure_schema()
        .await
        .context("failed to ensure orders schema")?;

    let queue = RedisStreamQueue::connect(
        &config.broker.url,
        OrderCreated::QUEUE,
        config.broker.retry,
    )
    .context("failed to connect to the event channel")?;

    Ok(AppServices::Persistent {
        orders: Arc::new(orders),
        queue: Arc::new(queue),
    })
}

impl AppServices {
    /// Write the order, bump the created counter, then publish the
    /// `order_created` event.
    ///
    /// There is no two-phase coordination between the database commit and
    /// the publish: a publish failure (or a crash in between) leaves an
    /// order row without an event. The failure is surfaced to the caller.
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order, CreateOrderError> {
        match self {
            AppServices::InMemory { orders, queue } => {
                let order = orders.insert(&new_order).await?;
                PipelineMetrics::record_order_created();
                publish_event(queue.as_ref(), &order)?;
                Ok(order)
            }
            AppServices::Persistent { orders, queue } => {
                let order = orders.insert(&new_order).await?;
                PipelineMetrics::record_order_created();

                // Sync redis IO stays off the runtime threads.
                let queue = queue.clone();
                let published = order.clone();
                tokio::task::spawn_blocking(move || publish_event(queue.as_ref(), &published))
                    .await
                    .map_err(|e| CreateOrderError::Publish(e.to_string()))??;
                Ok(order)
            }
        }
    }
}

fn publish_event<Q: MessageQueue>(queue: &Q, order: &Order) -> Result<(), CreateOrderError> {
    let event = OrderCreated::for_order(order);
    let payload =
        serde_json::to_string(&event).map_err(|e| CreateOrderError::Publish(e.to_string()))?;

    queue.publish(&payload).map_err(|e| {
        PipelineMetrics::record_publish_error();
        CreateOrderError::Publish(format!("{e:?}"))
    })
}

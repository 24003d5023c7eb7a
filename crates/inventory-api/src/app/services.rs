use std::sync::Arc;

use anyhow::Context;

use orderflow_channel::{AckPolicy, ConsumeLoop, ConsumerHandle, InMemoryQueue, MessageQueue};
use orderflow_core::{OrderCreated, Reservation};
use orderflow_infra::queue::RedisStreamQueue;
use orderflow_infra::stock::{
    InMemoryStockStore, RedisStockStore, StockStore, StockStoreError,
};

use crate::config::InventoryApiConfig;
use crate::consumer;

/// Store + queue wiring for the inventory role.
pub enum AppServices {
    InMemory {
        stock: Arc<InMemoryStockStore>,
        queue: Arc<InMemoryQueue>,
        default_stock: i64,
    },
    Persistent {
        stock: Arc<RedisStockStore>,
        queue: Arc<RedisStreamQueue>,
        default_stock: i64,
    },
}

pub fn build_services(config: &InventoryApiConfig) -> anyhow::Result<AppServices> {
    if config.persistent {
        build_persistent_services(config)
    } else {
        Ok(build_in_memory_services(config.default_stock))
    }
}

/// Local-fallback wiring (dev/test): in-memory stock store + queue.
pub fn build_in_memory_services(default_stock: i64) -> AppServices {
    AppServices::InMemory {
        stock: Arc::new(InMemoryStockStore::new()),
        queue: Arc::new(InMemoryQueue::new()),
        default_stock,
    }
}

fn build_persistent_services(config: &InventoryApiConfig) -> anyhow::Result<AppServices> {
    let stock = RedisStockStore::connect(&config.stock_url)
        .context("failed to connect to the stock store")?;

    let queue = RedisStreamQueue::connect(
        &config.broker.url,
        OrderCreated::QUEUE,
        config.broker.retry,
    )
    .context("failed to connect to the event channel")?;

    Ok(AppServices::Persistent {
        stock: Arc::new(stock),
        queue: Arc::new(queue),
        default_stock: config.default_stock,
    })
}

impl AppServices {
    /// Current stock for `item`; an item never reserved reads as 0.
    pub async fn stock_level(&self, item: &str) -> Result<i64, StockStoreError> {
        match self {
            AppServices::InMemory { stock, .. } => Ok(stock.level(item)?.unwrap_or(0)),
            AppServices::Persistent { stock, .. } => {
                let stock = stock.clone();
                let item = item.to_string();
                run_blocking(move || stock.level(&item)).await.map(|level| level.unwrap_or(0))
            }
        }
    }

    /// Atomically reserve stock. Validation (`quantity >= 0`) happens at the
    /// HTTP boundary; the store is the only mutation path.
    pub async fn reserve(&self, item: String, quantity: i64) -> Result<Reservation, StockStoreError> {
        match self {
            AppServices::InMemory {
                stock,
                default_stock,
                ..
            } => stock.reserve(&item, quantity, *default_stock),
            AppServices::Persistent {
                stock,
                default_stock,
                ..
            } => {
                let stock = stock.clone();
                let default_stock = *default_stock;
                run_blocking(move || stock.reserve(&item, quantity, default_stock)).await
            }
        }
    }

    /// Spawn the `order_created` consume loop. It runs for the process
    /// lifetime alongside the HTTP server; the returned handle is only used
    /// by tests for graceful shutdown.
    pub fn spawn_consumer(&self, ack: AckPolicy) -> anyhow::Result<ConsumerHandle> {
        match self {
            AppServices::InMemory { queue, .. } => {
                let consumer = queue
                    .consumer(consumer::CONSUMER_GROUP)
                    .map_err(|e| anyhow::anyhow!("failed to open consumer: {e:?}"))?;
                Ok(ConsumeLoop::spawn(
                    "inventory.consumer",
                    consumer,
                    ack,
                    consumer::handle_order_message,
                ))
            }
            AppServices::Persistent { queue, .. } => {
                let consumer = queue
                    .consumer(consumer::CONSUMER_GROUP)
                    .map_err(|e| anyhow::anyhow!("failed to open consumer: {e:?}"))?;
                Ok(ConsumeLoop::spawn(
                    "inventory.consumer",
                    consumer,
                    ack,
                    consumer::handle_order_message,
                ))
            }
        }
    }
}

/// Sync redis IO stays off the runtime threads.
async fn run_blocking<T, F>(f: F) -> Result<T, StockStoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StockStoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StockStoreError::Command(format!("blocking task failed: {e}")))?
}

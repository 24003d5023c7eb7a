//! Inventory role configuration, read from the environment.

use std::time::Duration;

use anyhow::Context;

use orderflow_channel::RetryPolicy;

#[derive(Debug, Clone)]
pub struct InventoryApiConfig {
    pub bind_addr: String,
    /// `USE_PERSISTENT_STORES`: when false (the default), the service runs
    /// in the local-fallback mode with an in-memory stock store and queue.
    pub persistent: bool,
    /// Stock store endpoint (`REDIS_HOST`/`REDIS_PORT`).
    pub stock_url: String,
    /// Initial stock assigned to an item on its first reservation attempt
    /// (`DEFAULT_STOCK`).
    pub default_stock: i64,
    pub broker: BrokerConfig,
}

impl InventoryApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("PORT", "5001");

        let stock_host = env_or("REDIS_HOST", "inventory-db");
        let stock_port = env_or("REDIS_PORT", "6379");

        let default_stock: i64 = env_or("DEFAULT_STOCK", "100")
            .parse()
            .context("DEFAULT_STOCK must be an integer")?;

        Ok(Self {
            bind_addr: format!("0.0.0.0:{port}"),
            persistent: env_flag("USE_PERSISTENT_STORES"),
            stock_url: format!("redis://{stock_host}:{stock_port}"),
            default_stock,
            broker: BrokerConfig::from_env()?,
        })
    }
}

/// Channel endpoint and the retry policy for establishing its connection.
/// The consume side carries its own policy, independent of the publish side.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub url: String,
    pub retry: RetryPolicy,
}

impl BrokerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("BROKER_URL").unwrap_or_else(|_| {
            let host = env_or("BROKER_HOST", "broker");
            let port = env_or("BROKER_PORT", "6379");
            format!("redis://{host}:{port}")
        });

        let max_attempts: u32 = env_or("BROKER_MAX_RETRIES", "10")
            .parse()
            .context("BROKER_MAX_RETRIES must be an integer")?;
        let base_secs: u64 = env_or("BROKER_RETRY_BASE", "2")
            .parse()
            .context("BROKER_RETRY_BASE must be an integer")?;

        Ok(Self {
            url,
            retry: RetryPolicy::new(max_attempts, Duration::from_secs(base_secs)),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false)
}

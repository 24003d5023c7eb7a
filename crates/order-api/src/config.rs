//! Order role configuration, read from the environment.

use std::time::Duration;

use anyhow::Context;

use orderflow_channel::RetryPolicy;

#[derive(Debug, Clone)]
pub struct OrderApiConfig {
    pub bind_addr: String,
    /// `USE_PERSISTENT_STORES`: when false (the default), the service runs
    /// in the local-fallback mode with in-memory stores and queue, requiring
    /// no external services.
    pub persistent: bool,
    /// Present only in persistent mode; missing required parameters abort
    /// startup there.
    pub database: Option<DatabaseConfig>,
    pub broker: BrokerConfig,
}

impl OrderApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("PORT", "5000");
        let persistent = env_flag("USE_PERSISTENT_STORES");
        let database = if persistent {
            Some(DatabaseConfig::from_env()?)
        } else {
            None
        };

        Ok(Self {
            bind_addr: format!("0.0.0.0:{port}"),
            persistent,
            database,
            broker: BrokerConfig::from_env()?,
        })
    }
}

/// Database connection parameters. `DB_URL` wins; otherwise the individual
/// parameters are required (no hidden defaults) except `DB_PORT`.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    fn from_env() -> anyhow::Result<Self> {
        if let Ok(url) = std::env::var("DB_URL") {
            return Ok(Self { url });
        }

        let name = std::env::var("DB_NAME").context("DB_NAME is required (or set DB_URL)")?;
        let user = std::env::var("DB_USER").context("DB_USER is required (or set DB_URL)")?;
        let password =
            std::env::var("DB_PASSWORD").context("DB_PASSWORD is required (or set DB_URL)")?;
        let host = std::env::var("DB_HOST").context("DB_HOST is required (or set DB_URL)")?;
        let port = env_or("DB_PORT", "5432");

        Ok(Self {
            url: format!("postgres://{user}:{password}@{host}:{port}/{name}"),
        })
    }
}

/// Channel endpoint and the retry policy for establishing its connection.
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

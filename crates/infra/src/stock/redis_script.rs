use std::sync::Arc;

use orderflow_core::Reservation;

use super::{StockStore, StockStoreError};

/// Server-side reservation script.
///
/// Runs in Redis so the sequence is atomic across service instances, not
/// just within this process. Returns `{1, remaining}` when the decrement
/// happened and `{0, current}` when stock was insufficient, so the caller
/// always gets the atomically-observed level.
const RESERVE_SCRIPT: &str = r#"
local key = KEYS[1]
local qty = tonumber(ARGV[1])
local default = tonumber(ARGV[2])
local cur = redis.call('GET', key)
if not cur then
  cur = default
  redis.call('SET', key, cur)
else
  cur = tonumber(cur)
end
if cur < qty then
  return {0, cur}
end
return {1, redis.call('DECRBY', key, qty)}
"#;

/// Redis-backed stock store.
///
/// Connections are opened per operation; the client itself is cheap to clone
/// and safe to share.
#[derive(Debug, Clone)]
pub struct RedisStockStore {
    client: Arc<redis::Client>,
}

impl RedisStockStore {
    pub fn connect(url: &str) -> Result<Self, StockStoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StockStoreError::Connection(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    fn connection(&self) -> Result<redis::Connection, StockStoreError> {
        self.client
            .get_connection()
            .map_err(|e| StockStoreError::Connection(e.to_string()))
    }
}

impl StockStore for RedisStockStore {
    fn level(&self, item: &str) -> Result<Option<i64>, StockStoreError> {
        let mut conn = self.connection()?;
        redis::cmd("GET")
            .arg(item)
            .query(&mut conn)
            .map_err(|e| StockStoreError::Command(format!("GET failed: {e}")))
    }

    fn reserve(
        &self,
        item: &str,
        quantity: i64,
        default_stock: i64,
    ) -> Result<Reservation, StockStoreError> {
        let mut conn = self.connection()?;
        let (reserved, remaining): (i64, i64) = redis::Script::new(RESERVE_SCRIPT)
            .key(item)
            .arg(quantity)
            .arg(default_stock)
            .invoke(&mut conn)
            .map_err(|e| StockStoreError::Command(format!("reservation script failed: {e}")))?;

        Ok(if reserved == 1 {
            Reservation::Reserved { remaining }
        } else {
            Reservation::Insufficient { remaining }
        })
    }
}

//! Redis-Streams-backed message queue (durable, at-least-once delivery).
//!
//! A single stream holds the queue; `XADD` publishes, `XREADGROUP` pulls for
//! a consumer group (each message goes to one consumer per group), `XACK`
//! acknowledges. Connection objects are never shared: the producer side opens
//! a fresh connection per publish, the consumer owns one connection for its
//! lifetime.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use orderflow_channel::{
    ConnectError, Delivery, MessageQueue, QueueConsumer, RetryPolicy, connect_with_retry,
};

#[derive(Debug, thiserror::Error)]
pub enum RedisQueueError {
    #[error("redis connection error: {0}")]
    Connection(String),

    #[error("redis command error: {0}")]
    Command(String),

    #[error("malformed stream entry: {0}")]
    Entry(String),

    #[error(transparent)]
    Connect(#[from] ConnectError<redis::RedisError>),
}

#[derive(Debug, Clone)]
pub struct RedisStreamQueue {
    client: Arc<redis::Client>,
    stream_key: String,
}

impl RedisStreamQueue {
    /// Open a client for `url` and verify connectivity, retrying per
    /// `policy`. Exhaustion is fatal: the caller cannot perform its core
    /// function without the channel and must terminate.
    pub fn connect(
        url: &str,
        stream_key: &str,
        policy: RetryPolicy,
    ) -> Result<Self, RedisQueueError> {
        let client =
            redis::Client::open(url).map_err(|e| RedisQueueError::Connection(e.to_string()))?;

        // Each attempt opens a fresh connection and pings it; nothing is
        // kept across attempts.
        connect_with_retry(url, &policy, || {
            let mut conn = client.get_connection()?;
            redis::cmd("PING").query::<String>(&mut conn)?;
            Ok::<_, redis::RedisError>(conn)
        })?;

        debug!(stream_key = %stream_key, "channel connection established");
        Ok(Self {
            client: Arc::new(client),
            stream_key: stream_key.to_string(),
        })
    }

    fn connection(&self) -> Result<redis::Connection, RedisQueueError> {
        self.client
            .get_connection()
            .map_err(|e| RedisQueueError::Connection(e.to_string()))
    }
}

impl MessageQueue for RedisStreamQueue {
    type Error = RedisQueueError;
    type Consumer = RedisStreamConsumer;

    /// `XADD` with an auto-generated id; a fresh connection per publish.
    fn publish(&self, payload: &str) -> Result<(), Self::Error> {
        let mut conn = self.connection()?;
        let _: String = redis::cmd("XADD")
            .arg(&self.stream_key)
            .arg("*")
            .arg("payload")
            .arg(payload)
            .query(&mut conn)
            .map_err(|e| RedisQueueError::Command(format!("XADD failed: {e}")))?;
        Ok(())
    }

    fn consumer(&self, group: &str) -> Result<Self::Consumer, Self::Error> {
        let mut conn = self.connection()?;

        // XGROUP CREATE with MKSTREAM creates the stream if missing; an
        // already-existing group returns BUSYGROUP, which we ignore.
        let _: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_key)
            .arg(group)
            .arg("0")
            .arg("MKSTREAM")
            .query(&mut conn);

        Ok(RedisStreamConsumer {
            conn,
            stream_key: self.stream_key.clone(),
            group: group.to_string(),
            name: format!("consumer-{}", uuid::Uuid::now_v7()),
        })
    }
}

/// Consuming end of the stream; owns its connection.
pub struct RedisStreamConsumer {
    conn: redis::Connection,
    stream_key: String,
    group: String,
    name: String,
}

impl QueueConsumer for RedisStreamConsumer {
    type Error = RedisQueueError;

    fn receive(&mut self, timeout: Duration) -> Result<Option<Delivery>, Self::Error> {
        // BLOCK 0 would block forever; clamp to at least 1ms.
        let block_ms = (timeout.as_millis() as u64).max(1);

        let reply: redis::Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(&self.name)
            .arg("COUNT")
            .arg(1usize)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.stream_key)
            .arg(">")
            .query(&mut self.conn)
            .map_err(|e| RedisQueueError::Command(format!("XREADGROUP failed: {e}")))?;

        parse_read_reply(reply)
    }

    fn ack(&mut self, delivery_id: &str) -> Result<(), Self::Error> {
        let _: u64 = redis::cmd("XACK")
            .arg(&self.stream_key)
            .arg(&self.group)
            .arg(delivery_id)
            .query(&mut self.conn)
            .map_err(|e| RedisQueueError::Command(format!("XACK failed: {e}")))?;
        Ok(())
    }
}

/// Parse an XREADGROUP reply into at most one delivery.
///
/// Reply shape: `[[stream_key, [[entry_id, [field, value, ...]], ...]], ...]`
/// or `Nil` on blocking timeout.
fn parse_read_reply(reply: redis::Value) -> Result<Option<Delivery>, RedisQueueError> {
    let streams = match reply {
        redis::Value::Nil => return Ok(None),
        redis::Value::Bulk(streams) => streams,
        other => return Err(entry_error("unexpected reply type", &other)),
    };

    let Some(stream) = streams.into_iter().next() else {
        return Ok(None);
    };
    let entries = match stream {
        redis::Value::Bulk(mut pair) if pair.len() == 2 => pair.remove(1),
        other => return Err(entry_error("unexpected stream element", &other)),
    };
    let Some(entry) = (match entries {
        redis::Value::Bulk(entries) => entries.into_iter().next(),
        other => return Err(entry_error("unexpected entry list", &other)),
    }) else {
        return Ok(None);
    };

    let (id_value, fields_value) = match entry {
        redis::Value::Bulk(mut pair) if pair.len() == 2 => {
            let fields = pair.remove(1);
            (pair.remove(0), fields)
        }
        other => return Err(entry_error("unexpected entry shape", &other)),
    };

    let id = match id_value {
        redis::Value::Data(data) => String::from_utf8_lossy(&data).to_string(),
        other => return Err(entry_error("unexpected entry id", &other)),
    };

    let fields = match fields_value {
        redis::Value::Bulk(fields) => fields,
        other => return Err(entry_error("unexpected field list", &other)),
    };
    for chunk in fields.chunks(2) {
        if let [redis::Value::Data(key), redis::Value::Data(value)] = chunk {
            if key.as_slice() == b"payload" {
                return Ok(Some(Delivery {
                    id,
                    payload: String::from_utf8_lossy(value).to_string(),
                }));
            }
        }
    }

    Err(RedisQueueError::Entry(format!(
        "entry {id} is missing the payload field"
    )))
}

fn entry_error(context: &str, value: &redis::Value) -> RedisQueueError {
    RedisQueueError::Entry(format!("{context}: {value:?}"))
}

mod redis_streams;

pub use redis_streams::{RedisQueueError, RedisStreamConsumer, RedisStreamQueue};

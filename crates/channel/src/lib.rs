//! `orderflow-channel` — event channel mechanics.
//!
//! Transport-agnostic pieces of the order/inventory pipeline:
//! - connection establishment with a configurable backoff policy
//! - the queue abstraction (publish, explicit receive, explicit ack)
//! - an in-memory queue for dev/test
//! - the long-lived consume loop worker
//!
//! The Redis Streams implementation lives in `orderflow-infra`.

pub mod backoff;
pub mod consume;
pub mod in_memory;
pub mod queue;

pub use backoff::{ConnectError, RetryPolicy, connect_with_retry};
pub use consume::{ConsumeLoop, ConsumerHandle};
pub use in_memory::InMemoryQueue;
pub use queue::{AckPolicy, Delivery, MessageQueue, QueueConsumer};

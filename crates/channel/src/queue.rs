//! Message queue abstraction (publish / explicit receive / explicit ack).
//!
//! The queue delivers each message to one consumer per group, at least once,
//! unordered across instances. Acknowledgment is a separate explicit step so
//! the auto-ack vs. ack-after-processing tradeoff is a visible configuration
//! choice ([`AckPolicy`]) rather than implicit transport behavior.

use std::time::Duration;

/// A message pulled from the queue, not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Transport-assigned delivery id, used to acknowledge.
    pub id: String,
    /// Raw message body. Consumers parse it; a malformed body fails only
    /// that one message.
    pub payload: String,
}

/// When the consume loop acknowledges a delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AckPolicy {
    /// Acknowledge immediately on receipt: a crash during processing loses
    /// the message with no redelivery. This is the default semantics of the
    /// pipeline; handlers must be idempotent so correctness never depends on
    /// delivery guarantees.
    #[default]
    OnReceipt,
    /// Acknowledge only after the handler succeeds; a failed delivery stays
    /// pending for redelivery.
    AfterProcessing,
}

/// Producer/consumer handle to a named queue.
pub trait MessageQueue: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;
    type Consumer: QueueConsumer<Error = Self::Error>;

    /// Append a message to the queue.
    ///
    /// Failures surface to the caller; they are never silently dropped.
    fn publish(&self, payload: &str) -> Result<(), Self::Error>;

    /// Open a consumer in `group`. Each message is delivered to one consumer
    /// per group (work-queue semantics).
    fn consumer(&self, group: &str) -> Result<Self::Consumer, Self::Error>;
}

/// Single-threaded consuming end of a queue.
///
/// Not safe for unsynchronized sharing; confine each consumer to one task
/// (the consume loop owns it).
pub trait QueueConsumer: Send {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Block for up to `timeout` waiting for the next delivery.
    /// Returns `Ok(None)` when the wait times out.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Delivery>, Self::Error>;

    /// Mark a delivery processed. Acknowledging an unknown id is a no-op.
    fn ack(&mut self, delivery_id: &str) -> Result<(), Self::Error>;
}

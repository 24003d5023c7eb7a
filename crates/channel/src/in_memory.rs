//! In-memory queue for tests/dev.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::queue::{Delivery, MessageQueue, QueueConsumer};

#[derive(Debug)]
pub enum InMemoryQueueError {
    /// An internal lock was poisoned.
    Poisoned,
}

/// In-memory work queue.
///
/// - No IO / no async
/// - Work-queue semantics: each message goes to exactly one consumer
/// - Unacked deliveries stay in the pending set but are not redelivered
///   (good enough for tests; the Redis implementation redelivers)
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    ready: Mutex<VecDeque<Delivery>>,
    available: Condvar,
    pending: Mutex<HashMap<String, Delivery>>,
    next_id: AtomicU64,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting to be received.
    pub fn ready_count(&self) -> usize {
        self.inner.ready.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Number of received but unacknowledged deliveries.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl MessageQueue for InMemoryQueue {
    type Error = InMemoryQueueError;
    type Consumer = InMemoryConsumer;

    fn publish(&self, payload: &str) -> Result<(), Self::Error> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut ready = self
            .inner
            .ready
            .lock()
            .map_err(|_| InMemoryQueueError::Poisoned)?;
        ready.push_back(Delivery {
            id: id.to_string(),
            payload: payload.to_string(),
        });
        self.inner.available.notify_one();
        Ok(())
    }

    fn consumer(&self, _group: &str) -> Result<Self::Consumer, Self::Error> {
        Ok(InMemoryConsumer {
            inner: self.inner.clone(),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryConsumer {
    inner: Arc<Inner>,
}

impl QueueConsumer for InMemoryConsumer {
    type Error = InMemoryQueueError;

    fn receive(&mut self, timeout: Duration) -> Result<Option<Delivery>, Self::Error> {
        let deadline = Instant::now() + timeout;
        let mut ready = self
            .inner
            .ready
            .lock()
            .map_err(|_| InMemoryQueueError::Poisoned)?;

        loop {
            if let Some(delivery) = ready.pop_front() {
                self.inner
                    .pending
                    .lock()
                    .map_err(|_| InMemoryQueueError::Poisoned)?
                    .insert(delivery.id.clone(), delivery.clone());
                return Ok(Some(delivery));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let (guard, _timeout_result) = self
                .inner
                .available
                .wait_timeout(ready, deadline - now)
                .map_err(|_| InMemoryQueueError::Poisoned)?;
            ready = guard;
        }
    }

    fn ack(&mut self, delivery_id: &str) -> Result<(), Self::Error> {
        self.inner
            .pending
            .lock()
            .map_err(|_| InMemoryQueueError::Poisoned)?
            .remove(delivery_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_publish_order() {
        let queue = InMemoryQueue::new();
        queue.publish("a").unwrap();
        queue.publish("b").unwrap();

        let mut consumer = queue.consumer("test").unwrap();
        let first = consumer.receive(Duration::from_millis(10)).unwrap().unwrap();
        let second = consumer.receive(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(first.payload, "a");
        assert_eq!(second.payload, "b");
        assert_eq!(consumer.receive(Duration::from_millis(10)).unwrap(), None);
    }

    #[test]
    fn ack_clears_pending() {
        let queue = InMemoryQueue::new();
        queue.publish("a").unwrap();

        let mut consumer = queue.consumer("test").unwrap();
        let delivery = consumer.receive(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(queue.pending_count(), 1);

        consumer.ack(&delivery.id).unwrap();
        assert_eq!(queue.pending_count(), 0);

        // Acking an unknown id is a no-op.
        consumer.ack("no-such-delivery").unwrap();
    }

    #[test]
    fn each_message_goes_to_one_consumer() {
        let queue = InMemoryQueue::new();
        queue.publish("only").unwrap();

        let mut a = queue.consumer("group").unwrap();
        let mut b = queue.consumer("group").unwrap();

        let got_a = a.receive(Duration::from_millis(10)).unwrap();
        let got_b = b.receive(Duration::from_millis(10)).unwrap();
        assert_eq!(got_a.is_some() as u8 + got_b.is_some() as u8, 1);
    }

    #[test]
    fn receive_times_out_when_empty() {
        let queue = InMemoryQueue::new();
        let mut consumer = queue.consumer("test").unwrap();
        assert_eq!(consumer.receive(Duration::from_millis(5)).unwrap(), None);
    }
}

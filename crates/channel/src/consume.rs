//! Long-lived consume loop.
//!
//! Pulls deliveries from a [`QueueConsumer`] on a dedicated worker thread and
//! hands each one to a handler. The loop has no terminal state; it runs until
//! the process exits or the handle requests shutdown (tests).

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::queue::{AckPolicy, Delivery, QueueConsumer};

/// Handle to control and join the consume loop.
#[derive(Debug)]
pub struct ConsumerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ConsumerHandle {
    /// Request graceful shutdown and wait for the loop to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// The receive/ack/handle loop.
#[derive(Debug)]
pub struct ConsumeLoop;

impl ConsumeLoop {
    /// Spawn a worker thread that processes deliveries from `consumer`.
    ///
    /// `handler` is the per-message processing function. It must treat a
    /// malformed payload as handled (log it, return `Ok`) so the message is
    /// dropped rather than redelivered; an `Err` marks a retryable failure.
    /// A handler failure never terminates the loop.
    pub fn spawn<C, H, E>(
        name: &'static str,
        consumer: C,
        ack: AckPolicy,
        handler: H,
    ) -> ConsumerHandle
    where
        C: QueueConsumer + 'static,
        H: FnMut(&Delivery) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || consume_loop(name, consumer, ack, shutdown_rx, handler))
            .expect("failed to spawn consume loop thread");

        ConsumerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn consume_loop<C, H, E>(
    name: &'static str,
    mut consumer: C,
    ack: AckPolicy,
    shutdown_rx: mpsc::Receiver<()>,
    mut handler: H,
) where
    C: QueueConsumer,
    H: FnMut(&Delivery) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let delivery = match consumer.receive(tick) {
            Ok(Some(delivery)) => delivery,
            Ok(None) => continue,
            Err(err) => {
                warn!(consumer = name, error = ?err, "receive failed");
                thread::sleep(tick);
                continue;
            }
        };

        match ack {
            AckPolicy::OnReceipt => {
                if let Err(err) = consumer.ack(&delivery.id) {
                    warn!(consumer = name, delivery_id = %delivery.id, error = ?err, "ack failed");
                }
                if let Err(err) = handler(&delivery) {
                    warn!(consumer = name, delivery_id = %delivery.id, error = ?err, "handler failed; message already acknowledged");
                }
            }
            AckPolicy::AfterProcessing => match handler(&delivery) {
                Ok(()) => {
                    if let Err(err) = consumer.ack(&delivery.id) {
                        warn!(consumer = name, delivery_id = %delivery.id, error = ?err, "ack failed");
                    }
                }
                Err(err) => {
                    warn!(consumer = name, delivery_id = %delivery.id, error = ?err, "handler failed; delivery left pending");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::in_memory::InMemoryQueue;
    use crate::queue::MessageQueue;

    fn wait_until(mut predicate: impl FnMut() -> bool) {
        for _ in 0..200 {
            if predicate() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached within timeout");
    }

    #[test]
    fn processes_each_delivery_once() {
        let queue = InMemoryQueue::new();
        queue.publish("one").unwrap();
        queue.publish("two").unwrap();
        // Duplicate delivery: at-least-once means the handler simply runs
        // once per delivery.
        queue.publish("two").unwrap();

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = ConsumeLoop::spawn(
            "test.consumer",
            queue.consumer("test").unwrap(),
            AckPolicy::OnReceipt,
            move |delivery: &Delivery| -> Result<(), ()> {
                sink.lock().unwrap().push(delivery.payload.clone());
                Ok(())
            },
        );

        wait_until(|| seen.lock().unwrap().len() == 3);
        handle.shutdown();
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two", "two"]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn handler_failure_does_not_kill_the_loop() {
        let queue = InMemoryQueue::new();
        queue.publish("bad").unwrap();
        queue.publish("good").unwrap();

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = ConsumeLoop::spawn(
            "test.consumer",
            queue.consumer("test").unwrap(),
            AckPolicy::OnReceipt,
            move |delivery: &Delivery| -> Result<(), String> {
                sink.lock().unwrap().push(delivery.payload.clone());
                if delivery.payload == "bad" {
                    return Err("unprocessable".to_string());
                }
                Ok(())
            },
        );

        wait_until(|| seen.lock().unwrap().len() == 2);
        handle.shutdown();
        assert_eq!(*seen.lock().unwrap(), vec!["bad", "good"]);
    }

    #[test]
    fn on_receipt_acks_even_when_handler_fails() {
        let queue = InMemoryQueue::new();
        queue.publish("bad").unwrap();

        let handle = ConsumeLoop::spawn(
            "test.consumer",
            queue.consumer("test").unwrap(),
            AckPolicy::OnReceipt,
            |_: &Delivery| -> Result<(), ()> { Err(()) },
        );

        wait_until(|| queue.ready_count() == 0);
        handle.shutdown();
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn after_processing_leaves_failed_delivery_pending() {
        let queue = InMemoryQueue::new();
        queue.publish("bad").unwrap();
        queue.publish("good").unwrap();

        let handle = ConsumeLoop::spawn(
            "test.consumer",
            queue.consumer("test").unwrap(),
            AckPolicy::AfterProcessing,
            |delivery: &Delivery| -> Result<(), ()> {
                if delivery.payload == "bad" { Err(()) } else { Ok(()) }
            },
        );

        wait_until(|| queue.ready_count() == 0);
        handle.shutdown();
        // "bad" was received but never acknowledged.
        assert_eq!(queue.pending_count(), 1);
    }
}

//! Per-message processing for `order_created` events.
//!
//! The consumer observes order notifications and records them; it does NOT
//! mutate inventory. Stock is reserved synchronously by the `/reserve`
//! endpoint, so consuming the same event twice cannot double-decrement.

use std::convert::Infallible;

use orderflow_channel::Delivery;
use orderflow_core::OrderCreated;
use orderflow_observability::metrics::PipelineMetrics;

/// Consumer group on the `order_created` stream.
pub const CONSUMER_GROUP: &str = "inventory";

/// Handle one delivery: parse, count, log.
///
/// A malformed body fails only this message: it is logged and dropped, and
/// the consume loop carries on. Returning `Ok` in both arms keeps the
/// at-least-once loop from redelivering junk forever.
pub fn handle_order_message(delivery: &Delivery) -> Result<(), Infallible> {
    match serde_json::from_str::<OrderCreated>(&delivery.payload) {
        Ok(event) => {
            PipelineMetrics::record_order_processed();
            tracing::info!(
                order_id = %event.id,
                item = %event.item,
                quantity = event.quantity,
                "processed order notification"
            );
        }
        Err(err) => {
            PipelineMetrics::record_consume_error();
            tracing::warn!(
                delivery_id = %delivery.id,
                error = %err,
                "dropping malformed order event"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_well_formed_event() {
        let delivery = Delivery {
            id: "1-0".to_string(),
            payload: r#"{"id": 7, "item": "widget", "quantity": 5}"#.to_string(),
        };
        assert!(handle_order_message(&delivery).is_ok());
    }

    #[test]
    fn malformed_body_is_dropped_not_an_error() {
        for payload in ["not json", "{}", r#"{"id": "seven"}"#] {
            let delivery = Delivery {
                id: "1-0".to_string(),
                payload: payload.to_string(),
            };
            assert!(handle_order_message(&delivery).is_ok());
        }
    }
}

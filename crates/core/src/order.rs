use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Order identifier, assigned by the order store on insert.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A validated order request, not yet persisted.
///
/// Construction is the validation boundary: an instance always carries a
/// non-empty item and a positive quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    item: String,
    quantity: i64,
}

impl NewOrder {
    pub fn new(item: impl Into<String>, quantity: i64) -> DomainResult<Self> {
        let item = item.into();
        if item.trim().is_empty() {
            return Err(DomainError::validation("item is required"));
        }
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self { item, quantity })
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// A persisted order row. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub item: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Integration event emitted after an order row is durably written.
///
/// Delivered at least once; consumers must tolerate duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub id: OrderId,
    pub item: String,
    pub quantity: i64,
}

impl OrderCreated {
    /// Queue the event is published to.
    pub const QUEUE: &'static str = "order_created";

    pub fn for_order(order: &Order) -> Self {
        Self {
            id: order.id,
            item: order.item.clone(),
            quantity: order.quantity,
        }
    }
}

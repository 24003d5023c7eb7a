//! `orderflow-core` — domain foundation for the order/inventory pipeline.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! orders, the `order_created` integration event, and reservation outcomes.

pub mod error;
pub mod order;
pub mod reservation;

pub use error::{DomainError, DomainResult};
pub use order::{NewOrder, Order, OrderCreated, OrderId};
pub use reservation::Reservation;

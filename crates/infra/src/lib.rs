//! `orderflow-infra` — infrastructure implementations.
//!
//! - `queue`: Redis-Streams-backed message queue (`XADD`/`XREADGROUP`/`XACK`)
//! - `stock`: per-item stock counters with the atomic reservation primitive
//!   (Redis server-side script, plus an in-memory fallback)
//! - `orders`: durable order rows (Postgres via sqlx, plus an in-memory
//!   fallback)

pub mod orders;
pub mod queue;
pub mod stock;

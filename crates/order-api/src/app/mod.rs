//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/queue wiring and the create-order pipeline
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<services::AppServices>, metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics))
        .route("/orders", post(routes::orders::create_order))
        .layer(Extension(services))
        .layer(Extension(metrics))
}

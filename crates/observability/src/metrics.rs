//! Prometheus metrics recorder and pipeline counters.
//!
//! The recorder is process-wide: [`recorder`] installs it on first call and
//! hands back the same render handle afterwards, so the HTTP `/metrics`
//! route and tests share one exporter.

use std::sync::{Mutex, OnceLock, PoisonError};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to install metrics recorder: {0}")]
    Install(String),
}

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INSTALL: Mutex<()> = Mutex::new(());

/// Install the Prometheus recorder and return its render handle.
///
/// Installs once per process; later calls return the existing handle.
pub fn recorder() -> Result<PrometheusHandle, MetricsError> {
    let _guard = INSTALL.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    describe_metrics();

    let _ = HANDLE.set(handle.clone());
    Ok(handle)
}

fn describe_metrics() {
    describe_counter!(
        "orders_created_total",
        "Total number of orders created"
    );
    describe_counter!(
        "orders_processed_total",
        "Orders processed from the order_created queue"
    );
    describe_counter!(
        "channel_publish_errors_total",
        "Failed publishes to the order_created queue"
    );
    describe_counter!(
        "channel_consume_errors_total",
        "Receive failures on the consume loop"
    );
}

/// Counter recorders for the order pipeline.
pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Record a successfully created order.
    pub fn record_order_created() {
        counter!("orders_created_total").increment(1);
    }

    /// Record a successfully consumed order event. Counts deliveries, so a
    /// duplicated message counts once per delivery.
    pub fn record_order_processed() {
        counter!("orders_processed_total").increment(1);
    }

    /// Record a failed event publish.
    pub fn record_publish_error() {
        counter!("channel_publish_errors_total").increment(1);
    }

    /// Record a failed receive.
    pub fn record_consume_error() {
        counter!("channel_consume_errors_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_installs_once_and_renders_counters() {
        let handle = recorder().unwrap();
        let again = recorder().unwrap();

        PipelineMetrics::record_order_created();
        PipelineMetrics::record_order_processed();

        let rendered = handle.render();
        assert!(rendered.contains("orders_created_total"));
        assert!(rendered.contains("orders_processed_total"));

        // Same recorder behind both handles.
        assert!(again.render().contains("orders_created_total"));
    }
}

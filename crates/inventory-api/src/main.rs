use std::sync::Arc;

use orderflow_channel::AckPolicy;

#[tokio::main]
async fn main() {
    orderflow_observability::init();

    let config =
        orderflow_inventory_api::config::InventoryApiConfig::from_env().unwrap_or_else(|err| {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        });

    let metrics = orderflow_observability::metrics::recorder().unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to install metrics recorder");
        std::process::exit(1);
    });

    // Startup is all-or-nothing: channel retry exhaustion ends the process
    // here, since the service cannot do its job without the channel.
    let services = match orderflow_inventory_api::app::services::build_services(&config) {
        Ok(services) => Arc::new(services),
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            std::process::exit(1);
        }
    };

    // The consume loop runs on its own thread for the process lifetime;
    // messages are acknowledged on receipt (see AckPolicy).
    let _consumer = match services.spawn_consumer(AckPolicy::OnReceipt) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "failed to start consumer");
            std::process::exit(1);
        }
    };

    let app = orderflow_inventory_api::app::build_app(services, metrics);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {}: {err}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

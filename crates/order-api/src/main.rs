use std::sync::Arc;

#[tokio::main]
async fn main() {
    orderflow_observability::init();

    let config = orderflow_order_api::config::OrderApiConfig::from_env().unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid configuration");
        std::process::exit(1);
    });

    let metrics = orderflow_observability::metrics::recorder().unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to install metrics recorder");
        std::process::exit(1);
    });

    // Startup is all-or-nothing: channel retry exhaustion or a database
    // failure ends the process here.
    let services = match orderflow_order_api::app::services::build_services(&config).await {
        Ok(services) => services,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            std::process::exit(1);
        }
    };

    let app = orderflow_order_api::app::build_app(Arc::new(services), metrics);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {}: {err}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

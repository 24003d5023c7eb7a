use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use orderflow_channel::{AckPolicy, MessageQueue};
use orderflow_inventory_api::app::services::{self, AppServices};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(default_stock: i64) -> Self {
        // Build app (same router as prod), with in-memory wiring and an
        // ephemeral port.
        let services = Arc::new(services::build_in_memory_services(default_stock));
        let metrics = orderflow_observability::metrics::recorder().expect("metrics recorder");
        let app = orderflow_inventory_api::app::build_app(services.clone(), metrics);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    fn queue(&self) -> Arc<orderflow_channel::InMemoryQueue> {
        match self.services.as_ref() {
            AppServices::InMemory { queue, .. } => queue.clone(),
            AppServices::Persistent { .. } => unreachable!("tests use in-memory services"),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn reservation_lifecycle() {
    let srv = TestServer::spawn(100).await;
    let client = reqwest::Client::new();

    // Unseen items read as zero stock.
    let res = client
        .get(format!("{}/inventory/widget", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"item": "widget", "stock": 0}));

    // First reservation lazily initializes to the default.
    let res = client
        .post(format!("{}/reserve", srv.base_url))
        .json(&json!({"item": "widget", "quantity": 30}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "remaining": 70}));

    // Insufficient stock is a business outcome: 200, success=false, and the
    // level is untouched.
    let res = client
        .post(format!("{}/reserve", srv.base_url))
        .json(&json!({"item": "widget", "quantity": 71}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "remaining": 70}));

    // Zero-quantity reservation is a valid no-op.
    let res = client
        .post(format!("{}/reserve", srv.base_url))
        .json(&json!({"item": "widget", "quantity": 0}))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "remaining": 70}));

    let res = client
        .get(format!("{}/inventory/widget", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 70);
}

#[tokio::test]
async fn reserve_validation_failures_are_rejected_with_400() {
    let srv = TestServer::spawn(100).await;
    let client = reqwest::Client::new();

    for body in [
        json!({"quantity": 5}),
        json!({"item": "widget"}),
        json!({"item": "widget", "quantity": -1}),
    ] {
        let res = client
            .post(format!("{}/reserve", srv.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn consumer_drains_events_including_duplicates() {
    let srv = TestServer::spawn(100).await;
    let queue = srv.queue();

    let payload = r#"{"id": 1, "item": "widget", "quantity": 5}"#;
    queue.publish(payload).unwrap();
    // At-least-once delivery: the same event may arrive again.
    queue.publish(payload).unwrap();
    queue.publish("not json at all").unwrap();

    let consumer = srv
        .services
        .spawn_consumer(AckPolicy::OnReceipt)
        .expect("consumer starts");

    // Consumed = removed from ready and acknowledged (auto-ack on receipt),
    // malformed bodies included.
    for _ in 0..200 {
        if queue.ready_count() == 0 && queue.pending_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    consumer.shutdown();

    assert_eq!(queue.ready_count(), 0);
    assert_eq!(queue.pending_count(), 0);

    // The processed counter is visible on /metrics after consumption.
    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/metrics", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("orders_processed_total"));
}

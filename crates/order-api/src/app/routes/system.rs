use axum::{extract::Extension, http::StatusCode, http::header, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn metrics(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}

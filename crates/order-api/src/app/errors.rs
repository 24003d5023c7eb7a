use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::app::services::CreateOrderError;

pub fn create_order_error_to_response(err: CreateOrderError) -> axum::response::Response {
    match err {
        CreateOrderError::Storage(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string())
        }
        // The order row exists at this point; the caller still sees the
        // failure instead of a silent drop.
        CreateOrderError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

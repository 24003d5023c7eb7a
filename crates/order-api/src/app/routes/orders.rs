use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use orderflow_core::NewOrder;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let Some(item) = body.item() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "item is required");
    };
    let Some(quantity) = body.quantity else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "quantity is required",
        );
    };

    let new_order = match NewOrder::new(item, quantity) {
        Ok(order) => order,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    match services.create_order(new_order).await {
        Ok(order) => {
            (StatusCode::CREATED, Json(serde_json::json!({ "id": order.id }))).into_response()
        }
        Err(e) => errors::create_order_error_to_response(e),
    }
}

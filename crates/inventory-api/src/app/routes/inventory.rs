use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::app::errors;
use crate::app::services::AppServices;

/// Reserve request. Both fields are required; a missing one is a 400.
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub item: Option<String>,
    pub quantity: Option<i64>,
}

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item): Path<String>,
) -> axum::response::Response {
    match services.stock_level(&item).await {
        Ok(stock) => (
            StatusCode::OK,
            Json(serde_json::json!({ "item": item, "stock": stock })),
        )
            .into_response(),
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

pub async fn reserve(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ReserveRequest>,
) -> axum::response::Response {
    let Some(item) = body.item else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "item and quantity required",
        );
    };
    let Some(quantity) = body.quantity else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "item and quantity required",
        );
    };
    // Zero is a valid no-op reservation; negative never reaches the store.
    if quantity < 0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "quantity must not be negative",
        );
    }

    match services.reserve(item, quantity).await {
        Ok(reservation) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": reservation.is_reserved(),
                "remaining": reservation.remaining(),
            })),
        )
            .into_response(),
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

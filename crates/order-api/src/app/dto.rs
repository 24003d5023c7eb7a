use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

/// Create-order request. `item_id` and `item` are accepted as aliases for
/// caller compatibility.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub item_id: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<i64>,
}

impl CreateOrderRequest {
    pub fn item(&self) -> Option<&str> {
        self.item_id.as_deref().or(self.item.as_deref())
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One entry in the batch order request body (a JSON list).
#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub status: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrdersResponse {
    pub message: &'static str,
    pub order_ids: Vec<Uuid>,
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct ProductItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct AddProductResponse {
    pub message: &'static str,
    pub id: Uuid,
}

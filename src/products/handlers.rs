use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{error::ApiError, state::AppState};

use super::dto::{AddProductRequest, AddProductResponse, ProductItem};
use super::repo::Product;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/add", post(add_product))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductItem>>, ApiError> {
    let products = Product::list(&state.db).await?;
    let items = products
        .into_iter()
        .map(|p| ProductItem {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            created_at: p.created_at,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn add_product(
    State(state): State<AppState>,
    payload: Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddProductResponse>), ApiError> {
    let Json(payload) =
        payload.map_err(|_| ApiError::Validation("Missing required fields".into()))?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Product name is required".into()));
    }

    let product =
        Product::create(&state.db, &payload.name, &payload.description, payload.price).await?;

    info!(product_id = %product.id, name = %product.name, "product added");
    Ok((
        StatusCode::CREATED,
        Json(AddProductResponse {
            message: "Product added successfully",
            id: product.id,
        }),
    ))
}

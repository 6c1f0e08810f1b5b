use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::middleware::CurrentUser, error::ApiError, products::repo::Product, state::AppState,
};

use super::dto::{NewOrder, OrderItem, PlacedOrdersResponse};
use super::repo::Order;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/add", post(add_orders))
}

#[instrument(skip(state, user))]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<OrderItem>>, ApiError> {
    let orders = Order::list_by_user(&state.db, user.id).await?;
    let items = orders
        .into_iter()
        .map(|o| OrderItem {
            id: o.id,
            product_id: o.product_id,
            user_id: o.user_id,
            quantity: o.quantity,
            status: o.status,
            created_at: o.created_at,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, user, payload))]
pub async fn add_orders(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<Vec<NewOrder>>, JsonRejection>,
) -> Result<(StatusCode, Json<PlacedOrdersResponse>), ApiError> {
    let Json(payload) =
        payload.map_err(|_| ApiError::Validation("Request body must be a list of orders".into()))?;
    if payload.is_empty() {
        return Err(ApiError::Validation(
            "Request body must be a non-empty list of orders".into(),
        ));
    }
    for entry in &payload {
        if entry.quantity <= 0 {
            return Err(ApiError::Validation("Quantity must be positive".into()));
        }
    }

    // Every referenced product must exist before anything is written.
    for entry in &payload {
        if Product::find_by_id(&state.db, entry.product_id).await?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Product with id {} not found",
                entry.product_id
            )));
        }
    }

    let mut tx = state.db.begin().await?;
    let mut order_ids = Vec::with_capacity(payload.len());
    for entry in &payload {
        let order = Order::insert(&mut tx, entry.product_id, user.id, entry.quantity).await?;
        order_ids.push(order.id);
    }
    tx.commit().await?;

    info!(user_id = %user.id, count = order_ids.len(), "orders placed");
    Ok((
        StatusCode::CREATED,
        Json(PlacedOrdersResponse {
            message: "Orders placed successfully",
            order_ids,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn some_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$v=19$hash".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn empty_order_list_is_rejected() {
        // Matches the original service: an empty batch is a validation
        // failure, nothing is written.
        let state = AppState::fake();
        let err = add_orders(
            State(state),
            Extension(CurrentUser(some_user())),
            Ok(Json(Vec::new())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl Order {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, user_id, quantity, status, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Insert one order inside a batch transaction. The whole batch commits
    /// or none of it does.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        user_id: Uuid,
        quantity: i32,
    ) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (product_id, user_id, quantity, status)
            VALUES ($1, $2, $3, 'Pending')
            RETURNING id, product_id, user_id, quantity, status, created_at
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_one(&mut **tx)
        .await
    }
}

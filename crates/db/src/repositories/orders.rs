use chrono::{DateTime, Utc};
use sqlx::Row;

use shopguide_core::domain::order::{OrderItemSummary, OrderSummary};
use shopguide_core::domain::profile::UserId;

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn list_recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let order_rows = sqlx::query(
            "SELECT id, created_at FROM orders \
             WHERE user_id = ? \
             ORDER BY created_at DESC \
             LIMIT ?",
        )
        .bind(&user_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(order_rows.len());
        for order_row in &order_rows {
            let order_id: String = order_row.try_get("id")?;
            let raw_created_at: String = order_row.try_get("created_at")?;
            let created_at = DateTime::parse_from_rfc3339(&raw_created_at)
                .map_err(|error| {
                    RepositoryError::Decode(format!(
                        "invalid created_at for order `{order_id}`: {error}"
                    ))
                })?
                .with_timezone(&Utc);

            let item_rows = sqlx::query(
                "SELECT product_name, category FROM order_items \
                 WHERE order_id = ? \
                 ORDER BY id ASC",
            )
            .bind(&order_id)
            .fetch_all(&self.pool)
            .await?;

            let mut items = Vec::with_capacity(item_rows.len());
            for item_row in &item_rows {
                items.push(OrderItemSummary {
                    product_name: item_row.try_get("product_name")?,
                    category: item_row.try_get("category")?,
                });
            }

            summaries.push(OrderSummary { order_id, created_at, items });
        }

        Ok(summaries)
    }
}

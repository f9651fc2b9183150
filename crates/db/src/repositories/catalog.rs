use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use shopguide_core::domain::product::{Product, ProductId};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_by_ai_score(&self) -> Result<Vec<Product>, RepositoryError> {
        // rowid preserves catalog insertion order for score ties.
        let rows = sqlx::query(
            "SELECT id, name, price, category, description, ai_score, stock, \
                    image_url, rating, sales_count \
             FROM products \
             ORDER BY ai_score DESC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_product).collect()
    }
}

fn decode_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let raw_price: String = row.try_get("price")?;
    let price = raw_price.parse::<Decimal>().map_err(|error| {
        RepositoryError::Decode(format!("invalid product price `{raw_price}`: {error}"))
    })?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        price,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        ai_score: row.try_get("ai_score")?,
        stock: row.try_get("stock")?,
        image_url: row.try_get("image_url")?,
        rating: row.try_get("rating")?,
        sales_count: row.try_get("sales_count")?,
    })
}

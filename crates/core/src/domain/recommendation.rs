use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::{Product, ProductId};

/// Card-shaped projection of a recommended catalog product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecommendation {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub rating: f64,
    pub sales: i64,
}

impl From<&Product> for ResolvedRecommendation {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image_url.clone(),
            rating: product.rating,
            sales: product.sales_count,
        }
    }
}

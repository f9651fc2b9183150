use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the catalog snapshot the orchestrator works against.
///
/// Snapshots are fetched fresh each turn, ordered by `ai_score` descending
/// with the catalog's insertion order breaking ties. Staleness across turns
/// is tolerated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub ai_score: i64,
    pub stock: i64,
    pub image_url: Option<String>,
    pub rating: f64,
    pub sales_count: i64,
}

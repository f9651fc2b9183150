use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A past order, reduced to what the system prompt needs.
///
/// Purchase history is prompt context only; it is never scored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemSummary {
    pub product_name: String,
    pub category: String,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::category::Category;
use crate::domain::model::trade::Trade;

/// Middle level of the hierarchy. Always owned by exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsItem {
    pub id: String,
    pub category_id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGoodsItem {
    pub category_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    /// Appended after the category's current tail when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

/// Partial update. A present `category_id` reassigns the item to another
/// category (the "move" mutation the cache has to treat specially).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGoodsItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

/// Goods item joined with its resolved category. The category side is
/// optional so an undeterminable parent stays representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsItemWithCategory {
    #[serde(flatten)]
    pub item: GoodsItem,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsItemWithTrades {
    #[serde(flatten)]
    pub item: GoodsItem,
    pub category: Option<Category>,
    pub trades: Vec<Trade>,
}

/// Derived per-goods-item trade counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsItemStatistics {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub canceled: usize,
}

use std::fmt;

use crate::domain::model::TradeSearchFilter;

/// Structured identifier of a cached query result: entity type plus the
/// parent/filter parameters that scope it. Invalidation works on segment
/// prefixes, so `["goods-items"]` covers every goods view while
/// `["goods-items", "category", cid]` covers exactly one category's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey {
    segments: Vec<String>,
}

impl ScopeKey {
    fn of<const N: usize>(segments: [&str; N]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Segment-wise prefix test; a key always matches itself.
    pub fn starts_with(&self, prefix: &ScopeKey) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    // Category views.

    pub fn categories() -> Self {
        Self::of(["categories"])
    }

    pub fn category(id: &str) -> Self {
        Self::of(["categories", id])
    }

    // Goods views.

    pub fn goods_items() -> Self {
        Self::of(["goods-items"])
    }

    pub fn goods_all() -> Self {
        Self::of(["goods-items", "all"])
    }

    pub fn goods_by_category(category_id: &str) -> Self {
        Self::of(["goods-items", "category", category_id])
    }

    /// Root over every per-category goods list.
    pub fn goods_by_category_root() -> Self {
        Self::of(["goods-items", "category"])
    }

    pub fn goods_item(id: &str) -> Self {
        Self::of(["goods-items", id])
    }

    pub fn goods_with_trades(id: &str) -> Self {
        Self::of(["goods-items", id, "with-trades"])
    }

    pub fn goods_search(query: &str, category_id: Option<&str>) -> Self {
        let mut key = Self::of(["goods-items", "search", query]);
        if let Some(cid) = category_id {
            key.segments.push(cid.to_string());
        }
        key
    }

    // Trade views.

    pub fn trades() -> Self {
        Self::of(["trades"])
    }

    pub fn trades_all() -> Self {
        Self::of(["trades", "all"])
    }

    pub fn trade(id: &str) -> Self {
        Self::of(["trades", id])
    }

    pub fn trades_by_goods_item(goods_item_id: &str) -> Self {
        Self::of(["trades", "goods-item", goods_item_id])
    }

    pub fn trades_overdue() -> Self {
        Self::of(["trades", "overdue"])
    }

    pub fn trades_recent(limit: usize) -> Self {
        Self::of(["trades", "recent", &limit.to_string()])
    }

    pub fn trades_search(query: &str, filter: &TradeSearchFilter) -> Self {
        let mut key = Self::of(["trades", "search", query]);
        key.segments.push(format!(
            "{}|{}|{}|{}",
            filter.status.map(|s| s.as_str()).unwrap_or(""),
            filter.trade_type.map(|t| t.as_str()).unwrap_or(""),
            filter.category_id.as_deref().unwrap_or(""),
            filter.goods_item_id.as_deref().unwrap_or(""),
        ));
        key
    }

    // Derived statistics. Kept under their own root so aggregate views can
    // be invalidated without touching the entity lists.

    pub fn statistics() -> Self {
        Self::of(["statistics"])
    }

    pub fn category_statistics() -> Self {
        Self::of(["statistics", "categories"])
    }

    pub fn category_stats(category_id: &str) -> Self {
        Self::of(["statistics", "category", category_id])
    }

    pub fn category_usage(category_id: &str) -> Self {
        Self::of(["statistics", "category", category_id, "usage"])
    }

    pub fn goods_item_stats(goods_item_id: &str) -> Self {
        Self::of(["statistics", "goods-item", goods_item_id])
    }

    // Todo views.

    pub fn todos() -> Self {
        Self::of(["todos"])
    }

    pub fn todos_by_trade(trade_id: &str) -> Self {
        Self::of(["todos", "trade", trade_id])
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_on_segment_boundaries() {
        let list = ScopeKey::goods_by_category("cat-1");
        assert!(list.starts_with(&ScopeKey::goods_items()));
        assert!(list.starts_with(&ScopeKey::goods_by_category_root()));
        assert!(list.starts_with(&list));
        assert!(!list.starts_with(&ScopeKey::goods_by_category("cat-2")));
        assert!(!list.starts_with(&ScopeKey::categories()));
        // A longer key never matches as prefix of a shorter one.
        assert!(!ScopeKey::goods_items().starts_with(&list));
    }

    #[test]
    fn detail_prefix_covers_subviews() {
        let detail = ScopeKey::goods_item("g-1");
        assert!(ScopeKey::goods_with_trades("g-1").starts_with(&detail));
        assert!(!ScopeKey::goods_with_trades("g-2").starts_with(&detail));
    }

    #[test]
    fn stats_live_outside_entity_roots() {
        assert!(!ScopeKey::category_stats("c-1").starts_with(&ScopeKey::categories()));
        assert!(ScopeKey::category_stats("c-1").starts_with(&ScopeKey::statistics()));
        assert!(ScopeKey::category_usage("c-1").starts_with(&ScopeKey::category_stats("c-1")));
    }

    #[test]
    fn display_joins_segments() {
        assert_eq!(
            ScopeKey::trades_by_goods_item("g-9").to_string(),
            "trades/goods-item/g-9"
        );
    }
}

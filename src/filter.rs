use std::collections::BTreeSet;

use crate::domain::model::{TradeStatus, TradeType, TradeWithGoods};

/// One selectable category dimension value. `Uncategorized` is the
/// sentinel for trades whose category cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CategorySelection {
    Uncategorized,
    Id(String),
}

/// Client-local filter state over the trade collection. Keywords are
/// stored trimmed; selection sets are empty-means-all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub keyword: String,
    pub statuses: BTreeSet<TradeStatus>,
    pub trade_types: BTreeSet<TradeType>,
    pub categories: BTreeSet<CategorySelection>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_keyword(&mut self, keyword: &str) {
        self.keyword = keyword.trim().to_string();
    }

    pub fn toggle_status(&mut self, status: TradeStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    pub fn toggle_trade_type(&mut self, trade_type: TradeType) {
        if !self.trade_types.remove(&trade_type) {
            self.trade_types.insert(trade_type);
        }
    }

    pub fn toggle_category(&mut self, selection: CategorySelection) {
        if !self.categories.remove(&selection) {
            self.categories.insert(selection);
        }
    }

    /// Structurally equal to the initial state afterwards.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_filter_active(&self) -> bool {
        !self.keyword.is_empty()
            || !self.statuses.is_empty()
            || !self.trade_types.is_empty()
            || !self.categories.is_empty()
    }

    /// Chip count for the filter bar.
    pub fn active_filter_count(&self) -> usize {
        usize::from(!self.keyword.is_empty())
            + self.statuses.len()
            + self.trade_types.len()
            + self.categories.len()
    }
}

/// Pure filter over an in-memory snapshot. Dimensions combine
/// conjunctively; within a dimension the selection is disjunctive and an
/// empty selection matches everything. Output is ordered by updated_at
/// descending, ties broken by id ascending.
pub fn filter_trades(trades: &[TradeWithGoods], state: &FilterState) -> Vec<TradeWithGoods> {
    let keyword = state.keyword.to_lowercase();
    let mut rows: Vec<TradeWithGoods> = trades
        .iter()
        .filter(|row| matches(row, state, &keyword))
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.trade
            .updated_at
            .cmp(&a.trade.updated_at)
            .then_with(|| a.trade.id.cmp(&b.trade.id))
    });
    rows
}

fn matches(row: &TradeWithGoods, state: &FilterState, keyword: &str) -> bool {
    matches_keyword(row, keyword)
        && (state.statuses.is_empty() || state.statuses.contains(&row.trade.status))
        && (state.trade_types.is_empty() || state.trade_types.contains(&row.trade.trade_type))
        && matches_category(row, &state.categories)
}

/// Case-insensitive substring over item name, partner name, notes and the
/// owning goods item's name.
fn matches_keyword(row: &TradeWithGoods, keyword: &str) -> bool {
    if keyword.is_empty() {
        return true;
    }
    let contains = |text: &str| text.to_lowercase().contains(keyword);
    contains(&row.trade.item_name)
        || contains(&row.trade.partner_name)
        || row.trade.notes.as_deref().is_some_and(contains)
        || row
            .goods_item
            .as_ref()
            .is_some_and(|g| contains(&g.item.name))
}

fn matches_category(row: &TradeWithGoods, selected: &BTreeSet<CategorySelection>) -> bool {
    if selected.is_empty() {
        return true;
    }
    let resolved = row.resolved_category_id();
    selected.iter().any(|selection| match selection {
        CategorySelection::Uncategorized => resolved.is_none(),
        CategorySelection::Id(id) => resolved == Some(id.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::domain::model::{Category, GoodsItem, GoodsItemWithCategory, Trade};

    fn category(id: &str) -> Category {
        let now = Utc::now();
        Category {
            id: id.to_string(),
            user_id: "user-1".into(),
            name: format!("category {id}"),
            color: "#3B82F6".into(),
            icon: "folder".into(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn goods(id: &str, category_id: &str, name: &str) -> GoodsItemWithCategory {
        let now = Utc::now();
        GoodsItemWithCategory {
            item: GoodsItem {
                id: id.to_string(),
                category_id: category_id.to_string(),
                user_id: "user-1".into(),
                name: name.to_string(),
                description: None,
                release_date: None,
                sort_order: 0,
                created_at: now,
                updated_at: now,
            },
            category: Some(category(category_id)),
        }
    }

    /// `age` pushes updated_at into the past so ordering is deterministic.
    fn trade(id: &str, item_name: &str, age_minutes: i64) -> TradeWithGoods {
        let now = Utc::now();
        TradeWithGoods {
            trade: Trade {
                id: id.to_string(),
                goods_item_id: "g-1".into(),
                user_id: "user-1".into(),
                partner_name: "partner".into(),
                item_name: item_name.to_string(),
                quantity: 1,
                trade_type: TradeType::Exchange,
                status: TradeStatus::Planned,
                payment_method: None,
                notes: None,
                shipping_deadline: None,
                created_at: now - Duration::minutes(age_minutes),
                updated_at: now - Duration::minutes(age_minutes),
            },
            goods_item: Some(goods("g-1", "cat-1", "goods name")),
        }
    }

    #[test]
    fn keyword_matches_case_insensitively_and_orders_by_recency() {
        let mut rows = vec![
            trade("t-01", "Badge red", 5),
            trade("t-02", "sticker", 1),
            trade("t-03", "BADGE blue", 9),
            trade("t-04", "poster", 3),
            trade("t-05", "tour badge", 2),
            trade("t-06", "keychain", 4),
            trade("t-07", "shirt", 6),
            trade("t-08", "cd", 7),
            trade("t-09", "photo", 8),
            trade("t-10", "towel", 10),
        ];
        // Keyword also reaches notes and the goods item name.
        rows[7].trade.notes = Some("swap for badge?".into());

        let mut state = FilterState::new();
        state.set_keyword("BADGE");
        let hits = filter_trades(&rows, &state);

        let ids: Vec<&str> = hits.iter().map(|t| t.trade.id.as_str()).collect();
        assert_eq!(ids, vec!["t-05", "t-01", "t-08", "t-03"]);
    }

    #[test]
    fn ties_on_updated_at_break_by_id_ascending() {
        let mut a = trade("t-b", "x", 3);
        let b = trade("t-a", "x", 3);
        a.trade.updated_at = b.trade.updated_at;
        let hits = filter_trades(&[a, b], &FilterState::new());
        let ids: Vec<&str> = hits.iter().map(|t| t.trade.id.as_str()).collect();
        assert_eq!(ids, vec!["t-a", "t-b"]);
    }

    #[test]
    fn dimensions_combine_conjunctively() {
        let mut planned = trade("t-1", "badge", 1);
        planned.trade.status = TradeStatus::Planned;
        let mut shipped = trade("t-2", "badge", 2);
        shipped.trade.status = TradeStatus::Shipped;
        let mut other_type = trade("t-3", "badge", 3);
        other_type.trade.trade_type = TradeType::Purchase;

        let mut state = FilterState::new();
        state.set_keyword("badge");
        state.toggle_status(TradeStatus::Planned);
        state.toggle_status(TradeStatus::Shipped);
        state.toggle_trade_type(TradeType::Exchange);

        let hits = filter_trades(&[planned, shipped, other_type], &state);
        let ids: Vec<&str> = hits.iter().map(|t| t.trade.id.as_str()).collect();
        // Within status the selection is disjunctive, across dimensions
        // conjunctive: the purchase is excluded despite matching keyword.
        assert_eq!(ids, vec!["t-1", "t-2"]);
    }

    #[test]
    fn uncategorized_sentinel_matches_unresolvable_parents() {
        let categorized = trade("t-1", "badge", 1);
        let mut orphan = trade("t-2", "badge", 2);
        orphan.goods_item = None;

        let mut state = FilterState::new();
        state.toggle_category(CategorySelection::Uncategorized);
        let hits = filter_trades(&[categorized.clone(), orphan.clone()], &state);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].trade.id, "t-2");

        // Selecting the real category alongside makes the dimension
        // disjunctive over both.
        state.toggle_category(CategorySelection::Id("cat-1".into()));
        assert_eq!(filter_trades(&[categorized, orphan], &state).len(), 2);
    }

    #[test]
    fn empty_selections_match_everything() {
        let rows = vec![trade("t-1", "badge", 1), trade("t-2", "poster", 2)];
        let state = FilterState::new();
        assert_eq!(filter_trades(&rows, &state).len(), 2);
    }

    #[test]
    fn filter_activity_tracks_keyword_and_selections() {
        let mut state = FilterState::new();
        assert!(!state.is_filter_active());

        state.set_keyword("");
        assert!(!state.is_filter_active());
        state.set_keyword("  ");
        assert!(!state.is_filter_active());

        state.toggle_status(TradeStatus::Planned);
        assert!(state.is_filter_active());
        assert_eq!(state.active_filter_count(), 1);

        state.set_keyword("badge");
        state.toggle_category(CategorySelection::Id("cat-1".into()));
        assert_eq!(state.active_filter_count(), 3);

        state.clear_all();
        assert!(!state.is_filter_active());
        assert_eq!(state, FilterState::new());
    }

    #[test]
    fn toggling_twice_removes_the_selection() {
        let mut state = FilterState::new();
        state.toggle_trade_type(TradeType::Transfer);
        state.toggle_trade_type(TradeType::Transfer);
        assert!(!state.is_filter_active());
        assert_eq!(state, FilterState::new());
    }
}

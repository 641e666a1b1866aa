use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::model::{
    AppResult, Category, GoodsItem, GoodsItemWithCategory, GoodsItemWithTrades, NewCategory,
    NewGoodsItem, NewTodo, NewTrade, SortOrderUpdate, Todo, Trade, TradeSearchFilter, TradeStatus,
    TradeWithGoods, UpdateCategory, UpdateGoodsItem, UpdateTodo, UpdateTrade,
};

/// Typed CRUD + list/search against the remote data store, one trait per
/// entity. Implementations are scoped to the authenticated owner supplied
/// at construction; the store enforces referential-integrity cascades on
/// delete.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Ordered by sort_order asc, then created_at asc.
    async fn list(&self) -> AppResult<Vec<Category>>;
    async fn get(&self, id: &str) -> AppResult<Option<Category>>;
    async fn insert(&self, input: &NewCategory) -> AppResult<Category>;
    async fn update(&self, id: &str, input: &UpdateCategory) -> AppResult<Category>;
    /// Cascades to goods items and trades at the store.
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn update_sort_orders(&self, orders: &[SortOrderUpdate]) -> AppResult<Vec<Category>>;
    async fn max_sort_order(&self) -> AppResult<Option<i32>>;
}

#[async_trait]
pub trait GoodsItemRepository: Send + Sync {
    /// Ordered by sort_order asc.
    async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<GoodsItemWithCategory>>;
    async fn get(&self, id: &str) -> AppResult<Option<GoodsItemWithCategory>>;
    async fn get_with_trades(&self, id: &str) -> AppResult<Option<GoodsItemWithTrades>>;
    /// Ordered by category_id, then sort_order asc.
    async fn list_all(&self) -> AppResult<Vec<GoodsItemWithCategory>>;
    /// Case-insensitive substring match on name, optionally scoped to one
    /// category.
    async fn search(
        &self,
        query: &str,
        category_id: Option<&str>,
    ) -> AppResult<Vec<GoodsItemWithCategory>>;
    async fn insert(&self, input: &NewGoodsItem) -> AppResult<GoodsItem>;
    async fn update(&self, id: &str, input: &UpdateGoodsItem) -> AppResult<GoodsItem>;
    /// Cascades to trades at the store.
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn update_sort_orders(&self, orders: &[SortOrderUpdate]) -> AppResult<()>;
    async fn max_sort_order_in_category(&self, category_id: &str) -> AppResult<Option<i32>>;
}

#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Joined across the hierarchy, ordered by updated_at desc.
    async fn list_all(&self) -> AppResult<Vec<TradeWithGoods>>;
    async fn get(&self, id: &str) -> AppResult<Option<TradeWithGoods>>;
    /// Ordered by updated_at desc.
    async fn list_by_goods_item(&self, goods_item_id: &str) -> AppResult<Vec<Trade>>;
    /// Every trade rolling up to the category, one store round-trip.
    async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<Trade>>;
    async fn search(&self, query: &str, filter: &TradeSearchFilter)
        -> AppResult<Vec<TradeWithGoods>>;
    async fn insert(&self, input: &NewTrade) -> AppResult<Trade>;
    async fn update(&self, id: &str, input: &UpdateTrade) -> AppResult<Trade>;
    async fn batch_update_status(&self, ids: &[String], status: TradeStatus) -> AppResult<()>;
    async fn delete(&self, id: &str) -> AppResult<()>;
    /// Trades not yet shipped whose shipping deadline lies strictly before
    /// `today`.
    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<TradeWithGoods>>;
    async fn list_recent(&self, limit: usize) -> AppResult<Vec<TradeWithGoods>>;
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Ordered by sort_order asc.
    async fn list_by_trade(&self, trade_id: &str) -> AppResult<Vec<Todo>>;
    async fn insert(&self, input: &NewTodo) -> AppResult<Todo>;
    async fn insert_batch(&self, trade_id: &str, titles: &[String]) -> AppResult<Vec<Todo>>;
    async fn update(&self, id: &str, input: &UpdateTodo) -> AppResult<Todo>;
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn reorder(&self, trade_id: &str, orders: &[SortOrderUpdate]) -> AppResult<()>;
}

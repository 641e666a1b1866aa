use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::model::{
    AppError, AppResult, Category, GoodsItem, GoodsItemWithCategory, GoodsItemWithTrades,
    NewCategory, NewGoodsItem, NewTodo, NewTrade, SortOrderUpdate, Todo, Trade, TradeSearchFilter,
    TradeStatus, TradeWithGoods, UpdateCategory, UpdateGoodsItem, UpdateTodo, UpdateTrade,
    DEFAULT_COLOR, DEFAULT_ICON,
};
use crate::domain::repository::{
    CategoryRepository, GoodsItemRepository, TodoRepository, TradeRepository,
};

#[derive(Debug, Default)]
struct Tables {
    categories: HashMap<String, Category>,
    goods_items: HashMap<String, GoodsItem>,
    trades: HashMap<String, Trade>,
    todos: HashMap<String, Todo>,
}

/// In-process store implementing every repository trait. Mirrors the remote
/// store's contract: referential integrity with cascade on delete,
/// per-owner unique category names, typed errors. Deterministic, so tests
/// run against it instead of the network.
#[derive(Debug)]
pub struct MemoryStore {
    owner: String,
    tables: RwLock<Tables>,
    faults: Mutex<VecDeque<AppError>>,
}

impl MemoryStore {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            tables: RwLock::new(Tables::default()),
            faults: Mutex::new(VecDeque::new()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Queue an error to be returned by the next repository call, in FIFO
    /// order. Lets tests exercise the retry and degradation paths.
    pub fn inject_fault(&self, err: AppError) {
        self.faults.lock().unwrap().push_back(err);
    }

    fn take_fault(&self) -> AppResult<()> {
        match self.faults.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn mint_id() -> String {
        Uuid::new_v4().to_string()
    }
}

fn join_category(tables: &Tables, item: &GoodsItem) -> GoodsItemWithCategory {
    GoodsItemWithCategory {
        item: item.clone(),
        category: tables.categories.get(&item.category_id).cloned(),
    }
}

fn join_goods(tables: &Tables, trade: &Trade) -> TradeWithGoods {
    TradeWithGoods {
        trade: trade.clone(),
        goods_item: tables
            .goods_items
            .get(&trade.goods_item_id)
            .map(|item| join_category(tables, item)),
    }
}

/// updated_at desc, id asc on ties. The ordering the trade list views use.
fn sort_recency(trades: &mut [TradeWithGoods]) {
    trades.sort_by(|a, b| {
        b.trade
            .updated_at
            .cmp(&a.trade.updated_at)
            .then_with(|| a.trade.id.cmp(&b.trade.id))
    });
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Category>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Category> = tables.categories.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn get(&self, id: &str) -> AppResult<Option<Category>> {
        self.take_fault()?;
        Ok(self.tables.read().await.categories.get(id).cloned())
    }

    async fn insert(&self, input: &NewCategory) -> AppResult<Category> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == input.name) {
            return Err(AppError::Conflict(format!(
                "category name already exists: {}",
                input.name
            )));
        }
        let now = Utc::now();
        let row = Category {
            id: Self::mint_id(),
            user_id: self.owner.clone(),
            name: input.name.clone(),
            color: input.color.clone().unwrap_or_else(|| DEFAULT_COLOR.into()),
            icon: input.icon.clone().unwrap_or_else(|| DEFAULT_ICON.into()),
            sort_order: input.sort_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, input: &UpdateCategory) -> AppResult<Category> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if let Some(name) = &input.name {
            if tables
                .categories
                .values()
                .any(|c| c.id != id && &c.name == name)
            {
                return Err(AppError::Conflict(format!(
                    "category name already exists: {name}"
                )));
            }
        }
        let row = tables.categories.get_mut(id).ok_or(AppError::NotFound)?;
        if let Some(name) = &input.name {
            row.name = name.clone();
        }
        if let Some(color) = &input.color {
            row.color = color.clone();
        }
        if let Some(icon) = &input.icon {
            row.icon = icon.clone();
        }
        if let Some(sort_order) = input.sort_order {
            row.sort_order = sort_order;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if tables.categories.remove(id).is_none() {
            return Err(AppError::NotFound);
        }
        // Cascade: goods items under the category, trades under those,
        // todos under those.
        let goods_ids: Vec<String> = tables
            .goods_items
            .values()
            .filter(|g| g.category_id == id)
            .map(|g| g.id.clone())
            .collect();
        tables.goods_items.retain(|_, g| g.category_id != id);
        let trade_ids: Vec<String> = tables
            .trades
            .values()
            .filter(|t| goods_ids.contains(&t.goods_item_id))
            .map(|t| t.id.clone())
            .collect();
        tables
            .trades
            .retain(|_, t| !goods_ids.contains(&t.goods_item_id));
        tables.todos.retain(|_, td| !trade_ids.contains(&td.trade_id));
        Ok(())
    }

    async fn update_sort_orders(&self, orders: &[SortOrderUpdate]) -> AppResult<Vec<Category>> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut updated = Vec::with_capacity(orders.len());
        for order in orders {
            let row = tables
                .categories
                .get_mut(&order.id)
                .ok_or(AppError::NotFound)?;
            row.sort_order = order.sort_order;
            row.updated_at = now;
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn max_sort_order(&self) -> AppResult<Option<i32>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        Ok(tables.categories.values().map(|c| c.sort_order).max())
    }
}

#[async_trait]
impl GoodsItemRepository for MemoryStore {
    async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<GoodsItemWithCategory>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<GoodsItemWithCategory> = tables
            .goods_items
            .values()
            .filter(|g| g.category_id == category_id)
            .map(|g| join_category(&tables, g))
            .collect();
        rows.sort_by_key(|g| g.item.sort_order);
        Ok(rows)
    }

    async fn get(&self, id: &str) -> AppResult<Option<GoodsItemWithCategory>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        Ok(tables.goods_items.get(id).map(|g| join_category(&tables, g)))
    }

    async fn get_with_trades(&self, id: &str) -> AppResult<Option<GoodsItemWithTrades>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        Ok(tables.goods_items.get(id).map(|item| {
            let mut trades: Vec<Trade> = tables
                .trades
                .values()
                .filter(|t| t.goods_item_id == id)
                .cloned()
                .collect();
            trades.sort_by(|a, b| {
                b.updated_at
                    .cmp(&a.updated_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            GoodsItemWithTrades {
                item: item.clone(),
                category: tables.categories.get(&item.category_id).cloned(),
                trades,
            }
        }))
    }

    async fn list_all(&self) -> AppResult<Vec<GoodsItemWithCategory>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<GoodsItemWithCategory> = tables
            .goods_items
            .values()
            .map(|g| join_category(&tables, g))
            .collect();
        rows.sort_by(|a, b| {
            a.item
                .category_id
                .cmp(&b.item.category_id)
                .then_with(|| a.item.sort_order.cmp(&b.item.sort_order))
        });
        Ok(rows)
    }

    async fn search(
        &self,
        query: &str,
        category_id: Option<&str>,
    ) -> AppResult<Vec<GoodsItemWithCategory>> {
        self.take_fault()?;
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let mut rows: Vec<GoodsItemWithCategory> = tables
            .goods_items
            .values()
            .filter(|g| contains_ci(&g.name, &needle))
            .filter(|g| category_id.map_or(true, |cid| g.category_id == cid))
            .map(|g| join_category(&tables, g))
            .collect();
        rows.sort_by_key(|g| g.item.sort_order);
        Ok(rows)
    }

    async fn insert(&self, input: &NewGoodsItem) -> AppResult<GoodsItem> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&input.category_id) {
            return Err(AppError::Conflict(format!(
                "unknown category: {}",
                input.category_id
            )));
        }
        let now = Utc::now();
        let row = GoodsItem {
            id: Self::mint_id(),
            category_id: input.category_id.clone(),
            user_id: self.owner.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            release_date: input.release_date,
            sort_order: input.sort_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        tables.goods_items.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, input: &UpdateGoodsItem) -> AppResult<GoodsItem> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if let Some(category_id) = &input.category_id {
            if !tables.categories.contains_key(category_id) {
                return Err(AppError::Conflict(format!("unknown category: {category_id}")));
            }
        }
        let row = tables.goods_items.get_mut(id).ok_or(AppError::NotFound)?;
        if let Some(category_id) = &input.category_id {
            row.category_id = category_id.clone();
        }
        if let Some(name) = &input.name {
            row.name = name.clone();
        }
        if let Some(description) = &input.description {
            row.description = Some(description.clone());
        }
        if let Some(release_date) = input.release_date {
            row.release_date = Some(release_date);
        }
        if let Some(sort_order) = input.sort_order {
            row.sort_order = sort_order;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if tables.goods_items.remove(id).is_none() {
            return Err(AppError::NotFound);
        }
        let trade_ids: Vec<String> = tables
            .trades
            .values()
            .filter(|t| t.goods_item_id == id)
            .map(|t| t.id.clone())
            .collect();
        tables.trades.retain(|_, t| t.goods_item_id != id);
        tables.todos.retain(|_, td| !trade_ids.contains(&td.trade_id));
        Ok(())
    }

    async fn update_sort_orders(&self, orders: &[SortOrderUpdate]) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        for order in orders {
            let row = tables
                .goods_items
                .get_mut(&order.id)
                .ok_or(AppError::NotFound)?;
            row.sort_order = order.sort_order;
            row.updated_at = now;
        }
        Ok(())
    }

    async fn max_sort_order_in_category(&self, category_id: &str) -> AppResult<Option<i32>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        Ok(tables
            .goods_items
            .values()
            .filter(|g| g.category_id == category_id)
            .map(|g| g.sort_order)
            .max())
    }
}

#[async_trait]
impl TradeRepository for MemoryStore {
    async fn list_all(&self) -> AppResult<Vec<TradeWithGoods>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<TradeWithGoods> =
            tables.trades.values().map(|t| join_goods(&tables, t)).collect();
        sort_recency(&mut rows);
        Ok(rows)
    }

    async fn get(&self, id: &str) -> AppResult<Option<TradeWithGoods>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        Ok(tables.trades.get(id).map(|t| join_goods(&tables, t)))
    }

    async fn list_by_goods_item(&self, goods_item_id: &str) -> AppResult<Vec<Trade>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Trade> = tables
            .trades
            .values()
            .filter(|t| t.goods_item_id == goods_item_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<Trade>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let rows = tables
            .trades
            .values()
            .filter(|t| {
                tables
                    .goods_items
                    .get(&t.goods_item_id)
                    .is_some_and(|g| g.category_id == category_id)
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn search(
        &self,
        query: &str,
        filter: &TradeSearchFilter,
    ) -> AppResult<Vec<TradeWithGoods>> {
        self.take_fault()?;
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let mut rows: Vec<TradeWithGoods> = tables
            .trades
            .values()
            .map(|t| join_goods(&tables, t))
            .filter(|row| {
                if needle.is_empty() {
                    return true;
                }
                contains_ci(&row.trade.partner_name, &needle)
                    || contains_ci(&row.trade.item_name, &needle)
                    || row
                        .trade
                        .notes
                        .as_deref()
                        .is_some_and(|n| contains_ci(n, &needle))
                    || row
                        .goods_item
                        .as_ref()
                        .is_some_and(|g| contains_ci(&g.item.name, &needle))
            })
            .filter(|row| filter.status.map_or(true, |s| row.trade.status == s))
            .filter(|row| filter.trade_type.map_or(true, |t| row.trade.trade_type == t))
            .filter(|row| {
                filter
                    .goods_item_id
                    .as_deref()
                    .map_or(true, |gid| row.trade.goods_item_id == gid)
            })
            .filter(|row| {
                filter
                    .category_id
                    .as_deref()
                    .map_or(true, |cid| row.resolved_category_id() == Some(cid))
            })
            .collect();
        sort_recency(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, input: &NewTrade) -> AppResult<Trade> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if !tables.goods_items.contains_key(&input.goods_item_id) {
            return Err(AppError::Conflict(format!(
                "unknown goods item: {}",
                input.goods_item_id
            )));
        }
        let now = Utc::now();
        let row = Trade {
            id: Self::mint_id(),
            goods_item_id: input.goods_item_id.clone(),
            user_id: self.owner.clone(),
            partner_name: input.partner_name.clone(),
            item_name: input.item_name.clone(),
            quantity: input.quantity,
            trade_type: input.trade_type,
            status: input.status.unwrap_or(TradeStatus::Planned),
            payment_method: input.payment_method,
            notes: input.notes.clone(),
            shipping_deadline: input.shipping_deadline,
            created_at: now,
            updated_at: now,
        };
        tables.trades.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, input: &UpdateTrade) -> AppResult<Trade> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if let Some(goods_item_id) = &input.goods_item_id {
            if !tables.goods_items.contains_key(goods_item_id) {
                return Err(AppError::Conflict(format!(
                    "unknown goods item: {goods_item_id}"
                )));
            }
        }
        let row = tables.trades.get_mut(id).ok_or(AppError::NotFound)?;
        if let Some(goods_item_id) = &input.goods_item_id {
            row.goods_item_id = goods_item_id.clone();
        }
        if let Some(partner_name) = &input.partner_name {
            row.partner_name = partner_name.clone();
        }
        if let Some(item_name) = &input.item_name {
            row.item_name = item_name.clone();
        }
        if let Some(quantity) = input.quantity {
            row.quantity = quantity;
        }
        if let Some(trade_type) = input.trade_type {
            row.trade_type = trade_type;
        }
        if let Some(status) = input.status {
            row.status = status;
        }
        if let Some(payment_method) = input.payment_method {
            row.payment_method = Some(payment_method);
        }
        if let Some(notes) = &input.notes {
            row.notes = Some(notes.clone());
        }
        if let Some(deadline) = input.shipping_deadline {
            row.shipping_deadline = Some(deadline);
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn batch_update_status(&self, ids: &[String], status: TradeStatus) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        for id in ids {
            if let Some(row) = tables.trades.get_mut(id) {
                row.status = status;
                row.updated_at = now;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if tables.trades.remove(id).is_none() {
            return Err(AppError::NotFound);
        }
        tables.todos.retain(|_, td| td.trade_id != id);
        Ok(())
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<TradeWithGoods>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<TradeWithGoods> = tables
            .trades
            .values()
            .filter(|t| {
                matches!(
                    t.status,
                    TradeStatus::Planned | TradeStatus::Negotiating | TradeStatus::Confirmed
                ) && t.shipping_deadline.is_some_and(|d| d < today)
            })
            .map(|t| join_goods(&tables, t))
            .collect();
        sort_recency(&mut rows);
        Ok(rows)
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<TradeWithGoods>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<TradeWithGoods> =
            tables.trades.values().map(|t| join_goods(&tables, t)).collect();
        sort_recency(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn list_by_trade(&self, trade_id: &str) -> AppResult<Vec<Todo>> {
        self.take_fault()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Todo> = tables
            .todos
            .values()
            .filter(|td| td.trade_id == trade_id)
            .cloned()
            .collect();
        rows.sort_by_key(|td| td.sort_order);
        Ok(rows)
    }

    async fn insert(&self, input: &NewTodo) -> AppResult<Todo> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if !tables.trades.contains_key(&input.trade_id) {
            return Err(AppError::Conflict(format!("unknown trade: {}", input.trade_id)));
        }
        let sort_order = input.sort_order.unwrap_or_else(|| {
            tables
                .todos
                .values()
                .filter(|td| td.trade_id == input.trade_id)
                .map(|td| td.sort_order + 1)
                .max()
                .unwrap_or(0)
        });
        let row = Todo {
            id: Self::mint_id(),
            trade_id: input.trade_id.clone(),
            user_id: self.owner.clone(),
            title: input.title.clone(),
            is_done: false,
            sort_order,
            created_at: Utc::now(),
        };
        tables.todos.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn insert_batch(&self, trade_id: &str, titles: &[String]) -> AppResult<Vec<Todo>> {
        let mut rows = Vec::with_capacity(titles.len());
        for title in titles {
            rows.push(
                TodoRepository::insert(
                    self,
                    &NewTodo {
                        trade_id: trade_id.to_string(),
                        title: title.clone(),
                        sort_order: None,
                    },
                )
                .await?,
            );
        }
        Ok(rows)
    }

    async fn update(&self, id: &str, input: &UpdateTodo) -> AppResult<Todo> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        let row = tables.todos.get_mut(id).ok_or(AppError::NotFound)?;
        if let Some(title) = &input.title {
            row.title = title.clone();
        }
        if let Some(is_done) = input.is_done {
            row.is_done = is_done;
        }
        if let Some(sort_order) = input.sort_order {
            row.sort_order = sort_order;
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        if tables.todos.remove(id).is_none() {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn reorder(&self, trade_id: &str, orders: &[SortOrderUpdate]) -> AppResult<()> {
        self.take_fault()?;
        let mut tables = self.tables.write().await;
        for order in orders {
            let row = tables.todos.get_mut(&order.id).ok_or(AppError::NotFound)?;
            if row.trade_id != trade_id {
                return Err(AppError::Validation(format!(
                    "todo {} does not belong to trade {trade_id}",
                    order.id
                )));
            }
            row.sort_order = order.sort_order;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TradeType;

    async fn seed(store: &MemoryStore) -> (Category, GoodsItem, Trade) {
        let category = CategoryRepository::insert(
            store,
            &NewCategory {
                name: "Badges".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let item = GoodsItemRepository::insert(
            store,
            &NewGoodsItem {
                category_id: category.id.clone(),
                name: "Tour badge".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let trade = TradeRepository::insert(
            store,
            &NewTrade {
                goods_item_id: item.id.clone(),
                partner_name: "aoi".into(),
                item_name: "badge A".into(),
                quantity: 1,
                trade_type: TradeType::Exchange,
                status: None,
                payment_method: None,
                notes: None,
                shipping_deadline: None,
            },
        )
        .await
        .unwrap();
        (category, item, trade)
    }

    #[tokio::test]
    async fn category_delete_cascades_to_subtree() {
        let store = MemoryStore::new("user-1");
        let (category, item, trade) = seed(&store).await;

        TodoRepository::insert(
            &store,
            &NewTodo {
                trade_id: trade.id.clone(),
                title: "pack it".into(),
                sort_order: None,
            },
        )
        .await
        .unwrap();

        CategoryRepository::delete(&store, &category.id).await.unwrap();

        assert!(GoodsItemRepository::get(&store, &item.id).await.unwrap().is_none());
        assert!(TradeRepository::get(&store, &trade.id).await.unwrap().is_none());
        assert!(TodoRepository::list_by_trade(&store, &trade.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_category_name_conflicts() {
        let store = MemoryStore::new("user-1");
        seed(&store).await;
        let err = CategoryRepository::insert(
            &store,
            &NewCategory {
                name: "Badges".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn dangling_parent_is_rejected() {
        let store = MemoryStore::new("user-1");
        let err = GoodsItemRepository::insert(
            &store,
            &NewGoodsItem {
                category_id: "missing".into(),
                name: "orphan".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn injected_faults_surface_in_order() {
        let store = MemoryStore::new("user-1");
        store.inject_fault(AppError::Transport("boom".into()));
        let err = CategoryRepository::list(&store).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        // Queue drained, next call succeeds.
        assert!(CategoryRepository::list(&store).await.is_ok());
    }

    #[tokio::test]
    async fn overdue_excludes_shipped_and_terminal() {
        let store = MemoryStore::new("user-1");
        let (_, item, trade) = seed(&store).await;
        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        TradeRepository::update(
            &store,
            &trade.id,
            &UpdateTrade {
                shipping_deadline: Some(yesterday),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let today = Utc::now().date_naive();
        assert_eq!(TradeRepository::list_overdue(&store, today).await.unwrap().len(), 1);

        for status in [TradeStatus::Shipped, TradeStatus::Completed] {
            TradeRepository::update(
                &store,
                &trade.id,
                &UpdateTrade {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert!(TradeRepository::list_overdue(&store, today).await.unwrap().is_empty());
        }
        let _ = item;
    }
}

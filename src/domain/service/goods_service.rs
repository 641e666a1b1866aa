use std::sync::Arc;

use tracing::info;

use crate::domain::model::{
    AppError, AppResult, GoodsItem, GoodsItemStatistics, GoodsItemWithCategory,
    GoodsItemWithTrades, NewGoodsItem, SortOrderUpdate, UpdateGoodsItem,
};
use crate::domain::repository::GoodsItemRepository;
use crate::domain::service::statistics::StatsAggregator;
use crate::infra::cache::{MutationEvent, QueryCache, ScopeKey};

#[derive(Clone)]
pub struct GoodsService {
    goods: Arc<dyn GoodsItemRepository>,
    aggregator: StatsAggregator,
    cache: Arc<QueryCache>,
}

impl GoodsService {
    pub fn new(
        goods: Arc<dyn GoodsItemRepository>,
        aggregator: StatsAggregator,
        cache: Arc<QueryCache>,
    ) -> Self {
        Self {
            goods,
            aggregator,
            cache,
        }
    }

    pub async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<GoodsItemWithCategory>> {
        let repo = Arc::clone(&self.goods);
        let cid = category_id.to_string();
        self.cache
            .fetch(ScopeKey::goods_by_category(category_id), move || {
                let repo = Arc::clone(&repo);
                let cid = cid.clone();
                async move { repo.list_by_category(&cid).await }
            })
            .await
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<GoodsItemWithCategory>> {
        let repo = Arc::clone(&self.goods);
        let id_owned = id.to_string();
        self.cache
            .fetch(ScopeKey::goods_item(id), move || {
                let repo = Arc::clone(&repo);
                let id = id_owned.clone();
                async move { repo.get(&id).await }
            })
            .await
    }

    pub async fn get_with_trades(&self, id: &str) -> AppResult<Option<GoodsItemWithTrades>> {
        let repo = Arc::clone(&self.goods);
        let id_owned = id.to_string();
        self.cache
            .fetch(ScopeKey::goods_with_trades(id), move || {
                let repo = Arc::clone(&repo);
                let id = id_owned.clone();
                async move { repo.get_with_trades(&id).await }
            })
            .await
    }

    pub async fn list_all(&self) -> AppResult<Vec<GoodsItemWithCategory>> {
        let repo = Arc::clone(&self.goods);
        self.cache
            .fetch(ScopeKey::goods_all(), move || {
                let repo = Arc::clone(&repo);
                async move { repo.list_all().await }
            })
            .await
    }

    pub async fn search(
        &self,
        query: &str,
        category_id: Option<&str>,
    ) -> AppResult<Vec<GoodsItemWithCategory>> {
        let query = query.trim().to_string();
        let repo = Arc::clone(&self.goods);
        let cid = category_id.map(str::to_string);
        self.cache
            .fetch(ScopeKey::goods_search(&query, category_id), move || {
                let repo = Arc::clone(&repo);
                let query = query.clone();
                let cid = cid.clone();
                async move { repo.search(&query, cid.as_deref()).await }
            })
            .await
    }

    /// Appends at the destination category's tail unless the input pins a
    /// sort order.
    pub async fn create(&self, mut input: NewGoodsItem) -> AppResult<GoodsItem> {
        if input.sort_order.is_none() {
            let tail = self
                .goods
                .max_sort_order_in_category(&input.category_id)
                .await?;
            input.sort_order = Some(tail.map_or(0, |t| t + 1));
        }
        let created = self.goods.insert(&input).await?;
        info!(id = %created.id, category_id = %created.category_id, "goods item created");
        self.cache
            .apply(&MutationEvent::GoodsItemCreated {
                category_id: created.category_id.clone(),
            })
            .await?;
        Ok(created)
    }

    /// Reads the pre-image first: when the update reassigns the category,
    /// the origin scope has to fall in the same invalidation round as the
    /// destination, or its list keeps the item forever.
    pub async fn update(&self, id: &str, input: &UpdateGoodsItem) -> AppResult<GoodsItem> {
        let before = self.goods.get(id).await?.ok_or(AppError::NotFound)?;
        let updated = self.goods.update(id, input).await?;
        self.cache
            .apply(&MutationEvent::GoodsItemUpdated {
                id: id.to_string(),
                old_category_id: before.item.category_id,
                new_category_id: updated.category_id.clone(),
            })
            .await?;
        Ok(updated)
    }

    /// Cross-category move, appended at the destination tail.
    pub async fn move_to_category(&self, id: &str, category_id: &str) -> AppResult<GoodsItem> {
        let tail = self.goods.max_sort_order_in_category(category_id).await?;
        self.update(
            id,
            &UpdateGoodsItem {
                category_id: Some(category_id.to_string()),
                sort_order: Some(tail.map_or(0, |t| t + 1)),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let before = self.goods.get(id).await?.ok_or(AppError::NotFound)?;
        self.goods.delete(id).await?;
        info!(id, "goods item deleted");
        self.cache
            .apply(&MutationEvent::GoodsItemDeleted {
                id: id.to_string(),
                category_id: before.item.category_id,
            })
            .await
    }

    pub async fn update_sort_order(
        &self,
        category_id: &str,
        orders: &[SortOrderUpdate],
    ) -> AppResult<()> {
        self.goods.update_sort_orders(orders).await?;
        self.cache
            .apply(&MutationEvent::GoodsItemsReordered {
                category_id: category_id.to_string(),
            })
            .await
    }

    pub async fn stats(&self, goods_item_id: &str) -> AppResult<GoodsItemStatistics> {
        let aggregator = self.aggregator.clone();
        let gid = goods_item_id.to_string();
        self.cache
            .fetch(ScopeKey::goods_item_stats(goods_item_id), move || {
                let aggregator = aggregator.clone();
                let gid = gid.clone();
                async move { aggregator.aggregate_goods_item(&gid).await }
            })
            .await
    }
}

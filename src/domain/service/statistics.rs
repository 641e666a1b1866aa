use std::sync::Arc;

use crate::domain::model::{
    AppResult, CategoryStatistics, GoodsItemStatistics, StatusBucket, Trade,
};
use crate::domain::repository::{CategoryRepository, GoodsItemRepository, TradeRepository};

/// Full re-aggregation from fresh reads. Counters are never adjusted
/// incrementally: a parent reassignment or a batch mutation would make
/// incremental bookkeeping double-count or drift, so every call re-derives
/// from the store and the cache decides how long the result lives.
#[derive(Clone)]
pub struct StatsAggregator {
    categories: Arc<dyn CategoryRepository>,
    goods: Arc<dyn GoodsItemRepository>,
    trades: Arc<dyn TradeRepository>,
}

impl StatsAggregator {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        goods: Arc<dyn GoodsItemRepository>,
        trades: Arc<dyn TradeRepository>,
    ) -> Self {
        Self {
            categories,
            goods,
            trades,
        }
    }

    pub async fn aggregate_category(&self, category_id: &str) -> AppResult<CategoryStatistics> {
        let goods = self.goods.list_by_category(category_id).await?;
        let trades = self.trades.list_by_category(category_id).await?;
        let mut stats = CategoryStatistics {
            category_id: category_id.to_string(),
            goods_count: goods.len(),
            ..Default::default()
        };
        bucket_counts(
            &trades,
            &mut stats.total_trades,
            &mut stats.active_trades,
            &mut stats.completed_trades,
            &mut stats.canceled_trades,
        );
        Ok(stats)
    }

    pub async fn aggregate_goods_item(&self, goods_item_id: &str) -> AppResult<GoodsItemStatistics> {
        let trades = self.trades.list_by_goods_item(goods_item_id).await?;
        let mut stats = GoodsItemStatistics::default();
        bucket_counts(
            &trades,
            &mut stats.total,
            &mut stats.active,
            &mut stats.completed,
            &mut stats.canceled,
        );
        Ok(stats)
    }

    /// Per-category statistics for every category, in category list order.
    pub async fn aggregate_all(&self) -> AppResult<Vec<CategoryStatistics>> {
        let categories = self.categories.list().await?;
        let mut rows = Vec::with_capacity(categories.len());
        for category in &categories {
            rows.push(self.aggregate_category(&category.id).await?);
        }
        Ok(rows)
    }
}

/// Single grouping pass over the freshly-read trades, through the one
/// central status -> bucket mapping.
fn bucket_counts(
    trades: &[Trade],
    total: &mut usize,
    active: &mut usize,
    completed: &mut usize,
    canceled: &mut usize,
) {
    for trade in trades {
        *total += 1;
        match trade.status.bucket() {
            StatusBucket::Active => *active += 1,
            StatusBucket::Completed => *completed += 1,
            StatusBucket::Canceled => *canceled += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        NewCategory, NewGoodsItem, NewTrade, TradeStatus, TradeType, UpdateGoodsItem,
    };
    use crate::infra::memory::MemoryStore;

    fn aggregator(store: &Arc<MemoryStore>) -> StatsAggregator {
        StatsAggregator::new(store.clone(), store.clone(), store.clone())
    }

    async fn seed_category(store: &Arc<MemoryStore>, name: &str) -> String {
        CategoryRepository::insert(
            store.as_ref(),
            &NewCategory {
                name: name.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_goods(store: &Arc<MemoryStore>, category_id: &str, name: &str) -> String {
        GoodsItemRepository::insert(
            store.as_ref(),
            &NewGoodsItem {
                category_id: category_id.into(),
                name: name.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_trade(store: &Arc<MemoryStore>, goods_item_id: &str, status: TradeStatus) {
        TradeRepository::insert(
            store.as_ref(),
            &NewTrade {
                goods_item_id: goods_item_id.into(),
                partner_name: "partner".into(),
                item_name: "item".into(),
                quantity: 1,
                trade_type: TradeType::Exchange,
                status: Some(status),
                payment_method: None,
                notes: None,
                shipping_deadline: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn buckets_follow_the_central_mapping() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let cid = seed_category(&store, "Badges").await;
        let gid = seed_goods(&store, &cid, "Tour badge").await;
        for status in [
            TradeStatus::Planned,
            TradeStatus::Shipped,
            TradeStatus::Confirmed,
            TradeStatus::Completed,
            TradeStatus::Completed,
            TradeStatus::Canceled,
        ] {
            seed_trade(&store, &gid, status).await;
        }

        let stats = aggregator(&store).aggregate_goods_item(&gid).await.unwrap();
        assert_eq!(stats.total, 6);
        assert_eq!(stats.active, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.canceled, 1);
    }

    #[tokio::test]
    async fn category_counts_follow_a_move_without_drift() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let cat_a = seed_category(&store, "A").await;
        let cat_b = seed_category(&store, "B").await;
        let gid = seed_goods(&store, &cat_a, "item").await;
        seed_trade(&store, &gid, TradeStatus::Planned).await;
        seed_trade(&store, &gid, TradeStatus::Completed).await;

        let agg = aggregator(&store);
        let before_a = agg.aggregate_category(&cat_a).await.unwrap();
        assert_eq!((before_a.goods_count, before_a.total_trades), (1, 2));

        // Reassign the goods item; re-aggregation must shift the whole
        // subtree in one step, nothing left behind and nothing doubled.
        GoodsItemRepository::update(
            store.as_ref(),
            &gid,
            &UpdateGoodsItem {
                category_id: Some(cat_b.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let after_a = agg.aggregate_category(&cat_a).await.unwrap();
        let after_b = agg.aggregate_category(&cat_b).await.unwrap();
        assert_eq!((after_a.goods_count, after_a.total_trades), (0, 0));
        assert_eq!((after_b.goods_count, after_b.total_trades), (1, 2));
        assert_eq!(after_b.active_trades, 1);
        assert_eq!(after_b.completed_trades, 1);
    }

    #[tokio::test]
    async fn aggregate_all_covers_every_category_in_list_order() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let cat_a = seed_category(&store, "A").await;
        let cat_b = seed_category(&store, "B").await;
        let gid = seed_goods(&store, &cat_b, "item").await;
        seed_trade(&store, &gid, TradeStatus::Negotiating).await;

        let rows = aggregator(&store).aggregate_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        let ids: Vec<&str> = rows.iter().map(|r| r.category_id.as_str()).collect();
        assert!(ids.contains(&cat_a.as_str()) && ids.contains(&cat_b.as_str()));
        let b = rows.iter().find(|r| r.category_id == cat_b).unwrap();
        assert_eq!(b.active_trades, 1);
    }
}

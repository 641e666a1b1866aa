use std::sync::Arc;

use tracing::warn;

use crate::domain::model::{AppResult, StatusBucket};
use crate::domain::repository::{GoodsItemRepository, TradeRepository};

/// Point-in-time preview of what a category delete would cascade over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryDeleteImpact {
    pub goods_count: usize,
    pub trades_count: usize,
}

/// Point-in-time preview of what a goods-item delete would cascade over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoodsItemDeleteImpact {
    pub total_trades: usize,
    pub active_trades: usize,
    pub completed_trades: usize,
}

/// Advisory read-only preview before a destructive action. Reads the store
/// directly (never the cache: the preview must reflect right now), mutates
/// nothing, and does not participate in the cache lifecycle. The remote
/// store's cascade is the actual integrity mechanism; this is for the
/// confirmation dialog.
#[derive(Clone)]
pub struct DeleteImpactAnalyzer {
    goods: Arc<dyn GoodsItemRepository>,
    trades: Arc<dyn TradeRepository>,
}

impl DeleteImpactAnalyzer {
    pub fn new(goods: Arc<dyn GoodsItemRepository>, trades: Arc<dyn TradeRepository>) -> Self {
        Self { goods, trades }
    }

    pub async fn preview_category_delete(
        &self,
        category_id: &str,
    ) -> AppResult<CategoryDeleteImpact> {
        let goods = self.goods.list_by_category(category_id).await?;
        let trades = self.trades.list_by_category(category_id).await?;
        Ok(CategoryDeleteImpact {
            goods_count: goods.len(),
            trades_count: trades.len(),
        })
    }

    pub async fn preview_goods_item_delete(
        &self,
        goods_item_id: &str,
    ) -> AppResult<GoodsItemDeleteImpact> {
        let trades = self.trades.list_by_goods_item(goods_item_id).await?;
        let mut impact = GoodsItemDeleteImpact {
            total_trades: trades.len(),
            ..Default::default()
        };
        for trade in &trades {
            match trade.status.bucket() {
                StatusBucket::Active => impact.active_trades += 1,
                StatusBucket::Completed => impact.completed_trades += 1,
                StatusBucket::Canceled => {}
            }
        }
        Ok(impact)
    }

    /// `None` when the preview query fails: the confirmation dialog falls
    /// back to a generic message instead of blocking the delete.
    pub async fn preview_category_delete_or_generic(
        &self,
        category_id: &str,
    ) -> Option<CategoryDeleteImpact> {
        match self.preview_category_delete(category_id).await {
            Ok(impact) => Some(impact),
            Err(err) => {
                warn!(category_id, error = %err, "delete impact preview degraded");
                None
            }
        }
    }

    pub async fn preview_goods_item_delete_or_generic(
        &self,
        goods_item_id: &str,
    ) -> Option<GoodsItemDeleteImpact> {
        match self.preview_goods_item_delete(goods_item_id).await {
            Ok(impact) => Some(impact),
            Err(err) => {
                warn!(goods_item_id, error = %err, "delete impact preview degraded");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AppError, NewCategory, NewGoodsItem, NewTrade, TradeStatus, TradeType,
    };
    use crate::domain::repository::CategoryRepository;
    use crate::infra::memory::MemoryStore;

    async fn seed_item_with_trades(store: &Arc<MemoryStore>) -> (String, String) {
        let cid = CategoryRepository::insert(
            store.as_ref(),
            &NewCategory {
                name: "Badges".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id;
        let gid = GoodsItemRepository::insert(
            store.as_ref(),
            &NewGoodsItem {
                category_id: cid.clone(),
                name: "Tour badge".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id;
        for status in [
            TradeStatus::Planned,
            TradeStatus::Shipped,
            TradeStatus::Confirmed,
            TradeStatus::Completed,
            TradeStatus::Completed,
        ] {
            TradeRepository::insert(
                store.as_ref(),
                &NewTrade {
                    goods_item_id: gid.clone(),
                    partner_name: "partner".into(),
                    item_name: "badge".into(),
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
        (cid, gid)
    }

    #[tokio::test]
    async fn goods_item_preview_counts_by_bucket() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (_, gid) = seed_item_with_trades(&store).await;
        let analyzer = DeleteImpactAnalyzer::new(store.clone(), store.clone());

        let impact = analyzer.preview_goods_item_delete(&gid).await.unwrap();
        assert_eq!(
            impact,
            GoodsItemDeleteImpact {
                total_trades: 5,
                active_trades: 3,
                completed_trades: 2,
            }
        );
    }

    #[tokio::test]
    async fn category_preview_counts_the_subtree() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (cid, _) = seed_item_with_trades(&store).await;
        let analyzer = DeleteImpactAnalyzer::new(store.clone(), store.clone());

        let impact = analyzer.preview_category_delete(&cid).await.unwrap();
        assert_eq!(
            impact,
            CategoryDeleteImpact {
                goods_count: 1,
                trades_count: 5,
            }
        );
    }

    #[tokio::test]
    async fn preview_degrades_instead_of_blocking() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (cid, gid) = seed_item_with_trades(&store).await;
        let analyzer = DeleteImpactAnalyzer::new(store.clone(), store.clone());

        store.inject_fault(AppError::Transport("offline".into()));
        assert_eq!(analyzer.preview_category_delete_or_generic(&cid).await, None);

        // The delete path itself is unaffected by the failed preview.
        GoodsItemRepository::delete(store.as_ref(), &gid).await.unwrap();
        assert!(TradeRepository::list_by_goods_item(store.as_ref(), &gid)
            .await
            .unwrap()
            .is_empty());
    }
}

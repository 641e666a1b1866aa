use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::model::{
    AppError, AppResult, NewTrade, Trade, TradeSearchFilter, TradeStatus, TradeWithGoods,
    UpdateTrade,
};
use crate::domain::repository::TradeRepository;
use crate::infra::cache::{MutationEvent, QueryCache, ScopeKey};

#[derive(Clone)]
pub struct TradeService {
    trades: Arc<dyn TradeRepository>,
    cache: Arc<QueryCache>,
}

impl TradeService {
    pub fn new(trades: Arc<dyn TradeRepository>, cache: Arc<QueryCache>) -> Self {
        Self { trades, cache }
    }

    pub async fn list(&self) -> AppResult<Vec<TradeWithGoods>> {
        let repo = Arc::clone(&self.trades);
        self.cache
            .fetch(ScopeKey::trades_all(), move || {
                let repo = Arc::clone(&repo);
                async move { repo.list_all().await }
            })
            .await
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<TradeWithGoods>> {
        let repo = Arc::clone(&self.trades);
        let id_owned = id.to_string();
        self.cache
            .fetch(ScopeKey::trade(id), move || {
                let repo = Arc::clone(&repo);
                let id = id_owned.clone();
                async move { repo.get(&id).await }
            })
            .await
    }

    pub async fn list_by_goods_item(&self, goods_item_id: &str) -> AppResult<Vec<Trade>> {
        let repo = Arc::clone(&self.trades);
        let gid = goods_item_id.to_string();
        self.cache
            .fetch(ScopeKey::trades_by_goods_item(goods_item_id), move || {
                let repo = Arc::clone(&repo);
                let gid = gid.clone();
                async move { repo.list_by_goods_item(&gid).await }
            })
            .await
    }

    pub async fn search(
        &self,
        query: &str,
        filter: &TradeSearchFilter,
    ) -> AppResult<Vec<TradeWithGoods>> {
        let query = query.trim().to_string();
        let repo = Arc::clone(&self.trades);
        let filter_owned = filter.clone();
        self.cache
            .fetch(ScopeKey::trades_search(&query, filter), move || {
                let repo = Arc::clone(&repo);
                let query = query.clone();
                let filter = filter_owned.clone();
                async move { repo.search(&query, &filter).await }
            })
            .await
    }

    pub async fn overdue(&self) -> AppResult<Vec<TradeWithGoods>> {
        let repo = Arc::clone(&self.trades);
        self.cache
            .fetch(ScopeKey::trades_overdue(), move || {
                let repo = Arc::clone(&repo);
                async move { repo.list_overdue(Utc::now().date_naive()).await }
            })
            .await
    }

    pub async fn recent(&self, limit: usize) -> AppResult<Vec<TradeWithGoods>> {
        let repo = Arc::clone(&self.trades);
        self.cache
            .fetch(ScopeKey::trades_recent(limit), move || {
                let repo = Arc::clone(&repo);
                async move { repo.list_recent(limit).await }
            })
            .await
    }

    pub async fn create(&self, input: NewTrade) -> AppResult<Trade> {
        let created = self.trades.insert(&input).await?;
        info!(id = %created.id, goods_item_id = %created.goods_item_id, "trade created");
        self.cache
            .apply(&MutationEvent::TradeCreated {
                goods_item_id: created.goods_item_id.clone(),
            })
            .await?;
        Ok(created)
    }

    /// Reads the pre-image first: a reassignment to another goods item must
    /// invalidate the origin's trade list and stats alongside the
    /// destination's, and a status change is checked against terminality
    /// before it reaches the store.
    pub async fn update(&self, id: &str, input: &UpdateTrade) -> AppResult<Trade> {
        let before = self.trades.get(id).await?.ok_or(AppError::NotFound)?;
        if let Some(next) = input.status {
            if next != before.trade.status && !before.trade.status.can_transition(next) {
                return Err(AppError::Validation(format!(
                    "illegal status transition: {} -> {}",
                    before.trade.status.as_str(),
                    next.as_str()
                )));
            }
        }
        let updated = self.trades.update(id, input).await?;
        self.cache
            .apply(&MutationEvent::TradeUpdated {
                id: id.to_string(),
                old_goods_item_id: before.trade.goods_item_id,
                goods_item_id: updated.goods_item_id.clone(),
            })
            .await?;
        Ok(updated)
    }

    pub async fn update_status(&self, id: &str, status: TradeStatus) -> AppResult<Trade> {
        self.update(
            id,
            &UpdateTrade {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Bulk lifecycle step. All-or-nothing: a terminal trade in the batch
    /// rejects the whole call before anything is written.
    pub async fn batch_update_status(
        &self,
        ids: &[String],
        status: TradeStatus,
    ) -> AppResult<()> {
        let mut goods_item_ids = BTreeSet::new();
        for id in ids {
            let trade = self.trades.get(id).await?.ok_or(AppError::NotFound)?;
            if trade.trade.status != status && !trade.trade.status.can_transition(status) {
                return Err(AppError::Validation(format!(
                    "illegal status transition for {id}: {} -> {}",
                    trade.trade.status.as_str(),
                    status.as_str()
                )));
            }
            goods_item_ids.insert(trade.trade.goods_item_id);
        }
        self.trades.batch_update_status(ids, status).await?;
        self.cache
            .apply(&MutationEvent::TradesBatchStatusUpdated {
                goods_item_ids: goods_item_ids.into_iter().collect(),
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let before = self.trades.get(id).await?.ok_or(AppError::NotFound)?;
        self.trades.delete(id).await?;
        info!(id, "trade deleted");
        self.cache
            .apply(&MutationEvent::TradeDeleted {
                id: id.to_string(),
                goods_item_id: before.trade.goods_item_id,
            })
            .await
    }
}

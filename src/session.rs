use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::info;

use crate::domain::repository::{
    CategoryRepository, GoodsItemRepository, TodoRepository, TradeRepository,
};
use crate::domain::service::{
    CategoryService, DeleteImpactAnalyzer, GoodsService, StatsAggregator, TodoService,
    TradeService,
};
use crate::filter::FilterState;
use crate::infra::cache::QueryCache;

/// Coalesces the refetch round with the UI transition that triggered the
/// mutation (a closing dialog). Cosmetic; correctness never depends on it.
const REFETCH_COALESCE_DELAY: Duration = Duration::from_millis(120);

/// Everything scoped to one authenticated session: the store handles, the
/// query cache and the filter state, wired into the services. Constructed
/// at session start, fully reset on sign-out; independent instances do not
/// share state, so tests (and concurrent sessions) get isolation for free.
pub struct SessionContext {
    owner: String,
    cache: Arc<QueryCache>,
    filter: Mutex<FilterState>,
    categories: CategoryService,
    goods: GoodsService,
    trades: TradeService,
    todos: TodoService,
    delete_impact: DeleteImpactAnalyzer,
}

impl SessionContext {
    pub fn new<S>(owner: impl Into<String>, store: Arc<S>) -> Self
    where
        S: CategoryRepository
            + GoodsItemRepository
            + TradeRepository
            + TodoRepository
            + 'static,
    {
        Self::with_refetch_delay(owner, store, REFETCH_COALESCE_DELAY)
    }

    /// Tests pass `Duration::ZERO`; the default delay exists purely for
    /// screen-transition feel.
    pub fn with_refetch_delay<S>(
        owner: impl Into<String>,
        store: Arc<S>,
        refetch_delay: Duration,
    ) -> Self
    where
        S: CategoryRepository
            + GoodsItemRepository
            + TradeRepository
            + TodoRepository
            + 'static,
    {
        let owner = owner.into();
        let cache = Arc::new(QueryCache::with_refetch_delay(refetch_delay));
        let categories: Arc<dyn CategoryRepository> = store.clone();
        let goods: Arc<dyn GoodsItemRepository> = store.clone();
        let trades: Arc<dyn TradeRepository> = store.clone();
        let todos: Arc<dyn TodoRepository> = store;
        let aggregator =
            StatsAggregator::new(categories.clone(), goods.clone(), trades.clone());
        info!(owner = %owner, "session started");
        Self {
            categories: CategoryService::new(
                categories,
                goods.clone(),
                aggregator.clone(),
                cache.clone(),
            ),
            goods: GoodsService::new(goods.clone(), aggregator, cache.clone()),
            trades: TradeService::new(trades.clone(), cache.clone()),
            todos: TodoService::new(todos, cache.clone()),
            delete_impact: DeleteImpactAnalyzer::new(goods, trades),
            filter: Mutex::new(FilterState::new()),
            cache,
            owner,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn categories(&self) -> &CategoryService {
        &self.categories
    }

    pub fn goods(&self) -> &GoodsService {
        &self.goods
    }

    pub fn trades(&self) -> &TradeService {
        &self.trades
    }

    pub fn todos(&self) -> &TodoService {
        &self.todos
    }

    pub fn delete_impact(&self) -> &DeleteImpactAnalyzer {
        &self.delete_impact
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// The session's filter state. Single logical UI thread; the lock is
    /// only ever briefly held.
    pub fn filter(&self) -> MutexGuard<'_, FilterState> {
        self.filter.lock().unwrap()
    }

    /// Session end: drop every cached view and reset the filter so nothing
    /// leaks into the next sign-in.
    pub async fn sign_out(&self) {
        self.cache.clear().await;
        *self.filter() = FilterState::new();
        info!(owner = %self.owner, "session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NewCategory, TradeStatus};
    use crate::infra::memory::MemoryStore;

    fn session() -> SessionContext {
        crate::common::log_utils::setup_tracing();
        SessionContext::with_refetch_delay(
            "user-1",
            Arc::new(MemoryStore::new("user-1")),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn sign_out_resets_cache_and_filter() {
        let ctx = session();
        ctx.categories()
            .create(NewCategory {
                name: "Badges".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        ctx.categories().list().await.unwrap();
        ctx.filter().toggle_status(TradeStatus::Planned);
        assert!(!ctx.cache().is_empty().await);
        assert!(ctx.filter().is_filter_active());

        ctx.sign_out().await;

        assert!(ctx.cache().is_empty().await);
        assert!(!ctx.filter().is_filter_active());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let a = session();
        let b = session();
        a.categories()
            .create(NewCategory {
                name: "Badges".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(a.categories().list().await.unwrap().len(), 1);
        assert!(b.categories().list().await.unwrap().is_empty());
    }
}

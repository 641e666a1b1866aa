use std::sync::Arc;

use tracing::info;

use crate::domain::model::{
    AppResult, Category, CategoryStatistics, NewCategory, SortOrderUpdate, UpdateCategory,
};
use crate::domain::repository::{CategoryRepository, GoodsItemRepository};
use crate::domain::service::statistics::StatsAggregator;
use crate::infra::cache::{MutationEvent, QueryCache, ScopeKey};

/// Category reads through the cache, mutations through the repository with
/// the matching invalidation round applied on success. On failure the
/// cache is left exactly as it was.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    goods: Arc<dyn GoodsItemRepository>,
    aggregator: StatsAggregator,
    cache: Arc<QueryCache>,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        goods: Arc<dyn GoodsItemRepository>,
        aggregator: StatsAggregator,
        cache: Arc<QueryCache>,
    ) -> Self {
        Self {
            categories,
            goods,
            aggregator,
            cache,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        let repo = Arc::clone(&self.categories);
        self.cache
            .fetch(ScopeKey::categories(), move || {
                let repo = Arc::clone(&repo);
                async move { repo.list().await }
            })
            .await
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Category>> {
        let repo = Arc::clone(&self.categories);
        let id_owned = id.to_string();
        self.cache
            .fetch(ScopeKey::category(id), move || {
                let repo = Arc::clone(&repo);
                let id = id_owned.clone();
                async move { repo.get(&id).await }
            })
            .await
    }

    /// Appends at the tail of the owner's sort order unless the input pins
    /// one.
    pub async fn create(&self, mut input: NewCategory) -> AppResult<Category> {
        if input.sort_order.is_none() {
            let tail = self.categories.max_sort_order().await?;
            input.sort_order = Some(tail.map_or(0, |t| t + 1));
        }
        let created = self.categories.insert(&input).await?;
        info!(id = %created.id, name = %created.name, "category created");
        self.cache
            .apply(&MutationEvent::CategoryCreated {
                id: created.id.clone(),
            })
            .await?;
        Ok(created)
    }

    pub async fn update(&self, id: &str, input: &UpdateCategory) -> AppResult<Category> {
        let updated = self.categories.update(id, input).await?;
        self.cache
            .apply(&MutationEvent::CategoryUpdated { id: id.to_string() })
            .await?;
        Ok(updated)
    }

    /// The store cascades over the whole subtree; afterwards every scope
    /// that could have contained it is invalidated and the category's
    /// detail prefix is tombstoned.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.categories.delete(id).await?;
        info!(id, "category deleted");
        self.cache
            .apply(&MutationEvent::CategoryDeleted { id: id.to_string() })
            .await
    }

    pub async fn update_sort_order(&self, orders: &[SortOrderUpdate]) -> AppResult<Vec<Category>> {
        let updated = self.categories.update_sort_orders(orders).await?;
        self.cache.apply(&MutationEvent::CategoriesReordered).await?;
        Ok(updated)
    }

    /// Number of goods items under the category.
    pub async fn usage_count(&self, id: &str) -> AppResult<usize> {
        let repo = Arc::clone(&self.goods);
        let id_owned = id.to_string();
        self.cache
            .fetch(ScopeKey::category_usage(id), move || {
                let repo = Arc::clone(&repo);
                let id = id_owned.clone();
                async move { Ok(repo.list_by_category(&id).await?.len()) }
            })
            .await
    }

    /// Per-category statistics for every category.
    pub async fn statistics(&self) -> AppResult<Vec<CategoryStatistics>> {
        let aggregator = self.aggregator.clone();
        self.cache
            .fetch(ScopeKey::category_statistics(), move || {
                let aggregator = aggregator.clone();
                async move { aggregator.aggregate_all().await }
            })
            .await
    }

    pub async fn stats(&self, id: &str) -> AppResult<CategoryStatistics> {
        let aggregator = self.aggregator.clone();
        let id_owned = id.to_string();
        self.cache
            .fetch(ScopeKey::category_stats(id), move || {
                let aggregator = aggregator.clone();
                let id = id_owned.clone();
                async move { aggregator.aggregate_category(&id).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AppError;
    use crate::infra::memory::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> (CategoryService, Arc<QueryCache>) {
        let cache = Arc::new(QueryCache::new());
        let aggregator = StatsAggregator::new(store.clone(), store.clone(), store.clone());
        (
            CategoryService::new(store.clone(), store.clone(), aggregator, cache.clone()),
            cache,
        )
    }

    #[tokio::test]
    async fn create_appends_sort_order_and_refreshes_the_list() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (svc, _) = service(&store);

        let first = svc
            .create(NewCategory {
                name: "Badges".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = svc
            .create(NewCategory {
                name: "Acrylic stands".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.sort_order, 0);
        assert_eq!(second.sort_order, 1);

        let listed = svc.list().await.unwrap();
        assert_eq!(
            listed.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Badges", "Acrylic stands"]
        );
    }

    #[tokio::test]
    async fn cached_list_reflects_later_mutations() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (svc, cache) = service(&store);

        let created = svc
            .create(NewCategory {
                name: "Badges".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(svc.list().await.unwrap().len(), 1);

        svc.update(
            &created.id,
            &UpdateCategory {
                name: Some("Pins".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // Post-invalidation read is consistent with the store.
        assert_eq!(svc.list().await.unwrap()[0].name, "Pins");
        assert_eq!(cache.is_stale(&ScopeKey::categories()).await, Some(false));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_untouched() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (svc, cache) = service(&store);
        svc.create(NewCategory {
            name: "Badges".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        svc.list().await.unwrap();

        let err = svc
            .create(NewCategory {
                name: "Badges".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // No invalidation happened; the cached list is still fresh.
        assert_eq!(cache.is_stale(&ScopeKey::categories()).await, Some(false));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_invalidates_and_tombstones() {
        let store = Arc::new(MemoryStore::new("user-1"));
        let (svc, cache) = service(&store);
        let created = svc
            .create(NewCategory {
                name: "Badges".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        svc.get(&created.id).await.unwrap();

        svc.delete(&created.id).await.unwrap();

        // Detail entry dropped, not stale: it may never be re-cached.
        assert_eq!(cache.is_stale(&ScopeKey::category(&created.id)).await, None);
        assert!(svc.list().await.unwrap().is_empty());
    }
}

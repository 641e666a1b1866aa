use std::sync::Arc;

use crate::domain::model::{AppError, AppResult, NewTodo, SortOrderUpdate, Todo, UpdateTodo};
use crate::domain::repository::TodoRepository;
use crate::infra::cache::{MutationEvent, QueryCache, ScopeKey};

/// Checklist entries hanging off a trade. Fourth level of the cache
/// hierarchy; every mutation invalidates the owning trade's todo scope.
#[derive(Clone)]
pub struct TodoService {
    todos: Arc<dyn TodoRepository>,
    cache: Arc<QueryCache>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoRepository>, cache: Arc<QueryCache>) -> Self {
        Self { todos, cache }
    }

    pub async fn list(&self, trade_id: &str) -> AppResult<Vec<Todo>> {
        let repo = Arc::clone(&self.todos);
        let tid = trade_id.to_string();
        self.cache
            .fetch(ScopeKey::todos_by_trade(trade_id), move || {
                let repo = Arc::clone(&repo);
                let tid = tid.clone();
                async move { repo.list_by_trade(&tid).await }
            })
            .await
    }

    pub async fn create(&self, input: NewTodo) -> AppResult<Todo> {
        let created = self.todos.insert(&input).await?;
        self.cache
            .apply(&MutationEvent::TodosChanged {
                trade_id: created.trade_id.clone(),
            })
            .await?;
        Ok(created)
    }

    pub async fn create_batch(&self, trade_id: &str, titles: &[String]) -> AppResult<Vec<Todo>> {
        let created = self.todos.insert_batch(trade_id, titles).await?;
        self.cache
            .apply(&MutationEvent::TodosChanged {
                trade_id: trade_id.to_string(),
            })
            .await?;
        Ok(created)
    }

    pub async fn update(&self, trade_id: &str, id: &str, input: &UpdateTodo) -> AppResult<Todo> {
        let updated = self.todos.update(id, input).await?;
        self.cache
            .apply(&MutationEvent::TodosChanged {
                trade_id: trade_id.to_string(),
            })
            .await?;
        Ok(updated)
    }

    pub async fn toggle(&self, trade_id: &str, id: &str) -> AppResult<Todo> {
        let current = self
            .todos
            .list_by_trade(trade_id)
            .await?
            .into_iter()
            .find(|td| td.id == id)
            .ok_or(AppError::NotFound)?;
        self.update(
            trade_id,
            id,
            &UpdateTodo {
                is_done: Some(!current.is_done),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, trade_id: &str, id: &str) -> AppResult<()> {
        self.todos.delete(id).await?;
        self.cache
            .apply(&MutationEvent::TodosChanged {
                trade_id: trade_id.to_string(),
            })
            .await
    }

    pub async fn reorder(&self, trade_id: &str, orders: &[SortOrderUpdate]) -> AppResult<()> {
        self.todos.reorder(trade_id, orders).await?;
        self.cache
            .apply(&MutationEvent::TodosChanged {
                trade_id: trade_id.to_string(),
            })
            .await
    }
}

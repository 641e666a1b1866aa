use async_trait::async_trait;
use serde_json::json;

use crate::domain::model::{AppResult, NewTodo, SortOrderUpdate, Todo, UpdateTodo};
use crate::domain::repository::TodoRepository;
use crate::infra::remote::RestStore;

#[async_trait]
impl TodoRepository for RestStore {
    async fn list_by_trade(&self, trade_id: &str) -> AppResult<Vec<Todo>> {
        self.send(
            self.get("todos")
                .query(&[("trade_id", trade_id), ("order", "sort_order.asc")]),
        )
        .await
    }

    async fn insert(&self, input: &NewTodo) -> AppResult<Todo> {
        self.send(self.post("todos").json(input)).await
    }

    async fn insert_batch(&self, trade_id: &str, titles: &[String]) -> AppResult<Vec<Todo>> {
        self.send(
            self.post("todos/batch")
                .json(&json!({ "trade_id": trade_id, "titles": titles })),
        )
        .await
    }

    async fn update(&self, id: &str, input: &UpdateTodo) -> AppResult<Todo> {
        self.send(self.patch(&format!("todos/{id}")).json(input)).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.send_unit(self.delete_req(&format!("todos/{id}"))).await
    }

    async fn reorder(&self, trade_id: &str, orders: &[SortOrderUpdate]) -> AppResult<()> {
        self.send_unit(
            self.post("todos/reorder")
                .json(&json!({ "trade_id": trade_id, "orders": orders })),
        )
        .await
    }
}

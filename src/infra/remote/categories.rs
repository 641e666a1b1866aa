use async_trait::async_trait;

use crate::domain::model::{
    AppResult, Category, NewCategory, SortOrderUpdate, UpdateCategory,
};
use crate::domain::repository::CategoryRepository;
use crate::infra::remote::RestStore;

#[async_trait]
impl CategoryRepository for RestStore {
    async fn list(&self) -> AppResult<Vec<Category>> {
        self.send(
            self.get("categories")
                .query(&[("order", "sort_order.asc,created_at.asc")]),
        )
        .await
    }

    async fn get(&self, id: &str) -> AppResult<Option<Category>> {
        self.send_opt(self.get(&format!("categories/{id}"))).await
    }

    async fn insert(&self, input: &NewCategory) -> AppResult<Category> {
        self.send(self.post("categories").json(input)).await
    }

    async fn update(&self, id: &str, input: &UpdateCategory) -> AppResult<Category> {
        self.send(self.patch(&format!("categories/{id}")).json(input))
            .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.send_unit(self.delete_req(&format!("categories/{id}")))
            .await
    }

    async fn update_sort_orders(&self, orders: &[SortOrderUpdate]) -> AppResult<Vec<Category>> {
        self.send(self.post("categories/sort-orders").json(orders))
            .await
    }

    async fn max_sort_order(&self) -> AppResult<Option<i32>> {
        // Tail probe, same shape the goods side uses.
        let rows: Vec<Category> = self
            .send(
                self.get("categories")
                    .query(&[("order", "sort_order.desc"), ("limit", "1")]),
            )
            .await?;
        Ok(rows.first().map(|c| c.sort_order))
    }
}

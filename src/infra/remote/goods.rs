use async_trait::async_trait;

use crate::domain::model::{
    AppResult, GoodsItem, GoodsItemWithCategory, GoodsItemWithTrades, NewGoodsItem,
    SortOrderUpdate, UpdateGoodsItem,
};
use crate::domain::repository::GoodsItemRepository;
use crate::infra::remote::RestStore;

#[async_trait]
impl GoodsItemRepository for RestStore {
    async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<GoodsItemWithCategory>> {
        self.send(self.get("goods-items").query(&[
            ("category_id", category_id),
            ("embed", "category"),
            ("order", "sort_order.asc"),
        ]))
        .await
    }

    async fn get(&self, id: &str) -> AppResult<Option<GoodsItemWithCategory>> {
        self.send_opt(
            self.get(&format!("goods-items/{id}"))
                .query(&[("embed", "category")]),
        )
        .await
    }

    async fn get_with_trades(&self, id: &str) -> AppResult<Option<GoodsItemWithTrades>> {
        self.send_opt(
            self.get(&format!("goods-items/{id}"))
                .query(&[("embed", "category,trades")]),
        )
        .await
    }

    async fn list_all(&self) -> AppResult<Vec<GoodsItemWithCategory>> {
        self.send(self.get("goods-items").query(&[
            ("embed", "category"),
            ("order", "category_id.asc,sort_order.asc"),
        ]))
        .await
    }

    async fn search(
        &self,
        query: &str,
        category_id: Option<&str>,
    ) -> AppResult<Vec<GoodsItemWithCategory>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("embed", "category".to_string()),
            ("order", "sort_order.asc".to_string()),
        ];
        if let Some(cid) = category_id {
            params.push(("category_id", cid.to_string()));
        }
        self.send(self.get("goods-items/search").query(&params)).await
    }

    async fn insert(&self, input: &NewGoodsItem) -> AppResult<GoodsItem> {
        self.send(self.post("goods-items").json(input)).await
    }

    async fn update(&self, id: &str, input: &UpdateGoodsItem) -> AppResult<GoodsItem> {
        self.send(self.patch(&format!("goods-items/{id}")).json(input))
            .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.send_unit(self.delete_req(&format!("goods-items/{id}")))
            .await
    }

    async fn update_sort_orders(&self, orders: &[SortOrderUpdate]) -> AppResult<()> {
        self.send_unit(self.post("goods-items/sort-orders").json(orders))
            .await
    }

    async fn max_sort_order_in_category(&self, category_id: &str) -> AppResult<Option<i32>> {
        let rows: Vec<GoodsItem> = self
            .send(self.get("goods-items").query(&[
                ("category_id", category_id),
                ("order", "sort_order.desc"),
                ("limit", "1"),
            ]))
            .await?;
        Ok(rows.first().map(|g| g.sort_order))
    }
}

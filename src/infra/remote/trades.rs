use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use crate::domain::model::{
    AppResult, NewTrade, Trade, TradeSearchFilter, TradeStatus, TradeWithGoods, UpdateTrade,
};
use crate::domain::repository::TradeRepository;
use crate::infra::remote::RestStore;

#[async_trait]
impl TradeRepository for RestStore {
    async fn list_all(&self) -> AppResult<Vec<TradeWithGoods>> {
        self.send(self.get("trades").query(&[
            ("embed", "goods_item.category"),
            ("order", "updated_at.desc"),
        ]))
        .await
    }

    async fn get(&self, id: &str) -> AppResult<Option<TradeWithGoods>> {
        self.send_opt(
            self.get(&format!("trades/{id}"))
                .query(&[("embed", "goods_item.category")]),
        )
        .await
    }

    async fn list_by_goods_item(&self, goods_item_id: &str) -> AppResult<Vec<Trade>> {
        self.send(self.get("trades").query(&[
            ("goods_item_id", goods_item_id),
            ("order", "updated_at.desc"),
        ]))
        .await
    }

    async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<Trade>> {
        self.send(
            self.get("trades")
                .query(&[("category_id", category_id)]),
        )
        .await
    }

    async fn search(
        &self,
        query: &str,
        filter: &TradeSearchFilter,
    ) -> AppResult<Vec<TradeWithGoods>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("embed", "goods_item.category".to_string()),
            ("order", "updated_at.desc".to_string()),
        ];
        if let Some(status) = filter.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(trade_type) = filter.trade_type {
            params.push(("type", trade_type.as_str().to_string()));
        }
        if let Some(cid) = &filter.category_id {
            params.push(("category_id", cid.clone()));
        }
        if let Some(gid) = &filter.goods_item_id {
            params.push(("goods_item_id", gid.clone()));
        }
        self.send(self.get("trades/search").query(&params)).await
    }

    async fn insert(&self, input: &NewTrade) -> AppResult<Trade> {
        self.send(self.post("trades").json(input)).await
    }

    async fn update(&self, id: &str, input: &UpdateTrade) -> AppResult<Trade> {
        self.send(self.patch(&format!("trades/{id}")).json(input))
            .await
    }

    async fn batch_update_status(&self, ids: &[String], status: TradeStatus) -> AppResult<()> {
        self.send_unit(
            self.post("trades/status")
                .json(&json!({ "ids": ids, "status": status })),
        )
        .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.send_unit(self.delete_req(&format!("trades/{id}"))).await
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<TradeWithGoods>> {
        self.send(self.get("trades/overdue").query(&[
            ("before", today.to_string().as_str()),
            ("embed", "goods_item.category"),
        ]))
        .await
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<TradeWithGoods>> {
        self.send(self.get("trades").query(&[
            ("embed", "goods_item.category"),
            ("order", "updated_at.desc"),
            ("limit", limit.to_string().as_str()),
        ]))
        .await
    }
}

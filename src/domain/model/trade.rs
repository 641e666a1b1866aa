use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::goods_item::GoodsItemWithCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    Exchange,
    Transfer,
    Purchase,
}

impl TradeType {
    pub const ALL: [TradeType; 3] = [TradeType::Exchange, TradeType::Transfer, TradeType::Purchase];

    pub fn as_str(self) -> &'static str {
        match self {
            TradeType::Exchange => "exchange",
            TradeType::Transfer => "transfer",
            TradeType::Purchase => "purchase",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    DigitalPayment,
    Other,
}

/// Trade lifecycle. Declaration order is lifecycle order:
/// planned -> negotiating -> confirmed -> shipped -> completed, with
/// canceled reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Planned,
    Negotiating,
    Confirmed,
    Shipped,
    Completed,
    Canceled,
}

/// Aggregation bucket a status falls into. This mapping is defined once,
/// here, and consumed by the aggregator, the delete-impact analyzer and the
/// filter engine alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Active,
    Completed,
    Canceled,
}

impl TradeStatus {
    pub const ALL: [TradeStatus; 6] = [
        TradeStatus::Planned,
        TradeStatus::Negotiating,
        TradeStatus::Confirmed,
        TradeStatus::Shipped,
        TradeStatus::Completed,
        TradeStatus::Canceled,
    ];

    /// Every non-terminal status.
    pub const ACTIVE: [TradeStatus; 4] = [
        TradeStatus::Planned,
        TradeStatus::Negotiating,
        TradeStatus::Confirmed,
        TradeStatus::Shipped,
    ];

    pub fn bucket(self) -> StatusBucket {
        match self {
            TradeStatus::Completed => StatusBucket::Completed,
            TradeStatus::Canceled => StatusBucket::Canceled,
            _ => StatusBucket::Active,
        }
    }

    pub fn is_active(self) -> bool {
        self.bucket() == StatusBucket::Active
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Transitions are unconstrained in direction; only terminality binds.
    pub fn can_transition(self, _to: TradeStatus) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeStatus::Planned => "planned",
            TradeStatus::Negotiating => "negotiating",
            TradeStatus::Confirmed => "confirmed",
            TradeStatus::Shipped => "shipped",
            TradeStatus::Completed => "completed",
            TradeStatus::Canceled => "canceled",
        }
    }
}

/// Leaf of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub goods_item_id: String,
    pub user_id: String,
    pub partner_name: String,
    pub item_name: String,
    pub quantity: i32,
    pub trade_type: TradeType,
    pub status: TradeStatus,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub shipping_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrade {
    pub goods_item_id: String,
    pub partner_name: String,
    pub item_name: String,
    pub quantity: i32,
    pub trade_type: TradeType,
    /// Defaults to `Planned` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TradeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTrade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goods_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<TradeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TradeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_deadline: Option<NaiveDate>,
}

/// Trade joined across the full hierarchy. The goods-item side is optional
/// so a trade whose parent cannot be resolved still renders (and matches
/// the "uncategorized" filter sentinel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeWithGoods {
    #[serde(flatten)]
    pub trade: Trade,
    pub goods_item: Option<GoodsItemWithCategory>,
}

impl TradeWithGoods {
    /// Category the trade rolls up to, when it can be determined at all.
    pub fn resolved_category_id(&self) -> Option<&str> {
        self.goods_item.as_ref().map(|g| g.item.category_id.as_str())
    }
}

/// Server-side search dimensions (keyword search at the remote store).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeSearchFilter {
    pub status: Option<TradeStatus>,
    pub trade_type: Option<TradeType>,
    pub category_id: Option<String>,
    pub goods_item_id: Option<String>,
}

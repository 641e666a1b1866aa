use thiserror::Error;

pub(crate) mod category;
pub(crate) mod goods_item;
pub(crate) mod todo;
pub(crate) mod trade;

pub use category::{
    Category, CategoryStatistics, NewCategory, SortOrderUpdate, UpdateCategory, DEFAULT_COLOR,
    DEFAULT_ICON, PRESET_COLORS, PRESET_ICONS,
};
pub use goods_item::{
    GoodsItem, GoodsItemStatistics, GoodsItemWithCategory, GoodsItemWithTrades, NewGoodsItem,
    UpdateGoodsItem,
};
pub use todo::{NewTodo, Todo, UpdateTodo};
pub use trade::{
    NewTrade, PaymentMethod, StatusBucket, Trade, TradeSearchFilter, TradeStatus, TradeType,
    TradeWithGoods, UpdateTrade,
};

pub type AppResult<T> = Result<T, AppError>;

/// Error taxonomy shared by the repositories, the cache and the services.
/// Only `Transport` is ever retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("decode error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_retryable() {
        assert!(AppError::Transport("connection reset".into()).is_retryable());
        for err in [
            AppError::NotFound,
            AppError::Conflict("duplicate name".into()),
            AppError::Unauthorized,
            AppError::Validation("empty name".into()),
            AppError::Internal("decode error".into()),
        ] {
            assert!(!err.is_retryable(), "{err} must not be retryable");
        }
    }
}

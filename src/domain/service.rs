pub mod category_service;
pub mod delete_impact;
pub mod goods_service;
pub mod statistics;
pub mod todo_service;
pub mod trade_service;

pub use category_service::CategoryService;
pub use delete_impact::{
    CategoryDeleteImpact, DeleteImpactAnalyzer, GoodsItemDeleteImpact,
};
pub use goods_service::GoodsService;
pub use statistics::StatsAggregator;
pub use todo_service::TodoService;
pub use trade_service::TradeService;

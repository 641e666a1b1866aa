pub mod invalidation;
pub mod query_cache;
pub mod scope;

pub use invalidation::{InvalidationPlan, MutationEvent};
pub use query_cache::QueryCache;
pub use scope::ScopeKey;

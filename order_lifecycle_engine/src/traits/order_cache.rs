use thiserror::Error;

use crate::db_types::{Order, OrderId};

/// Best-effort read-through cache, keyed by order id and by owning user.
///
/// Every operation here is allowed to fail without affecting correctness of the primary
/// path: the engine logs cache errors and carries on. Writes are idempotent overwrites;
/// last-write-wins is acceptable for the cache, unlike for the durable store.
#[allow(async_fn_in_trait)]
pub trait OrderCache {
    /// Look up a single order. `None` is a miss, not an error.
    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, CacheError>;

    async fn store_order(&self, order: &Order) -> Result<(), CacheError>;

    async fn evict_order(&self, id: &OrderId) -> Result<(), CacheError>;

    /// Look up a user's cached order list (first page only).
    async fn fetch_user_orders(&self, user_id: &str) -> Result<Option<Vec<Order>>, CacheError>;

    async fn store_user_orders(&self, user_id: &str, orders: &[Order]) -> Result<(), CacheError>;

    async fn evict_user_orders(&self, user_id: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Error)]
#[error("Cache error: {0}")]
pub struct CacheError(pub String);

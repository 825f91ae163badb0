use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, OrderStatus, StatusChange},
    ole_api::order_objects::OrderQueryFilter,
};

/// The durable order store.
///
/// This is the authoritative record: a write here either happens or the whole operation
/// fails. Backends are expected to be safe for concurrent use; the engine holds no locks of
/// its own across calls.
#[allow(async_fn_in_trait)]
pub trait OrderDatabase: Clone {
    /// Store a brand-new order. The id has already been assigned; a duplicate id is a
    /// correctness bug and must be rejected, never overwritten.
    async fn insert_order(&self, order: Order) -> Result<Order, OrderDbError>;

    /// Fetch a single order, or `None` if it does not exist (soft-deleted orders count as
    /// absent).
    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderDbError>;

    /// Atomically apply a status change, conditional on the order still being in the
    /// `expected` status.
    ///
    /// Two racing updates against the same order must resolve so that exactly one wins; the
    /// loser observes [`OrderDbError::StatusConflict`] carrying the status it found. The
    /// backend stamps `updated_at` on every change, and sets `shipped_at`/`delivered_at`
    /// exactly once, on the transition into the respective status.
    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        change: StatusChange,
    ) -> Result<Order, OrderDbError>;

    /// Fetch orders matching the (already validated) filter, most recent first.
    async fn fetch_orders(&self, filter: &OrderQueryFilter) -> Result<Vec<Order>, OrderDbError>;

    /// Fetch a page of a user's orders, most recent first, along with the user's total order
    /// count.
    async fn fetch_orders_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, u64), OrderDbError>;

    /// Record the payment provider's id against the order. Set once, when a payment attempt
    /// is initiated.
    async fn set_payment_id(&self, id: &OrderId, payment_id: &str) -> Result<(), OrderDbError>;

    /// Administrative removal. Hides the order from every fetch without physically deleting
    /// the row. This is not a lifecycle transition and bypasses the state machine.
    async fn soft_delete(&self, id: &OrderId) -> Result<(), OrderDbError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderDbError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} changed concurrently: expected status {expected}, found {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },
}

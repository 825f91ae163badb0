use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatus},
    helpers::ValidationError,
    traits::{OrderDbError, PaymentGatewayError, UserValidationError},
};

/// The error surface of the order flow API.
///
/// `Validation` and `OrderNotFound` carry precise, caller-facing detail. `Conflict` is kept
/// distinct from generic store failures so a caller can decide to retry a lost race. The
/// remaining variants wrap collaborator failures and should be reported to callers without
/// internal detail.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} was modified concurrently: expected status {expected}, found {actual}")]
    Conflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },
    #[error("Order store error: {0}")]
    Database(OrderDbError),
    #[error("{0}")]
    PaymentGateway(#[from] PaymentGatewayError),
    #[error("{0}")]
    UserValidation(#[from] UserValidationError),
    #[error("Could not decode payment event payload: {0}")]
    MalformedEvent(String),
}

impl From<OrderDbError> for OrderFlowError {
    fn from(e: OrderDbError) -> Self {
        match e {
            OrderDbError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            OrderDbError::StatusConflict { order_id, expected, actual } => {
                OrderFlowError::Conflict { order_id, expected, actual }
            },
            other => OrderFlowError::Database(other),
        }
    }
}

impl OrderFlowError {
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        OrderFlowError::Validation(ValidationError::new(field, message))
    }
}

//! Contracts the order flow engine consumes from its collaborators.
//!
//! The engine owns the business rules; everything it talks to is a narrow capability defined
//! here as a trait. Concrete backends (a SQL store, a Redis cache, an HTTP payment client)
//! implement these traits; the engine never sees their mechanics.
//!
//! * [`OrderDatabase`] is the durable store. It is the only collaborator whose failures abort
//!   an operation, and it must provide atomic conditional status updates.
//! * [`OrderCache`] is a best-effort read-through cache; every operation may fail without
//!   affecting correctness of the primary path.
//! * [`PaymentGateway`] wraps the external payment provider.
//! * [`UserValidator`] answers "does this user exist and is it active".
//! * [`NotificationSender`] delivers user-facing messages; dispatch is fire-and-forget.

mod data_objects;
mod notifications;
mod order_cache;
mod order_database;
mod payment_gateway;
mod user_validation;

pub use data_objects::{
    ChargeRequest,
    Payment,
    PaymentMethod,
    PaymentRequest,
    PaymentResult,
    RefundRequest,
    RefundResult,
    RequestMeta,
};
pub use notifications::{NotificationError, NotificationRequest, NotificationSender, NotificationType};
pub use order_cache::{CacheError, OrderCache};
pub use order_database::{OrderDatabase, OrderDbError};
pub use payment_gateway::{PaymentGateway, PaymentGatewayError};
pub use user_validation::{UserValidationError, UserValidator};

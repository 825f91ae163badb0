//! Domain events and the pub-sub plumbing that carries them.
//!
//! The engine announces durable state changes (order created, status changed, order
//! cancelled) through [`EventProducers`]. Subscribers attach async hooks via [`EventHooks`];
//! each hook runs on its own queue and task, so a slow or failing subscriber can never slow
//! down or fail the operation that emitted the event.
//!
//! Inbound payment events (from the payment provider's bus or webhooks) are modelled by
//! [`PaymentEvent`] and consumed by the order flow API.

mod channel;
mod event_types;
mod hooks;
mod notify;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{
    OrderCancelledEvent,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    PaymentEvent,
    PaymentEventType,
};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use notify::start_notification_worker;

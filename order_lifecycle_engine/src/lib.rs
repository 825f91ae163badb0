//! Order Lifecycle Engine
//!
//! This library contains the core logic of the storefront order service: the order status
//! state machine, order pricing, and the orchestration of payments, cancellations and
//! refunds around it. It is backend-agnostic.
//!
//! The library is divided into three main sections:
//! 1. The domain types ([`mod@db_types`]) and pricing rules ([`mod@pricing`]). The status
//!    transition table lives on [`db_types::OrderStatus`] and is the single source of truth
//!    for legal lifecycle changes.
//! 2. The collaborator contracts ([`mod@traits`]). The durable store, cache, payment
//!    gateway, user service and notification channel are all consumed through these traits;
//!    concrete backends implement them and are wired in at startup.
//! 3. The order flow API ([`ole_api::order_flow_api::OrderFlowApi`]), which composes the
//!    above into the create/transition/cancel/pay/refund workflows and sequences their side
//!    effects: the durable write first, then best-effort cache invalidation and event
//!    publication, with user notifications dispatched fire-and-forget.
//!
//! Domain events are exposed through a small hook system ([`mod@events`]): subscribers
//! attach async handlers and receive order-created, status-changed and order-cancelled
//! events on their own queues, isolated from the request path.

pub mod config;
pub mod db_types;
pub mod events;
pub mod helpers;
mod ole_api;
pub mod pricing;
pub mod traits;

pub use config::EngineConfig;
pub use ole_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects::{OrderQueryFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery channel for user-facing messages.
///
/// The engine dispatches notifications through a fire-and-forget queue; by contract, a
/// delivery failure is invisible to the operation that triggered it.
#[allow(async_fn_in_trait)]
pub trait NotificationSender {
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderConfirmation,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient: String,
    pub notification_type: NotificationType,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

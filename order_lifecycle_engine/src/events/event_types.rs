use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatus},
    traits::RequestMeta,
};

//--------------------------------------  OrderCreatedEvent  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, meta: &RequestMeta) -> Self {
        Self { order, correlation_id: meta.request_id.clone(), timestamp: Utc::now() }
    }
}

//------------------------------------ OrderStatusChangedEvent -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub previous_status: OrderStatus,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, previous_status: OrderStatus, meta: &RequestMeta) -> Self {
        Self { order, previous_status, correlation_id: meta.request_id.clone(), timestamp: Utc::now() }
    }
}

//------------------------------------  OrderCancelledEvent  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub reason: String,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, reason: String, meta: &RequestMeta) -> Self {
        Self { order, reason, correlation_id: meta.request_id.clone(), timestamp: Utc::now() }
    }
}

//--------------------------------------  PaymentEventType   ---------------------------------------------------------
/// The type tag on an inbound payment event. Types this service does not recognise are
/// carried as [`PaymentEventType::Unknown`] and ignored by the consumer, not treated as
/// errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    Completed,
    Failed,
    Refunded,
    Unknown(String),
}

impl PaymentEventType {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentEventType::Completed => "payment.completed",
            PaymentEventType::Failed => "payment.failed",
            PaymentEventType::Refunded => "payment.refunded",
            PaymentEventType::Unknown(s) => s,
        }
    }
}

impl Display for PaymentEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for PaymentEventType {
    fn from(s: &str) -> Self {
        match s {
            "payment.completed" => Self::Completed,
            "payment.failed" => Self::Failed,
            "payment.refunded" => Self::Refunded,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl FromStr for PaymentEventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Serialize for PaymentEventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentEventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PaymentEventType::from(s.as_str()))
    }
}

//--------------------------------------    PaymentEvent     ---------------------------------------------------------
/// An inbound payment event, consumed from the payment provider's bus or decoded from a
/// webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: PaymentEventType,
    pub payment_id: String,
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use ole_common::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db_types::{OrderId, PaymentStatus};

//--------------------------------------    RequestMeta      ---------------------------------------------------------
/// Request-scoped metadata, passed alongside each order flow call.
///
/// Carries the request id that downstream events use as their correlation id. Callers that
/// already have a request id (e.g. from an inbound header) supply it; everyone else gets a
/// fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    pub request_id: String,
}

impl RequestMeta {
    pub fn new() -> Self {
        Self { request_id: Uuid::now_v7().to_string() }
    }

    pub fn with_request_id<S: Into<String>>(request_id: S) -> Self {
        Self { request_id: request_id.into() }
    }
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------   PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    PayPal,
    BankTransfer,
}

//--------------------------------------   PaymentRequest    ---------------------------------------------------------
/// A caller's request to pay for an order.
///
/// The `amount` field is advisory only: the engine always replaces it with the order's
/// authoritative total before charging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
}

//--------------------------------------    ChargeRequest    ---------------------------------------------------------
/// The charge instruction handed to the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

//--------------------------------------       Payment       ---------------------------------------------------------
/// A payment record as reported by the provider. The engine references payments, it never
/// owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub order_id: OrderId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    PaymentResult    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub payment_id: String,
    pub status: PaymentStatus,
}

//--------------------------------------    RefundRequest    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub payment_id: String,
    pub amount: Money,
    pub reason: String,
}

//--------------------------------------    RefundResult     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResult {
    pub refund_id: String,
    pub status: PaymentStatus,
}

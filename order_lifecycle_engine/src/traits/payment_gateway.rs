use thiserror::Error;

use crate::traits::{ChargeRequest, Payment, PaymentResult, RefundRequest, RefundResult};

/// The external payment provider.
///
/// The engine never retries a charge on its own: a failed charge is reported to the caller,
/// since a blind retry risks a duplicate charge. Callers deciding whether a retry is safe
/// can consult [`PaymentGatewayError::is_retryable`].
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Charge the given amount for an order. Returns the provider's payment id and the
    /// payment status as of the charge response.
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentResult, PaymentGatewayError>;

    /// Fetch the provider's current view of a payment.
    async fn payment_status(&self, payment_id: &str) -> Result<Payment, PaymentGatewayError>;

    /// Cancel a payment that has not completed yet.
    async fn cancel_payment(&self, payment_id: &str) -> Result<(), PaymentGatewayError>;

    /// Refund a completed payment.
    async fn refund(&self, request: &RefundRequest) -> Result<RefundResult, PaymentGatewayError>;

    /// Check a webhook payload against its signature.
    async fn validate_webhook(&self, payload: &[u8], signature: &str) -> Result<bool, PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    /// The provider could not be reached or answered with a server-side failure. Retryable.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
    /// The provider rejected the request outright (e.g. "payment cannot be refunded").
    /// Terminal; retrying the same request will not succeed.
    #[error("Payment request rejected: {0}")]
    Rejected(String),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(String),
}

impl PaymentGatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentGatewayError::Unavailable(_))
    }
}

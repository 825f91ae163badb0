//! Input validation for the order flow.
//!
//! Every check here runs before any durable mutation; a request that fails validation leaves
//! no trace in the system.

use thiserror::Error;

use crate::{
    db_types::{Address, NewOrder},
    traits::{PaymentMethod, PaymentRequest},
};

pub const MAX_NOTES_LEN: usize = 1000;
pub const MAX_REASON_LEN: usize = 500;

/// A rejected input, identifying the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed on {field}: {message}")]
pub struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self { field: field.into(), message: message.into() }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn validate_new_order(order: &NewOrder) -> Result<(), ValidationError> {
    if order.user_id.trim().is_empty() {
        return Err(ValidationError::new("user_id", "user id is required"));
    }
    if order.items.is_empty() {
        return Err(ValidationError::new("items", "at least one item is required"));
    }
    for item in &order.items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::new("items", "product id is required for item"));
        }
        if item.quantity == 0 {
            return Err(ValidationError::new("items", "quantity must be positive"));
        }
        if item.unit_price.is_negative() {
            return Err(ValidationError::new("items", "unit price cannot be negative"));
        }
    }
    validate_address(&order.shipping_address, "shipping_address")?;
    validate_address(&order.billing_address, "billing_address")?;
    Ok(())
}

fn validate_address(address: &Address, field: &str) -> Result<(), ValidationError> {
    if address.line1.trim().is_empty() {
        return Err(ValidationError::new(field, "address line 1 is required"));
    }
    if address.city.trim().is_empty() {
        return Err(ValidationError::new(field, "city is required"));
    }
    if address.postal_code.trim().is_empty() {
        return Err(ValidationError::new(field, "postal code is required"));
    }
    let country = address.country.trim();
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(field, "country must be a 2-letter ISO code"));
    }
    Ok(())
}

/// Escape HTML-sensitive characters in free-text notes, trim, and cap the length.
pub fn sanitize_notes(notes: &str) -> String {
    let mut sanitized = notes
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .trim()
        .to_string();
    if sanitized.len() > MAX_NOTES_LEN {
        let mut cut = MAX_NOTES_LEN;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }
    sanitized
}

/// Cancellation and refund reasons: required, bounded free text.
pub fn validate_reason(reason: &str, field: &str) -> Result<(), ValidationError> {
    if reason.trim().is_empty() {
        return Err(ValidationError::new(field, "reason is required"));
    }
    if reason.len() > MAX_REASON_LEN {
        return Err(ValidationError::new(field, "reason too long (max 500 characters)"));
    }
    Ok(())
}

pub fn validate_payment_request(request: &PaymentRequest) -> Result<(), ValidationError> {
    match request.method {
        PaymentMethod::CreditCard | PaymentMethod::DebitCard => {
            if request.card_token.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::new("card_token", "card token is required for card payments"));
            }
        },
        PaymentMethod::PayPal => {
            if request.return_url.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::new("return_url", "return URL is required for PayPal payments"));
            }
        },
        PaymentMethod::BankTransfer => {},
    }
    Ok(())
}

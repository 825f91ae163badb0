//! Order pricing.
//!
//! All amounts are carried as integer minor units. The tax multiplication is the only step
//! that can produce a fractional amount; it is rounded half-up, once, so the same inputs
//! always reproduce the same breakdown.

use ole_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{LineItem, NewLineItem},
    helpers::ValidationError,
};

/// The pricing breakdown for an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Attach a computed line total to each item, checking that every item carries the same
/// currency. Mixed-currency orders are rejected here, before any totals are derived.
pub fn price_items(items: &[NewLineItem]) -> Result<Vec<LineItem>, ValidationError> {
    let currency = match items.first() {
        Some(item) => item.unit_price.currency(),
        None => return Err(ValidationError::new("items", "at least one item is required")),
    };
    items
        .iter()
        .map(|item| {
            if item.unit_price.currency() != currency {
                return Err(ValidationError::new("items", "all items must share one currency"));
            }
            Ok(LineItem {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.unit_price * i64::from(item.quantity),
            })
        })
        .collect()
}

/// Price each item and derive the order totals in one pass.
pub fn price_order(
    items: &[NewLineItem],
    tax_rate: f64,
    shipping_fee: i64,
) -> Result<(Vec<LineItem>, OrderTotals), ValidationError> {
    let priced = price_items(items)?;
    let currency = priced[0].unit_price.currency();
    let subtotal_minor: i64 = priced.iter().map(|item| item.total.amount()).sum();
    let subtotal = Money::new(subtotal_minor, currency);
    let tax = Money::new(round_half_up(subtotal_minor as f64 * tax_rate), currency);
    let shipping = Money::new(shipping_fee, currency);
    let total = subtotal
        .checked_add(tax)
        .and_then(|t| t.checked_add(shipping))
        .map_err(|e| ValidationError::new("items", format!("order total: {e}")))?;
    Ok((priced, OrderTotals { subtotal, tax, shipping, total }))
}

/// Compute the order totals from its items, the configured tax rate and the flat shipping
/// fee (minor units, applied in the order's currency).
pub fn compute_totals(
    items: &[NewLineItem],
    tax_rate: f64,
    shipping_fee: i64,
) -> Result<OrderTotals, ValidationError> {
    price_order(items, tax_rate, shipping_fee).map(|(_, totals)| totals)
}

fn round_half_up(value: f64) -> i64 {
    // f64::round is round-half-away-from-zero; amounts here are never negative.
    value.round() as i64
}

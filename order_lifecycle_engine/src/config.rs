use std::env;

use log::*;
use ole_common::helpers::parse_boolean_flag;

const DEFAULT_TAX_RATE: f64 = 0.088;
const DEFAULT_SHIPPING_FEE: i64 = 500;
const DEFAULT_EVENT_BUFFER: usize = 100;

/// Engine configuration: pricing inputs and side-effect toggles.
///
/// Secrets and transport settings (database URLs, broker addresses, service endpoints)
/// belong to the backends that implement the collaborator contracts, not here.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Tax rate applied to the order subtotal.
    pub tax_rate: f64,
    /// Flat shipping fee in minor units, applied in the order's currency.
    pub shipping_fee: i64,
    /// When false, the cache is bypassed entirely (reads go straight to the store, and no
    /// cache writes or evictions happen).
    pub enable_caching: bool,
    /// When false, no domain events are published.
    pub enable_events: bool,
    /// Queue depth for each event hook and for the notification worker.
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            shipping_fee: DEFAULT_SHIPPING_FEE,
            enable_caching: true,
            enable_events: true,
            event_buffer_size: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let tax_rate = env::var("TAX_RATE")
            .ok()
            .and_then(|s| {
                s.parse::<f64>()
                    .map_err(|e| warn!("🪛️ {s} is not a valid value for TAX_RATE. {e} Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_TAX_RATE);
        if !(0.0..1.0).contains(&tax_rate) {
            warn!("🪛️ TAX_RATE {tax_rate} is outside [0, 1). Orders will still be priced with it as given.");
        }
        let shipping_fee = env::var("ORDER_SHIPPING_FEE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        warn!("🪛️ {s} is not a valid value for ORDER_SHIPPING_FEE. {e} Using the default.")
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_SHIPPING_FEE);
        let enable_caching = parse_boolean_flag(env::var("ENABLE_ORDER_CACHING").ok(), true);
        let enable_events = parse_boolean_flag(env::var("ENABLE_ORDER_EVENTS").ok(), true);
        let event_buffer_size = env::var("ORDER_EVENT_BUFFER")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ {s} is not a valid value for ORDER_EVENT_BUFFER. {e} Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER);
        Self { tax_rate, shipping_fee, enable_caching, enable_events, event_buffer_size }
    }
}

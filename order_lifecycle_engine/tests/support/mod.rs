//! In-memory collaborator implementations for exercising the order flow end to end.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::Utc;
use futures_util::FutureExt;
use log::*;
use ole_common::{Currency, Money};
use order_lifecycle_engine::{
    db_types::{Address, NewLineItem, NewOrder, Order, OrderId, OrderStatus, PaymentStatus, StatusChange},
    events::{
        EventHandlers, EventHooks, OrderCancelledEvent, OrderCreatedEvent, OrderStatusChangedEvent,
        start_notification_worker,
    },
    traits::{
        CacheError, ChargeRequest, NotificationError, NotificationRequest, NotificationSender, OrderCache,
        OrderDatabase, OrderDbError, Payment, PaymentGateway, PaymentGatewayError, PaymentResult, RefundRequest,
        RefundResult, UserValidationError, UserValidator,
    },
    EngineConfig, OrderFlowApi, OrderQueryFilter,
};

//--------------------------------------   MemoryDatabase    ---------------------------------------------------------
#[derive(Default)]
struct DbState {
    orders: HashMap<String, Order>,
    deleted: HashSet<String>,
}

/// A mutex-guarded in-memory order store with the same conditional-update semantics a real
/// backend must provide.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<DbState>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryDatabase {
    /// Make every subsequent write fail, to exercise the durable-write-aborts-all path.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn stored_order(&self, id: &OrderId) -> Option<Order> {
        self.state.lock().unwrap().orders.get(id.as_str()).cloned()
    }

    fn check_writable(&self) -> Result<(), OrderDbError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(OrderDbError::DatabaseError("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl OrderDatabase for MemoryDatabase {
    async fn insert_order(&self, order: Order) -> Result<Order, OrderDbError> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if state.orders.contains_key(order.id.as_str()) {
            return Err(OrderDbError::OrderAlreadyExists(order.id));
        }
        state.orders.insert(order.id.as_str().to_string(), order.clone());
        Ok(order)
    }

    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderDbError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        if state.deleted.contains(id.as_str()) {
            return Ok(None);
        }
        Ok(state.orders.get(id.as_str()).cloned())
    }

    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        change: StatusChange,
    ) -> Result<Order, OrderDbError> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if state.deleted.contains(id.as_str()) {
            return Err(OrderDbError::OrderNotFound(id.clone()));
        }
        let order = state.orders.get_mut(id.as_str()).ok_or_else(|| OrderDbError::OrderNotFound(id.clone()))?;
        if order.status != expected {
            return Err(OrderDbError::StatusConflict {
                order_id: id.clone(),
                expected,
                actual: order.status,
            });
        }
        let now = Utc::now();
        order.status = change.status;
        if change.notes.is_some() {
            order.notes = change.notes;
        }
        order.updated_at = now;
        match change.status {
            OrderStatus::Shipped => {
                order.shipped_at.get_or_insert(now);
            },
            OrderStatus::Delivered => {
                order.delivered_at.get_or_insert(now);
            },
            _ => {},
        }
        Ok(order.clone())
    }

    async fn fetch_orders(&self, filter: &OrderQueryFilter) -> Result<Vec<Order>, OrderDbError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| !state.deleted.contains(o.id.as_str()))
            .filter(|o| filter.user_id.as_deref().map_or(true, |u| o.user_id == u))
            .filter(|o| filter.status.as_ref().map_or(true, |s| s.contains(&o.status)))
            .filter(|o| filter.since.map_or(true, |since| o.created_at >= since))
            .filter(|o| filter.until.map_or(true, |until| o.created_at <= until))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.id.as_str().cmp(a.id.as_str()));
        let offset = filter.effective_offset() as usize;
        let limit = filter.effective_limit() as usize;
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    async fn fetch_orders_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, u64), OrderDbError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| !state.deleted.contains(o.id.as_str()))
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.id.as_str().cmp(a.id.as_str()));
        let total = orders.len() as u64;
        let page = orders.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect();
        Ok((page, total))
    }

    async fn set_payment_id(&self, id: &OrderId, payment_id: &str) -> Result<(), OrderDbError> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let order = state.orders.get_mut(id.as_str()).ok_or_else(|| OrderDbError::OrderNotFound(id.clone()))?;
        order.payment_id = Some(payment_id.to_string());
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete(&self, id: &OrderId) -> Result<(), OrderDbError> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if !state.orders.contains_key(id.as_str()) {
            return Err(OrderDbError::OrderNotFound(id.clone()));
        }
        state.deleted.insert(id.as_str().to_string());
        Ok(())
    }
}

//--------------------------------------    MemoryCache      ---------------------------------------------------------
#[derive(Default)]
struct CacheState {
    orders: HashMap<String, String>,
    user_orders: HashMap<String, String>,
}

/// An in-memory cache that stores serialized orders, so the read-through path exercises the
/// same encode/decode round trip a real cache backend would.
#[derive(Clone, Default)]
pub struct MemoryCache {
    state: Arc<Mutex<CacheState>>,
    failing: Arc<AtomicBool>,
    hits: Arc<AtomicU64>,
}

impl MemoryCache {
    pub fn fail_operations(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.state.lock().unwrap().orders.contains_key(id.as_str())
    }

    pub fn entry_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.orders.len() + state.user_orders.len()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError("injected cache failure".to_string()));
        }
        Ok(())
    }
}

impl OrderCache for MemoryCache {
    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, CacheError> {
        self.check_available()?;
        let state = self.state.lock().unwrap();
        match state.orders.get(id.as_str()) {
            Some(json) => {
                let order = serde_json::from_str(json).map_err(|e| CacheError(e.to_string()))?;
                self.hits.fetch_add(1, Ordering::SeqCst);
                Ok(Some(order))
            },
            None => Ok(None),
        }
    }

    async fn store_order(&self, order: &Order) -> Result<(), CacheError> {
        self.check_available()?;
        let json = serde_json::to_string(order).map_err(|e| CacheError(e.to_string()))?;
        self.state.lock().unwrap().orders.insert(order.id.as_str().to_string(), json);
        Ok(())
    }

    async fn evict_order(&self, id: &OrderId) -> Result<(), CacheError> {
        self.check_available()?;
        self.state.lock().unwrap().orders.remove(id.as_str());
        Ok(())
    }

    async fn fetch_user_orders(&self, user_id: &str) -> Result<Option<Vec<Order>>, CacheError> {
        self.check_available()?;
        let state = self.state.lock().unwrap();
        match state.user_orders.get(user_id) {
            Some(json) => Ok(Some(serde_json::from_str(json).map_err(|e| CacheError(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn store_user_orders(&self, user_id: &str, orders: &[Order]) -> Result<(), CacheError> {
        self.check_available()?;
        let json = serde_json::to_string(orders).map_err(|e| CacheError(e.to_string()))?;
        self.state.lock().unwrap().user_orders.insert(user_id.to_string(), json);
        Ok(())
    }

    async fn evict_user_orders(&self, user_id: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.state.lock().unwrap().user_orders.remove(user_id);
        Ok(())
    }
}

//--------------------------------------    TestGateway      ---------------------------------------------------------
#[derive(Default)]
struct GatewayState {
    charge_result: Option<Result<PaymentResult, PaymentGatewayError>>,
    refund_result: Option<Result<RefundResult, PaymentGatewayError>>,
    payments: HashMap<String, Payment>,
    charges: Vec<ChargeRequest>,
    cancelled: Vec<String>,
    refunds: Vec<RefundRequest>,
    webhook_valid: bool,
    counter: u64,
}

/// A scriptable payment provider that records every call.
#[derive(Clone)]
pub struct TestGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl Default for TestGateway {
    fn default() -> Self {
        let state = GatewayState { webhook_valid: true, ..GatewayState::default() };
        Self { state: Arc::new(Mutex::new(state)) }
    }
}

impl TestGateway {
    pub fn script_charge(&self, result: Result<PaymentResult, PaymentGatewayError>) {
        self.state.lock().unwrap().charge_result = Some(result);
    }

    pub fn script_refund(&self, result: Result<RefundResult, PaymentGatewayError>) {
        self.state.lock().unwrap().refund_result = Some(result);
    }

    pub fn script_webhook_valid(&self, valid: bool) {
        self.state.lock().unwrap().webhook_valid = valid;
    }

    pub fn add_payment(&self, payment: Payment) {
        self.state.lock().unwrap().payments.insert(payment.payment_id.clone(), payment);
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.state.lock().unwrap().charges.clone()
    }

    pub fn cancelled_payments(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn refunds(&self) -> Vec<RefundRequest> {
        self.state.lock().unwrap().refunds.clone()
    }
}

impl PaymentGateway for TestGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentResult, PaymentGatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.charges.push(request.clone());
        if let Some(result) = state.charge_result.clone() {
            return result;
        }
        state.counter += 1;
        Ok(PaymentResult { payment_id: format!("pay-{}", state.counter), status: PaymentStatus::Completed })
    }

    async fn payment_status(&self, payment_id: &str) -> Result<Payment, PaymentGatewayError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        state
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| PaymentGatewayError::PaymentNotFound(payment_id.to_string()))
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<(), PaymentGatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.cancelled.push(payment_id.to_string());
        if let Some(payment) = state.payments.get_mut(payment_id) {
            payment.status = PaymentStatus::Cancelled;
        }
        Ok(())
    }

    async fn refund(&self, request: &RefundRequest) -> Result<RefundResult, PaymentGatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.refunds.push(request.clone());
        if let Some(result) = state.refund_result.clone() {
            return result;
        }
        state.counter += 1;
        Ok(RefundResult { refund_id: format!("re-{}", state.counter), status: PaymentStatus::Refunded })
    }

    async fn validate_webhook(&self, _payload: &[u8], _signature: &str) -> Result<bool, PaymentGatewayError> {
        tokio::task::yield_now().await;
        Ok(self.state.lock().unwrap().webhook_valid)
    }
}

//-------------------------------------- StaticUserValidator ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct StaticUserValidator {
    active: Arc<Mutex<HashSet<String>>>,
}

impl StaticUserValidator {
    pub fn with_users<I: IntoIterator<Item = &'static str>>(users: I) -> Self {
        let validator = Self::default();
        let mut active = validator.active.lock().unwrap();
        active.extend(users.into_iter().map(String::from));
        drop(active);
        validator
    }
}

impl UserValidator for StaticUserValidator {
    async fn is_active(&self, user_id: &str) -> Result<bool, UserValidationError> {
        tokio::task::yield_now().await;
        Ok(self.active.lock().unwrap().contains(user_id))
    }
}

//--------------------------------------  RecordingNotifier  ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<NotificationRequest>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSender for RecordingNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

//--------------------------------------   RecordedEvents    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    Created(OrderCreatedEvent),
    StatusChanged(OrderStatusChangedEvent),
    Cancelled(OrderCancelledEvent),
}

#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventLog {
    pub fn all(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

//--------------------------------------     TestHarness     ---------------------------------------------------------
pub type TestApi = OrderFlowApi<MemoryDatabase, MemoryCache, TestGateway, StaticUserValidator>;

pub struct TestHarness {
    pub api: Arc<TestApi>,
    pub db: MemoryDatabase,
    pub cache: MemoryCache,
    pub gateway: TestGateway,
    pub notifier: RecordingNotifier,
    pub events: EventLog,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        dotenvy::from_filename(".env.test").ok();
        let _ = env_logger::try_init();
        let db = MemoryDatabase::default();
        let cache = MemoryCache::default();
        let gateway = TestGateway::default();
        let users = StaticUserValidator::with_users(["user-1", "user-2"]);
        let events = EventLog::default();

        let mut hooks = EventHooks::default();
        let log = events.clone();
        hooks.on_order_created(move |event| {
            let log = log.clone();
            async move { log.push(RecordedEvent::Created(event)) }.boxed()
        });
        let log = events.clone();
        hooks.on_status_changed(move |event| {
            let log = log.clone();
            async move { log.push(RecordedEvent::StatusChanged(event)) }.boxed()
        });
        let log = events.clone();
        hooks.on_order_cancelled(move |event| {
            let log = log.clone();
            async move { log.push(RecordedEvent::Cancelled(event)) }.boxed()
        });
        let handlers = EventHandlers::new(config.event_buffer_size, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let notifier = RecordingNotifier::default();
        let sender = notifier.clone();
        let (notify_producer, _worker) = start_notification_worker(
            Arc::new(move |request: NotificationRequest| {
                let sender = sender.clone();
                async move {
                    if let Err(e) = sender.send(&request).await {
                        error!("🔔️ Failed to deliver notification: {e}");
                    }
                }
                .boxed()
            }),
            config.event_buffer_size,
        );

        let api = OrderFlowApi::new(db.clone(), cache.clone(), gateway.clone(), users, producers, config)
            .with_notifier(notify_producer);
        Self { api: Arc::new(api), db, cache, gateway, notifier, events }
    }
}

pub fn usd(amount: i64) -> Money {
    Money::new(amount, Currency::USD)
}

pub fn sample_address() -> Address {
    Address {
        line1: "1 Main St".into(),
        line2: None,
        city: "Springfield".into(),
        state: Some("IL".into()),
        postal_code: "62704".into(),
        country: "US".into(),
    }
}

/// Two items at the default tax rate and shipping fee: subtotal 2500, tax 220, total 3220.
pub fn sample_order(user_id: &str) -> NewOrder {
    NewOrder {
        user_id: user_id.into(),
        items: vec![
            NewLineItem { product_id: "prod-1".into(), quantity: 2, unit_price: usd(1000) },
            NewLineItem { product_id: "prod-2".into(), quantity: 1, unit_price: usd(500) },
        ],
        shipping_address: sample_address(),
        billing_address: sample_address(),
        notes: None,
    }
}

/// Poll `cond` until it holds or the timeout elapses.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout_ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

use std::{collections::HashMap, fmt::Debug};

use chrono::Utc;
use log::*;

use crate::{
    config::EngineConfig,
    db_types::{NewOrder, Order, OrderId, OrderStatus, PaymentStatus, StatusChange},
    events::{
        EventProducer,
        EventProducers,
        OrderCancelledEvent,
        OrderCreatedEvent,
        OrderStatusChangedEvent,
        PaymentEvent,
        PaymentEventType,
    },
    helpers::{sanitize_notes, validate_new_order, validate_payment_request, validate_reason},
    ole_api::{
        errors::OrderFlowError,
        order_objects::{OrderQueryFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    },
    pricing::price_order,
    traits::{
        ChargeRequest,
        NotificationRequest,
        NotificationType,
        OrderCache,
        OrderDatabase,
        PaymentGateway,
        PaymentRequest,
        PaymentResult,
        RefundRequest,
        RefundResult,
        RequestMeta,
        UserValidator,
    },
};

/// `OrderFlowApi` is the primary API for the order lifecycle: creation, status transitions,
/// cancellation, payment processing, refunds and inbound payment events.
///
/// It owns the business rules and sequences the side effects around each state change. The
/// durable write always completes (success or failure) before cache invalidation or event
/// publication is attempted, and cache/event/notification failures never fail the primary
/// operation. The API is stateless across calls and safe for concurrent use; it holds no
/// locks across I/O. A caller that drops a call mid-flight gets no automatic retry: if the
/// durable write was in progress, its outcome is genuinely unknown.
pub struct OrderFlowApi<B, C, G, V> {
    db: B,
    cache: C,
    gateway: G,
    users: V,
    producers: EventProducers,
    notifier: Option<EventProducer<NotificationRequest>>,
    config: EngineConfig,
}

impl<B, C, G, V> Debug for OrderFlowApi<B, C, G, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, C, G, V> OrderFlowApi<B, C, G, V> {
    pub fn new(db: B, cache: C, gateway: G, users: V, producers: EventProducers, config: EngineConfig) -> Self {
        Self { db, cache, gateway, users, producers, notifier: None, config }
    }

    /// Attach the fire-and-forget notification queue. Without it, notifications are skipped.
    pub fn with_notifier(mut self, notifier: EventProducer<NotificationRequest>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<B, C, G, V> OrderFlowApi<B, C, G, V>
where
    B: OrderDatabase,
    C: OrderCache,
    G: PaymentGateway,
    V: UserValidator,
{
    /// Create a new order.
    ///
    /// The order is validated, priced and durably stored in `pending` status; the store
    /// write is the authoritative step and its failure aborts the whole operation. Cache
    /// population, the `order created` event and the confirmation notification are
    /// best-effort and happen only after the write has committed. Once this returns `Ok`,
    /// the order is durably stored regardless of any side-effect outcome.
    pub async fn process_new_order(&self, meta: &RequestMeta, request: NewOrder) -> Result<Order, OrderFlowError> {
        debug!("🔄️📦️ Creating order for user {} with {} items", request.user_id, request.items.len());
        validate_new_order(&request)?;
        if !self.users.is_active(&request.user_id).await? {
            return Err(OrderFlowError::validation("user_id", "user not found or inactive"));
        }
        let (items, totals) = price_order(&request.items, self.config.tax_rate, self.config.shipping_fee)?;
        let notes = request.notes.as_deref().map(sanitize_notes).filter(|n| !n.is_empty());
        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            user_id: request.user_id,
            status: OrderStatus::Pending,
            items,
            shipping_address: request.shipping_address,
            billing_address: request.billing_address,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping_cost: totals.shipping,
            total: totals.total,
            payment_id: None,
            notes,
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
        };
        let order = self.db.insert_order(order).await?;

        if self.config.enable_caching {
            if let Err(e) = self.cache.store_order(&order).await {
                error!("🗄️ Failed to cache order {}: {e}", order.id);
            }
            if let Err(e) = self.cache.evict_user_orders(&order.user_id).await {
                error!("🗄️ Failed to evict order list for user {}: {e}", order.user_id);
            }
        }
        if self.config.enable_events {
            self.producers.publish_order_created(OrderCreatedEvent::new(order.clone(), meta)).await;
        }
        self.queue_notification(confirmation_notification(&order));
        info!("🔄️📦️ Order {} created for user {} ({})", order.id, order.user_id, order.total);
        Ok(order)
    }

    /// Fetch a single order, cache first. A cache miss falls back to the store and
    /// repopulates the cache on the way out.
    pub async fn fetch_order(&self, id: &OrderId) -> Result<Order, OrderFlowError> {
        if self.config.enable_caching {
            match self.cache.fetch_order(id).await {
                Ok(Some(order)) => {
                    trace!("🗄️ Order {id} served from cache");
                    return Ok(order);
                },
                Ok(None) => {},
                Err(e) => warn!("🗄️ Cache read for order {id} failed: {e}"),
            }
        }
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        if self.config.enable_caching {
            if let Err(e) = self.cache.store_order(&order).await {
                warn!("🗄️ Failed to cache order {id}: {e}");
            }
        }
        Ok(order)
    }

    /// Fetch orders matching the filter, most recent first.
    pub async fn fetch_orders(&self, filter: &OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        filter.validate()?;
        trace!("🔄️📦️ Listing orders. {filter}");
        Ok(self.db.fetch_orders(filter).await?)
    }

    /// Fetch a page of a user's orders along with the user's total order count. The first
    /// page is served from (and stored back into) the user-list cache.
    pub async fn fetch_user_orders(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, u64), OrderFlowError> {
        if user_id.trim().is_empty() {
            return Err(OrderFlowError::validation("user_id", "user id is required"));
        }
        if limit < 0 {
            return Err(OrderFlowError::validation("limit", "limit cannot be negative"));
        }
        if offset < 0 {
            return Err(OrderFlowError::validation("offset", "offset cannot be negative"));
        }
        let limit = match limit {
            0 => DEFAULT_PAGE_SIZE,
            l => l.min(MAX_PAGE_SIZE),
        };
        if self.config.enable_caching && offset == 0 {
            match self.cache.fetch_user_orders(user_id).await {
                Ok(Some(orders)) => {
                    trace!("🗄️ Order list for user {user_id} served from cache");
                    let count = orders.len() as u64;
                    return Ok((orders, count));
                },
                Ok(None) => {},
                Err(e) => warn!("🗄️ Cache read for user {user_id} order list failed: {e}"),
            }
        }
        let (orders, total) = self.db.fetch_orders_for_user(user_id, limit, offset).await?;
        if self.config.enable_caching && offset == 0 {
            if let Err(e) = self.cache.store_user_orders(user_id, &orders).await {
                warn!("🗄️ Failed to cache order list for user {user_id}: {e}");
            }
        }
        Ok((orders, total))
    }

    /// Change an order's status.
    ///
    /// The transition table is consulted before any write; an illegal transition is rejected
    /// with the previous status untouched. The store applies the change conditionally on the
    /// status this call observed, so a lost race against a concurrent update surfaces as
    /// [`OrderFlowError::Conflict`] rather than a silent overwrite.
    pub async fn update_order_status(
        &self,
        meta: &RequestMeta,
        id: &OrderId,
        new_status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let current = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        let previous_status = current.status;
        if !previous_status.can_transition_to(new_status) {
            return Err(OrderFlowError::validation(
                "status",
                format!("invalid status transition from {previous_status} to {new_status}"),
            ));
        }
        let mut change = StatusChange::new(new_status);
        if let Some(notes) = notes.map(sanitize_notes).filter(|n| !n.is_empty()) {
            change = change.with_notes(notes);
        }
        let order = self.db.update_status(id, previous_status, change).await?;
        info!("🔄️📦️ Order {id} moved {previous_status} -> {new_status}");

        self.evict_order_caches(&order).await;
        if self.config.enable_events {
            self.producers
                .publish_status_changed(OrderStatusChangedEvent::new(order.clone(), previous_status, meta))
                .await;
        }
        if let Some(request) = status_notification(&order) {
            self.queue_notification(request);
        }
        Ok(order)
    }

    /// Cancel an order.
    ///
    /// Only `pending` and `confirmed` orders are eligible. If a payment is attached and
    /// still pending at the gateway, a cancellation is attempted there first; a gateway
    /// failure is logged and never blocks the order cancellation. An orphaned pending
    /// payment is a reconciliation concern, not a blocker.
    pub async fn cancel_order(&self, meta: &RequestMeta, id: &OrderId, reason: &str) -> Result<Order, OrderFlowError> {
        validate_reason(reason, "reason")?;
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        if !order.can_cancel() {
            return Err(OrderFlowError::validation("status", "order cannot be cancelled in current state"));
        }
        if let Some(payment_id) = order.payment_id.as_deref().filter(|p| !p.is_empty()) {
            match self.gateway.payment_status(payment_id).await {
                Ok(payment) if payment.status == PaymentStatus::Pending => {
                    if let Err(e) = self.gateway.cancel_payment(payment_id).await {
                        error!("🔄️❌️ Failed to cancel payment {payment_id} for order {id}: {e}");
                    }
                },
                Ok(_) => {},
                Err(e) => error!("🔄️❌️ Failed to look up payment {payment_id} for order {id}: {e}"),
            }
        }
        let order = self.update_order_status(meta, id, OrderStatus::Cancelled, Some(reason)).await?;
        if self.config.enable_events {
            self.producers
                .publish_order_cancelled(OrderCancelledEvent::new(order.clone(), reason.to_string(), meta))
                .await;
        }
        self.queue_notification(cancellation_notification(&order));
        Ok(order)
    }

    /// Charge an order.
    ///
    /// A payment may be attempted only against a freshly created (`pending`) order, and the
    /// charge amount is always the order's stored total, never the caller's figure. The
    /// charge is never retried here: reporting a failed charge to the caller is safer than
    /// risking a duplicate charge.
    pub async fn process_payment(
        &self,
        meta: &RequestMeta,
        id: &OrderId,
        request: PaymentRequest,
    ) -> Result<PaymentResult, OrderFlowError> {
        validate_payment_request(&request)?;
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        if order.status != OrderStatus::Pending {
            return Err(OrderFlowError::validation("status", "order is not in pending state"));
        }
        if let Some(amount) = request.amount {
            if amount != order.total {
                debug!("🔄️💰️ Ignoring caller-supplied amount {amount} for order {id}; charging {}", order.total);
            }
        }
        let charge = ChargeRequest {
            order_id: id.clone(),
            amount: order.total,
            method: request.method,
            card_token: request.card_token,
            return_url: request.return_url,
        };
        let result = self.gateway.charge(&charge).await?;
        info!("🔄️💰️ Payment {} for order {id} is {}", result.payment_id, result.status);

        if let Err(e) = self.db.set_payment_id(id, &result.payment_id).await {
            // The charge already happened; failing the response would wrongly suggest
            // otherwise. Reconciliation has to close this gap.
            error!("🔄️💰️ Failed to record payment {} on order {id}: {e}", result.payment_id);
        }
        if result.status == PaymentStatus::Completed {
            if let Err(e) = self.update_order_status(meta, id, OrderStatus::Confirmed, Some("Payment completed")).await
            {
                error!("🔄️💰️ Payment {} completed but order {id} could not be confirmed: {e}", result.payment_id);
            }
        }
        if self.config.enable_caching {
            if let Err(e) = self.cache.evict_order(id).await {
                warn!("🗄️ Failed to evict order {id} from cache: {e}");
            }
        }
        Ok(result)
    }

    /// Refund a delivered, paid order in full.
    pub async fn refund_order(
        &self,
        meta: &RequestMeta,
        id: &OrderId,
        reason: &str,
    ) -> Result<RefundResult, OrderFlowError> {
        validate_reason(reason, "reason")?;
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        if !order.can_refund() {
            return Err(OrderFlowError::validation("status", "order cannot be refunded"));
        }
        let payment_id = order
            .payment_id
            .clone()
            .ok_or_else(|| OrderFlowError::validation("payment_id", "order has no associated payment"))?;
        let refund = RefundRequest { payment_id, amount: order.total, reason: reason.to_string() };
        let result = self.gateway.refund(&refund).await?;
        info!("🔄️💸️ Refund {} for order {id} is {}", result.refund_id, result.status);
        if result.status == PaymentStatus::Refunded {
            let notes = format!("Refund processed: {reason}");
            if let Err(e) = self.update_order_status(meta, id, OrderStatus::Refunded, Some(&notes)).await {
                error!("🔄️💸️ Refund {} issued but order {id} could not be marked refunded: {e}", result.refund_id);
            }
        }
        Ok(result)
    }

    /// Consume an inbound payment event.
    ///
    /// Each branch goes through the same transition-table-guarded update paths as the
    /// synchronous API; there is no looser state machine here. Event types this service does
    /// not recognise are ignored.
    pub async fn handle_payment_event(&self, meta: &RequestMeta, event: PaymentEvent) -> Result<(), OrderFlowError> {
        let order_id = OrderId::from(event.order_id.clone());
        match event.event_type {
            PaymentEventType::Completed => {
                info!("🔄️💰️ Payment {} completed for order {order_id}", event.payment_id);
                self.update_order_status(meta, &order_id, OrderStatus::Confirmed, Some("Payment completed via event"))
                    .await?;
            },
            PaymentEventType::Failed => {
                info!("🔄️💰️ Payment {} failed for order {order_id}", event.payment_id);
                self.cancel_order(meta, &order_id, "payment failed").await?;
            },
            PaymentEventType::Refunded => {
                info!("🔄️💸️ Payment {} refunded for order {order_id}", event.payment_id);
                self.update_order_status(meta, &order_id, OrderStatus::Refunded, Some("Payment refunded via event"))
                    .await?;
            },
            PaymentEventType::Unknown(kind) => {
                debug!("🔄️📬️ Ignoring unrecognised payment event type {kind} for order {order_id}");
            },
        }
        Ok(())
    }

    /// Validate and consume a payment webhook delivery.
    pub async fn handle_payment_webhook(
        &self,
        meta: &RequestMeta,
        payload: &[u8],
        signature: &str,
    ) -> Result<(), OrderFlowError> {
        if !self.gateway.validate_webhook(payload, signature).await? {
            return Err(OrderFlowError::validation("signature", "invalid webhook signature"));
        }
        let event: PaymentEvent =
            serde_json::from_slice(payload).map_err(|e| OrderFlowError::MalformedEvent(e.to_string()))?;
        self.handle_payment_event(meta, event).await
    }

    /// Administrative removal of an order. This is not a lifecycle transition: it bypasses
    /// the state machine and simply hides the order from every fetch.
    pub async fn soft_delete_order(&self, id: &OrderId) -> Result<(), OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_id(id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        self.db.soft_delete(id).await?;
        warn!("🗑️ Order {id} soft-deleted");
        self.evict_order_caches(&order).await;
        Ok(())
    }

    async fn evict_order_caches(&self, order: &Order) {
        if !self.config.enable_caching {
            return;
        }
        if let Err(e) = self.cache.evict_order(&order.id).await {
            warn!("🗄️ Failed to evict order {} from cache: {e}", order.id);
        }
        if let Err(e) = self.cache.evict_user_orders(&order.user_id).await {
            warn!("🗄️ Failed to evict order list for user {}: {e}", order.user_id);
        }
    }

    fn queue_notification(&self, request: NotificationRequest) {
        if let Some(notifier) = &self.notifier {
            notifier.try_publish_event(request);
        }
    }
}

fn confirmation_notification(order: &Order) -> NotificationRequest {
    let metadata = HashMap::from([
        ("order_id".to_string(), order.id.as_str().to_string()),
        ("total".to_string(), order.total.to_string()),
    ]);
    NotificationRequest {
        recipient: order.user_id.clone(),
        notification_type: NotificationType::OrderConfirmation,
        subject: "Order Confirmation".to_string(),
        body: format!("Your order {} has been received.", order.id),
        metadata,
    }
}

/// Customer-visible status transitions get a notification; internal ones do not.
fn status_notification(order: &Order) -> Option<NotificationRequest> {
    let (notification_type, subject, body) = match order.status {
        OrderStatus::Shipped => (
            NotificationType::OrderShipped,
            "Order Shipped",
            format!("Your order {} has been shipped.", order.id),
        ),
        OrderStatus::Delivered => (
            NotificationType::OrderDelivered,
            "Order Delivered",
            format!("Your order {} has been delivered.", order.id),
        ),
        _ => return None,
    };
    Some(NotificationRequest {
        recipient: order.user_id.clone(),
        notification_type,
        subject: subject.to_string(),
        body,
        metadata: HashMap::new(),
    })
}

fn cancellation_notification(order: &Order) -> NotificationRequest {
    let mut metadata = HashMap::from([("order_id".to_string(), order.id.as_str().to_string())]);
    if let Some(reason) = &order.notes {
        metadata.insert("reason".to_string(), reason.clone());
    }
    NotificationRequest {
        recipient: order.user_id.clone(),
        notification_type: NotificationType::OrderCancelled,
        subject: "Order Cancelled".to_string(),
        body: format!("Your order {} has been cancelled.", order.id),
        metadata,
    }
}

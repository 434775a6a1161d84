use crate::config::LedgerConfig;
use crate::domain::event::LedgerEvent;
use crate::domain::order::{Order, OrderStatus, PaymentStatus};
use crate::domain::ports::{
    GatewayStatus, IntentMetadata, LedgerStoreBox, NotificationSinkBox, PaymentGatewayBox,
    ShipmentRequest, ShippingCarrierBox, TrackingReport, UnitOfWork,
};
use crate::domain::pricing::PricingPolicy;
use crate::domain::shipment::{Handover, Shipment};
use crate::domain::transaction::{
    PaymentMethod, Transaction, TransactionStatus, TransactionType, open_payment, refund_method,
};
use crate::domain::{AddressId, ItemId, OrderId, UserId};
use crate::error::{LedgerError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// A buyer's request to purchase an item.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    /// Client-chosen id. Replaying a create with the same id, buyer and item
    /// returns the order already stored.
    pub order_id: Option<OrderId>,
    pub buyer_id: UserId,
    pub item_id: ItemId,
    pub shipping_address_id: AddressId,
    pub shipping_cost: Option<Decimal>,
}

/// Seller-supplied shipping details. Without a tracking number the carrier books
/// the parcel and issues one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipOrder {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub label_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Buyer,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub role: RoleFilter,
    pub status: Option<OrderStatus>,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            role: RoleFilter::All,
            status: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
}

/// Every order and ledger row, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub orders: Vec<Order>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy)]
enum Party {
    Buyer,
    Seller,
    Either,
}

/// Orders that `user` may act on in the given role are visible; all others are
/// reported as missing.
fn visible_to(order: Order, user: UserId, party: Party) -> Result<Order> {
    let visible = match party {
        Party::Buyer => order.buyer_id == user,
        Party::Seller => order.seller_id == user,
        Party::Either => order.is_party(user),
    };
    if visible {
        Ok(order)
    } else {
        Err(LedgerError::NotFound("order"))
    }
}

async fn load_order(
    uow: &mut dyn UnitOfWork,
    order_id: OrderId,
    user: UserId,
    party: Party,
) -> Result<Order> {
    let order = uow
        .order(order_id)
        .await?
        .ok_or(LedgerError::NotFound("order"))?;
    visible_to(order, user, party)
}

fn ensure_no_open_payment(history: &[Transaction]) -> Result<()> {
    if open_payment(history).is_some() {
        return Err(LedgerError::Conflict(
            "A payment is already awaiting confirmation".to_string(),
        ));
    }
    Ok(())
}

/// The order lifecycle and its ledger.
///
/// Every transition follows the same shape: adapter calls (gateway, carrier) run
/// first against a snapshot of the order, then a unit of work re-reads the rows,
/// re-checks the precondition, stages all writes and commits them together.
/// Notifications go out only after a successful commit and never fail the call.
pub struct OrderLedger {
    store: LedgerStoreBox,
    gateway: PaymentGatewayBox,
    carrier: ShippingCarrierBox,
    notifier: NotificationSinkBox,
    pricing: PricingPolicy,
    default_carrier: String,
}

impl OrderLedger {
    pub fn new(
        store: LedgerStoreBox,
        gateway: PaymentGatewayBox,
        carrier: ShippingCarrierBox,
        notifier: NotificationSinkBox,
    ) -> Self {
        let config = LedgerConfig::default();
        Self {
            store,
            gateway,
            carrier,
            notifier,
            pricing: config.pricing,
            default_carrier: config.shipping.default_carrier,
        }
    }

    pub fn with_config(mut self, config: &LedgerConfig) -> Self {
        self.pricing = config.pricing;
        self.default_carrier = config.shipping.default_carrier.clone();
        self
    }

    async fn notify(&self, user_id: UserId, event: LedgerEvent, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(user_id, event, payload).await {
            warn!(user_id = %user_id, event = %event, error = %e, "notification failed");
        }
    }

    /// Snapshot read used to validate a request before any adapter call.
    async fn snapshot(&self, order_id: OrderId, user: UserId, party: Party) -> Result<Order> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(LedgerError::NotFound("order"))?;
        visible_to(order, user, party)
    }

    /// Places an order and reserves the item.
    #[instrument(skip_all, fields(buyer_id = %request.buyer_id, item_id = %request.item_id))]
    pub async fn create_order(&self, request: PlaceOrder) -> Result<Order> {
        let now = Utc::now();
        let mut uow = self.store.begin().await?;

        if let Some(order_id) = request.order_id
            && let Some(existing) = uow.order(order_id).await?
        {
            if existing.buyer_id == request.buyer_id && existing.item_id == request.item_id {
                debug!(order_id = %order_id, "order creation replayed");
                return Ok(existing);
            }
            return Err(LedgerError::Conflict("Order id already in use".to_string()));
        }

        let mut item = uow
            .item(request.item_id)
            .await?
            .ok_or(LedgerError::NotFound("item"))?;
        item.reserve(now)?;

        let address = uow
            .address(request.shipping_address_id)
            .await?
            .ok_or(LedgerError::NotFound("shipping address"))?;
        let pricing = self
            .pricing
            .quote(item.price.value(), request.shipping_cost)?;
        let order_id = request.order_id.unwrap_or_else(Uuid::new_v4);
        let order = Order::place(order_id, request.buyer_id, &item, &address, pricing, now)?;

        uow.save_item(item);
        uow.save_order(order.clone());
        uow.commit().await?;

        info!(order_id = %order.id, total = %order.total_price, "order placed");
        self.notify(
            order.seller_id,
            LedgerEvent::OrderPlaced,
            json!({ "order_id": order.id, "item_id": order.item_id, "total": order.total_price }),
        )
        .await;
        Ok(order)
    }

    /// Records the buyer's payment.
    ///
    /// Cash on delivery confirms the order immediately. Gateway-backed methods open
    /// a payment intent and leave the order pending until [`Self::settle_payment`].
    #[instrument(skip_all, fields(order_id = %order_id, method = ?method))]
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
        method: PaymentMethod,
    ) -> Result<Order> {
        let intent_id = if method.is_gateway_backed() {
            let snapshot = self.snapshot(order_id, buyer_id, Party::Buyer).await?;
            snapshot.ensure_payment_pending()?;
            snapshot.ensure_can(OrderStatus::Confirmed)?;
            ensure_no_open_payment(&self.store.transactions(order_id).await?)?;

            let metadata = IntentMetadata {
                order_id,
                buyer_id,
            };
            let intent = self
                .gateway
                .create_intent(snapshot.total_price, snapshot.currency, method, &metadata)
                .await?;
            Some(intent.intent_id)
        } else {
            None
        };

        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut order = load_order(uow.as_mut(), order_id, buyer_id, Party::Buyer).await?;
        ensure_no_open_payment(&uow.transactions(order_id).await?)?;

        let status = match intent_id {
            Some(_) => {
                order.ensure_payment_pending()?;
                order.ensure_can(OrderStatus::Confirmed)?;
                order.touch(now);
                TransactionStatus::Pending
            }
            None => {
                order.confirm_payment(now)?;
                TransactionStatus::Success
            }
        };
        uow.append_transaction(Transaction::new(
            order.id,
            TransactionType::Payment,
            order.total_price,
            order.currency,
            status,
            method,
            intent_id,
            now,
        ));
        uow.save_order(order.clone());
        uow.commit().await?;

        if order.payment_status == PaymentStatus::Paid {
            info!("payment confirmed");
            self.notify(
                order.seller_id,
                LedgerEvent::PaymentConfirmed,
                json!({ "order_id": order.id, "amount": order.total_price }),
            )
            .await;
        } else {
            info!("payment awaiting gateway confirmation");
        }
        Ok(order)
    }

    /// Settles the order's open gateway payment with the gateway's verdict.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn settle_payment(&self, order_id: OrderId) -> Result<Order> {
        let snapshot = self
            .store
            .order(order_id)
            .await?
            .ok_or(LedgerError::NotFound("order"))?;
        snapshot.ensure_payment_pending()?;
        snapshot.ensure_can(OrderStatus::Confirmed)?;
        let history = self.store.transactions(order_id).await?;
        let intent_id = open_payment(&history)
            .and_then(|tx| tx.gateway_ref.clone())
            .ok_or_else(|| {
                LedgerError::InvalidTransition("No payment is awaiting confirmation".to_string())
            })?;

        let verdict = self.gateway.confirm(&intent_id).await?;
        if !verdict.is_definitive() {
            return Err(LedgerError::Dependency(
                "Payment gateway has not settled the payment yet".to_string(),
            ));
        }

        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut order = uow
            .order(order_id)
            .await?
            .ok_or(LedgerError::NotFound("order"))?;
        let history = uow.transactions(order_id).await?;
        let method = match open_payment(&history) {
            Some(tx) if tx.gateway_ref.as_deref() == Some(intent_id.as_str()) => tx.method,
            _ => {
                return Err(LedgerError::Conflict(
                    "Payment was settled concurrently".to_string(),
                ));
            }
        };

        let (status, event, recipient) = if verdict == GatewayStatus::Succeeded {
            order.confirm_payment(now)?;
            (
                TransactionStatus::Success,
                LedgerEvent::PaymentConfirmed,
                order.seller_id,
            )
        } else {
            order.fail_payment(now)?;
            (
                TransactionStatus::Failed,
                LedgerEvent::PaymentFailed,
                order.buyer_id,
            )
        };
        uow.append_transaction(Transaction::new(
            order.id,
            TransactionType::Payment,
            order.total_price,
            order.currency,
            status,
            method,
            Some(intent_id),
            now,
        ));
        uow.save_order(order.clone());
        uow.commit().await?;

        info!(payment_status = %order.payment_status, "payment settled");
        self.notify(
            recipient,
            event,
            json!({ "order_id": order.id, "amount": order.total_price }),
        )
        .await;
        Ok(order)
    }

    /// Hands the parcel to the carrier and marks the item sold.
    #[instrument(skip_all, fields(order_id = %order_id, seller_id = %seller_id))]
    pub async fn ship_order(
        &self,
        order_id: OrderId,
        seller_id: UserId,
        request: ShipOrder,
    ) -> Result<Order> {
        let snapshot = self.snapshot(order_id, seller_id, Party::Seller).await?;
        snapshot.ensure_can(OrderStatus::Shipped)?;

        let carrier = request
            .carrier
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_carrier.clone());
        let handover = match request.tracking_number.filter(|t| !t.trim().is_empty()) {
            Some(tracking_number) => Handover {
                carrier,
                tracking_number,
                label_url: request.label_url,
                estimated_delivery: None,
            },
            None => {
                let booked = self
                    .carrier
                    .create_shipment(&ShipmentRequest {
                        order_id,
                        carrier: carrier.clone(),
                        cost: snapshot.shipping_cost,
                        currency: snapshot.currency,
                    })
                    .await?;
                Handover {
                    carrier,
                    tracking_number: booked.tracking_number,
                    label_url: booked.label_url.or(request.label_url),
                    estimated_delivery: booked.estimated_delivery,
                }
            }
        };

        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut order = load_order(uow.as_mut(), order_id, seller_id, Party::Seller).await?;
        order.ship(now)?;
        if uow.tracking_number_taken(&handover.tracking_number).await? {
            return Err(LedgerError::Conflict(
                "Tracking number already in use".to_string(),
            ));
        }
        let mut item = uow
            .item(order.item_id)
            .await?
            .ok_or(LedgerError::NotFound("item"))?;
        item.mark_sold(now)?;
        let shipment =
            Shipment::picked_up(order.id, handover, order.shipping_cost, order.currency, now)?;
        let tracking_number = shipment.tracking_number.clone();

        uow.save_shipment(shipment);
        uow.save_item(item);
        uow.save_order(order.clone());
        uow.commit().await?;

        info!(tracking_number = %tracking_number, "order shipped");
        self.notify(
            order.buyer_id,
            LedgerEvent::OrderShipped,
            json!({ "order_id": order.id, "tracking_number": tracking_number }),
        )
        .await;
        Ok(order)
    }

    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn confirm_delivery(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order> {
        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut order = load_order(uow.as_mut(), order_id, buyer_id, Party::Buyer).await?;
        order.deliver(now)?;

        let mut shipment = uow
            .shipments(order.id)
            .await?
            .into_iter()
            .rev()
            .find(|s| s.status.is_active())
            .ok_or(LedgerError::NotFound("shipment"))?;
        shipment.mark_delivered(now)?;

        uow.save_shipment(shipment);
        uow.save_order(order.clone());
        uow.commit().await?;

        info!("delivery confirmed");
        self.notify(
            order.seller_id,
            LedgerEvent::OrderDelivered,
            json!({ "order_id": order.id }),
        )
        .await;
        Ok(order)
    }

    /// Closes the order and books the seller's payout.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn complete_order(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order> {
        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut order = load_order(uow.as_mut(), order_id, buyer_id, Party::Buyer).await?;
        order.complete(now)?;

        let payout = order.payout_amount()?;
        uow.append_transaction(Transaction::new(
            order.id,
            TransactionType::Payout,
            payout,
            order.currency,
            TransactionStatus::Success,
            PaymentMethod::Wallet,
            None,
            now,
        ));
        uow.save_order(order.clone());
        uow.commit().await?;

        info!(payout = %payout, "order completed");
        self.notify(
            order.seller_id,
            LedgerEvent::OrderCompleted,
            json!({ "order_id": order.id, "payout": payout }),
        )
        .await;
        Ok(order)
    }

    /// Cancels a pending or confirmed order, releasing the item and refunding a
    /// settled payment.
    #[instrument(skip_all, fields(order_id = %order_id, actor_id = %actor_id))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        actor_id: UserId,
        reason: Option<String>,
    ) -> Result<Order> {
        let snapshot = self.snapshot(order_id, actor_id, Party::Either).await?;
        snapshot.ensure_can(OrderStatus::Cancelled)?;

        let mut gateway_refund = None;
        if snapshot.payment_status == PaymentStatus::Paid {
            let history = self.store.transactions(order_id).await?;
            if let (method, Some(intent_id)) = refund_method(&history)
                && method.is_gateway_backed()
            {
                let refund = self
                    .gateway
                    .refund(&intent_id, Some(snapshot.total_price))
                    .await?;
                gateway_refund = Some(refund.refund_id);
            }
        }

        let result = self
            .record_cancellation(order_id, actor_id, reason, gateway_refund.clone())
            .await;
        if let (Err(e), Some(refund_id)) = (&result, &gateway_refund) {
            error!(
                refund_id = %refund_id,
                error = %e,
                "refund issued but cancellation was not recorded"
            );
        }
        let order = result?;

        info!(payment_status = %order.payment_status, "order cancelled");
        let counterparty = if actor_id == order.buyer_id {
            order.seller_id
        } else {
            order.buyer_id
        };
        self.notify(
            counterparty,
            LedgerEvent::OrderCancelled,
            json!({ "order_id": order.id, "reason": order.cancellation_reason }),
        )
        .await;
        Ok(order)
    }

    async fn record_cancellation(
        &self,
        order_id: OrderId,
        actor_id: UserId,
        reason: Option<String>,
        gateway_refund: Option<String>,
    ) -> Result<Order> {
        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut order = load_order(uow.as_mut(), order_id, actor_id, Party::Either).await?;
        let history = uow.transactions(order.id).await?;
        let refund_due = order.cancel(reason, now)?;

        let mut item = uow
            .item(order.item_id)
            .await?
            .ok_or(LedgerError::NotFound("item"))?;
        item.release(now)?;

        if refund_due {
            let (method, intent_id) = refund_method(&history);
            let needs_gateway = method.is_gateway_backed() && intent_id.is_some();
            if needs_gateway && gateway_refund.is_none() {
                return Err(LedgerError::Conflict(
                    "Order was paid while the cancellation was in flight".to_string(),
                ));
            }
            uow.append_transaction(Transaction::new(
                order.id,
                TransactionType::Refund,
                order.total_price,
                order.currency,
                TransactionStatus::Success,
                method,
                gateway_refund,
                now,
            ));
        } else if let Some(open) = open_payment(&history) {
            // Closes the intent so a late settlement has nothing to capture.
            uow.append_transaction(Transaction::new(
                order.id,
                TransactionType::Payment,
                open.amount,
                open.currency,
                TransactionStatus::Cancelled,
                open.method,
                open.gateway_ref.clone(),
                now,
            ));
        }

        uow.save_item(item);
        uow.save_order(order.clone());
        uow.commit().await?;
        Ok(order)
    }

    /// An order as seen by one of its parties.
    pub async fn order(&self, order_id: OrderId, user: UserId) -> Result<Order> {
        self.snapshot(order_id, user, Party::Either).await
    }

    /// A user's orders, newest first.
    pub async fn orders_for(&self, user: UserId, filter: &OrderFilter) -> Result<Page<Order>> {
        if filter.page == 0 {
            return Err(LedgerError::ValidationError(
                "Page numbers start at 1".to_string(),
            ));
        }
        let per_page = filter.per_page.clamp(1, MAX_PER_PAGE);

        let mut orders: Vec<Order> = self
            .store
            .orders()
            .await?
            .into_iter()
            .filter(|o| match filter.role {
                RoleFilter::All => o.is_party(user),
                RoleFilter::Buyer => o.buyer_id == user,
                RoleFilter::Seller => o.seller_id == user,
            })
            .filter(|o| filter.status.is_none_or(|s| o.order_status == s))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = orders.len();
        let items = orders
            .into_iter()
            .skip((filter.page as usize - 1) * per_page as usize)
            .take(per_page as usize)
            .collect();
        Ok(Page {
            items,
            page: filter.page,
            per_page,
            total,
        })
    }

    /// Ledger rows across every order the user is party to, newest first.
    pub async fn transactions_for(
        &self,
        user: UserId,
        r#type: Option<TransactionType>,
    ) -> Result<Vec<Transaction>> {
        let mut rows = Vec::new();
        for order in self.store.orders().await? {
            if !order.is_party(user) {
                continue;
            }
            rows.extend(
                self.store
                    .transactions(order.id)
                    .await?
                    .into_iter()
                    .filter(|tx| r#type.is_none_or(|t| tx.r#type == t)),
            );
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub async fn shipments(&self, order_id: OrderId, user: UserId) -> Result<Vec<Shipment>> {
        self.snapshot(order_id, user, Party::Either).await?;
        self.store.shipments(order_id).await
    }

    /// Live carrier status of the order's latest shipment.
    pub async fn track_shipment(&self, order_id: OrderId, user: UserId) -> Result<TrackingReport> {
        let shipment = self
            .shipments(order_id, user)
            .await?
            .pop()
            .ok_or(LedgerError::NotFound("shipment"))?;
        self.carrier.track(&shipment.tracking_number).await
    }

    /// Consumes the ledger and returns every order and ledger row.
    pub async fn into_results(self) -> Result<LedgerSnapshot> {
        let mut orders = self.store.orders().await?;
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut transactions = Vec::new();
        for order in &orders {
            transactions.extend(self.store.transactions(order.id).await?);
        }
        Ok(LedgerSnapshot {
            orders,
            transactions,
        })
    }
}

use super::address::Address;
use super::event::LedgerEvent;
use super::item::{Item, ItemStatus};
use super::money::{Amount, Currency};
use super::order::Order;
use super::shipment::{Shipment, ShipmentStatus};
use super::transaction::{PaymentMethod, Transaction};
use super::{AddressId, ItemId, OrderId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listings, as seen by catalog management.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn add_item(&self, item: Item) -> Result<()>;
    /// Fails with `NotFound` for unknown ids.
    async fn get_item(&self, id: ItemId) -> Result<Item>;
    /// Generic status update. Rejected with `Conflict` once an order holds the item.
    async fn set_item_status(&self, id: ItemId, status: ItemStatus) -> Result<Item>;
    async fn items(&self) -> Result<Vec<Item>>;
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    async fn add_address(&self, address: Address) -> Result<()>;
    /// Fails with `NotFound` when the address is unknown or owned by someone else.
    async fn get_address(&self, id: AddressId, owner: UserId) -> Result<Address>;
}

/// One atomic section against the ledger's backing store.
///
/// Reads see the store as of `begin` plus this unit's own staged writes. Writes are
/// staged until [`UnitOfWork::commit`]; dropping the unit discards them. Orders read
/// through the unit are compare-and-swapped on commit by `version`.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>>;
    async fn address(&mut self, id: AddressId) -> Result<Option<Address>>;
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>>;
    async fn transactions(&mut self, order_id: OrderId) -> Result<Vec<Transaction>>;
    async fn shipments(&mut self, order_id: OrderId) -> Result<Vec<Shipment>>;
    async fn tracking_number_taken(&mut self, tracking_number: &str) -> Result<bool>;

    fn save_item(&mut self, item: Item);
    fn save_order(&mut self, order: Order);
    fn append_transaction(&mut self, tx: Transaction);
    fn save_shipment(&mut self, shipment: Shipment);

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Persistence for orders and their ledgers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work. Units are serialized: a second `begin` waits until the
    /// first one commits or is dropped.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn orders(&self) -> Result<Vec<Order>>;
    /// Transactions of one order, oldest first.
    async fn transactions(&self, order_id: OrderId) -> Result<Vec<Transaction>>;
    async fn shipments(&self, order_id: OrderId) -> Result<Vec<Shipment>>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type CatalogStoreBox = Box<dyn CatalogStore>;
pub type AddressBookBox = Box<dyn AddressBook>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    RequiresConfirmation,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
}

impl GatewayStatus {
    /// Whether the ledger may act on this status.
    pub fn is_definitive(&self) -> bool {
        matches!(
            self,
            GatewayStatus::Succeeded | GatewayStatus::Failed | GatewayStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    pub order_id: OrderId,
    pub buyer_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub status: GatewayStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRefund {
    pub refund_id: String,
    pub status: GatewayStatus,
}

/// Payment provider. Errors come back as `LedgerError::Dependency`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount: Amount,
        currency: Currency,
        method: PaymentMethod,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent>;
    async fn confirm(&self, intent_id: &str) -> Result<GatewayStatus>;
    /// Refunds `amount`, or the whole intent when `None`.
    async fn refund(&self, intent_id: &str, amount: Option<Amount>) -> Result<GatewayRefund>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRequest {
    pub order_id: OrderId,
    pub carrier: String,
    pub cost: Amount,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierShipment {
    pub tracking_number: String,
    pub label_url: Option<String>,
    pub status: ShipmentStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
    pub status: ShipmentStatus,
    pub description: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingReport {
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub events: Vec<TrackingEvent>,
}

#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<CarrierShipment>;
    async fn track(&self, tracking_number: &str) -> Result<TrackingReport>;
}

/// Fire-and-forget delivery of order events to users.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        user_id: UserId,
        event: LedgerEvent,
        payload: serde_json::Value,
    ) -> Result<()>;
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type ShippingCarrierBox = Box<dyn ShippingCarrier>;
pub type NotificationSinkBox = Box<dyn NotificationSink>;

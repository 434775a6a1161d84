use super::changeset::Changeset;
use crate::domain::address::Address;
use crate::domain::item::{Item, ItemStatus};
use crate::domain::order::Order;
use crate::domain::ports::{AddressBook, CatalogStore, LedgerStore, UnitOfWork};
use crate::domain::shipment::Shipment;
use crate::domain::transaction::Transaction;
use crate::domain::{AddressId, ItemId, OrderId, ShipmentId, UserId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct LedgerState {
    items: HashMap<ItemId, Item>,
    addresses: HashMap<AddressId, Address>,
    orders: HashMap<OrderId, Order>,
    transactions: HashMap<OrderId, Vec<Transaction>>,
    shipments: HashMap<OrderId, Vec<Shipment>>,
    tracking: HashMap<String, ShipmentId>,
}

impl LedgerState {
    fn apply(&mut self, changes: Changeset) {
        self.items.extend(changes.items);
        self.orders.extend(changes.orders);
        for tx in changes.transactions {
            self.transactions.entry(tx.order_id).or_default().push(tx);
        }
        for shipment in changes.shipments.into_values() {
            self.tracking
                .insert(shipment.tracking_number.clone(), shipment.id);
            let shipments = self.shipments.entry(shipment.order_id).or_default();
            match shipments.iter_mut().find(|s| s.id == shipment.id) {
                Some(existing) => *existing = shipment,
                None => shipments.push(shipment),
            }
        }
    }
}

/// A thread-safe in-memory store for the whole marketplace ledger.
///
/// Items, addresses, orders and their ledgers live behind one
/// `Arc<Mutex<_>>`. A unit of work holds the lock from `begin` until it is
/// committed or dropped, which serializes concurrent transitions the way row
/// locks would in a relational store. `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Unit of work over [`InMemoryStore`]. Holds the store lock for its lifetime.
pub struct InMemoryUnitOfWork {
    state: OwnedMutexGuard<LedgerState>,
    changes: Changeset,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>> {
        if let Some(item) = self.changes.staged_item(id) {
            return Ok(Some(item.clone()));
        }
        Ok(self.state.items.get(&id).cloned())
    }

    async fn address(&mut self, id: AddressId) -> Result<Option<Address>> {
        Ok(self.state.addresses.get(&id).cloned())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        if let Some(order) = self.changes.staged_order(id) {
            return Ok(Some(order.clone()));
        }
        let order = self.state.orders.get(&id).cloned();
        if let Some(order) = &order {
            self.changes.observe(order);
        }
        Ok(order)
    }

    async fn transactions(&mut self, order_id: OrderId) -> Result<Vec<Transaction>> {
        let stored = self
            .state
            .transactions
            .get(&order_id)
            .cloned()
            .unwrap_or_default();
        Ok(self.changes.merge_transactions(order_id, stored))
    }

    async fn shipments(&mut self, order_id: OrderId) -> Result<Vec<Shipment>> {
        let stored = self
            .state
            .shipments
            .get(&order_id)
            .cloned()
            .unwrap_or_default();
        Ok(self.changes.merge_shipments(order_id, stored))
    }

    async fn tracking_number_taken(&mut self, tracking_number: &str) -> Result<bool> {
        Ok(self.state.tracking.contains_key(tracking_number)
            || self.changes.stages_tracking_number(tracking_number))
    }

    fn save_item(&mut self, item: Item) {
        self.changes.save_item(item);
    }

    fn save_order(&mut self, order: Order) {
        self.changes.save_order(order);
    }

    fn append_transaction(&mut self, tx: Transaction) {
        self.changes.append_transaction(tx);
    }

    fn save_shipment(&mut self, shipment: Shipment) {
        self.changes.save_shipment(shipment);
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { mut state, changes } = *self;
        if changes.is_empty() {
            return Ok(());
        }
        changes.verify(
            |id| state.orders.get(&id).map(|o| o.version),
            |tracking| state.tracking.get(tracking).copied(),
        )?;
        debug!(
            items = changes.items.len(),
            orders = changes.orders.len(),
            transactions = changes.transactions.len(),
            shipments = changes.shipments.len(),
            "committing unit of work"
        );
        state.apply(changes);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let state = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            state,
            changes: Changeset::new(),
        }))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.values().cloned().collect())
    }

    async fn transactions(&self, order_id: OrderId) -> Result<Vec<Transaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn shipments(&self, order_id: OrderId) -> Result<Vec<Shipment>> {
        let state = self.state.lock().await;
        Ok(state.shipments.get(&order_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn add_item(&self, item: Item) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.items.contains_key(&item.id) {
            return Err(LedgerError::Conflict("Item already exists".to_string()));
        }
        state.items.insert(item.id, item);
        Ok(())
    }

    async fn get_item(&self, id: ItemId) -> Result<Item> {
        let state = self.state.lock().await;
        state
            .items
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound("item"))
    }

    async fn set_item_status(&self, id: ItemId, status: ItemStatus) -> Result<Item> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or(LedgerError::NotFound("item"))?;
        item.set_listing_status(status, Utc::now())?;
        Ok(item.clone())
    }

    async fn items(&self) -> Result<Vec<Item>> {
        let state = self.state.lock().await;
        Ok(state.items.values().cloned().collect())
    }
}

#[async_trait]
impl AddressBook for InMemoryStore {
    async fn add_address(&self, address: Address) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.addresses.contains_key(&address.id) {
            return Err(LedgerError::Conflict("Address already exists".to_string()));
        }
        state.addresses.insert(address.id, address);
        Ok(())
    }

    async fn get_address(&self, id: AddressId, owner: UserId) -> Result<Address> {
        let state = self.state.lock().await;
        state
            .addresses
            .get(&id)
            .filter(|a| a.belongs_to(owner))
            .cloned()
            .ok_or(LedgerError::NotFound("address"))
    }
}

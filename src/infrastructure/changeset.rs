use crate::domain::item::Item;
use crate::domain::order::Order;
use crate::domain::shipment::Shipment;
use crate::domain::transaction::Transaction;
use crate::domain::{ItemId, OrderId, ShipmentId};
use crate::error::{LedgerError, Result};
use std::collections::{HashMap, HashSet};

/// Writes staged by a unit of work, shared by every store backend.
///
/// Also remembers the version of each order as it was first read from the store,
/// which is what [`Changeset::verify`] compares against on commit.
#[derive(Debug, Default)]
pub struct Changeset {
    pub(crate) items: HashMap<ItemId, Item>,
    pub(crate) orders: HashMap<OrderId, Order>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) shipments: HashMap<ShipmentId, Shipment>,
    observed: HashMap<OrderId, u64>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
            && self.orders.is_empty()
            && self.transactions.is_empty()
            && self.shipments.is_empty()
    }

    pub fn staged_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn staged_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Records the stored version of an order read through the unit of work.
    pub fn observe(&mut self, order: &Order) {
        self.observed.entry(order.id).or_insert(order.version);
    }

    pub fn save_item(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn save_order(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn append_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn save_shipment(&mut self, shipment: Shipment) {
        self.shipments.insert(shipment.id, shipment);
    }

    /// Stored transactions of `order_id` followed by the staged ones.
    pub fn merge_transactions(
        &self,
        order_id: OrderId,
        mut stored: Vec<Transaction>,
    ) -> Vec<Transaction> {
        stored.extend(
            self.transactions
                .iter()
                .filter(|tx| tx.order_id == order_id)
                .cloned(),
        );
        stored
    }

    /// Stored shipments of `order_id` with staged versions laid over them.
    pub fn merge_shipments(&self, order_id: OrderId, stored: Vec<Shipment>) -> Vec<Shipment> {
        let mut merged: Vec<Shipment> = stored
            .into_iter()
            .map(|s| self.shipments.get(&s.id).cloned().unwrap_or(s))
            .collect();
        for staged in self.shipments.values() {
            if staged.order_id == order_id && !merged.iter().any(|s| s.id == staged.id) {
                merged.push(staged.clone());
            }
        }
        merged.sort_by_key(|s| s.created_at);
        merged
    }

    pub fn stages_tracking_number(&self, tracking_number: &str) -> bool {
        self.shipments
            .values()
            .any(|s| s.tracking_number == tracking_number)
    }

    /// Checks the staged writes against the store's current state.
    ///
    /// `stored_version` yields the version currently persisted for an order,
    /// `tracking_owner` the shipment currently holding a tracking number.
    pub fn verify<V, T>(&self, stored_version: V, tracking_owner: T) -> Result<()>
    where
        V: Fn(OrderId) -> Option<u64>,
        T: Fn(&str) -> Option<ShipmentId>,
    {
        for order in self.orders.values() {
            match (self.observed.get(&order.id), stored_version(order.id)) {
                (None, None) => {}
                (Some(seen), Some(current)) if *seen == current => {}
                (None, Some(_)) => {
                    return Err(LedgerError::Conflict("Order already exists".to_string()));
                }
                _ => {
                    return Err(LedgerError::Conflict(
                        "Order was modified concurrently".to_string(),
                    ));
                }
            }
        }

        let mut staged_numbers = HashSet::new();
        for shipment in self.shipments.values() {
            if !staged_numbers.insert(shipment.tracking_number.as_str()) {
                return Err(LedgerError::Conflict(
                    "Tracking number already in use".to_string(),
                ));
            }
            if let Some(owner) = tracking_owner(&shipment.tracking_number)
                && owner != shipment.id
            {
                return Err(LedgerError::Conflict(
                    "Tracking number already in use".to_string(),
                ));
            }
        }
        Ok(())
    }
}

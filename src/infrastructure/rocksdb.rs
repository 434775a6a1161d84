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
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Column Family for listings.
pub const CF_ITEMS: &str = "items";
/// Column Family for shipping addresses.
pub const CF_ADDRESSES: &str = "addresses";
/// Column Family for orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for ledger entries, keyed by `order_id ‖ sequence`.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for shipments, keyed by `order_id ‖ shipment_id`.
pub const CF_SHIPMENTS: &str = "shipments";
/// Unique index from tracking number to shipment id.
pub const CF_TRACKING: &str = "tracking";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_ITEMS,
    CF_ADDRESSES,
    CF_ORDERS,
    CF_TRANSACTIONS,
    CF_SHIPMENTS,
    CF_TRACKING,
];

fn storage_error(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| storage_error(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| storage_error(format!("Deserialization error: {}", e)))
}

fn child_key(order_id: OrderId, suffix: &[u8]) -> Vec<u8> {
    let mut key = order_id.as_bytes().to_vec();
    key.extend_from_slice(suffix);
    key
}

/// A persistent store implementation using RocksDB.
///
/// Each entity kind lives in its own Column Family. A unit of work stages its
/// writes in memory and commits them as a single `WriteBatch`, so an order, its
/// item and its ledger rows land together or not at all. Units of work are
/// serialized through a process-wide writer lock.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating any
    /// missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(storage_error)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }
}

fn get<T: DeserializeOwned>(db: &DB, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
    let cf = db
        .cf_handle(cf_name)
        .ok_or_else(|| storage_error(format!("{} column family not found", cf_name)))?;
    match db.get_cf(cf, key).map_err(storage_error)? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

fn scan<T: DeserializeOwned>(db: &DB, cf_name: &str, prefix: &[u8]) -> Result<Vec<T>> {
    let cf = db
        .cf_handle(cf_name)
        .ok_or_else(|| storage_error(format!("{} column family not found", cf_name)))?;
    let mut values = Vec::new();
    for entry in db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
        let (key, value) = entry.map_err(storage_error)?;
        if !key.starts_with(prefix) {
            break;
        }
        values.push(decode(&value)?);
    }
    Ok(values)
}

fn put<T: Serialize>(db: &DB, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
    let cf = db
        .cf_handle(cf_name)
        .ok_or_else(|| storage_error(format!("{} column family not found", cf_name)))?;
    db.put_cf(cf, key, encode(value)?).map_err(storage_error)
}

fn tracking_owner(db: &DB, tracking_number: &str) -> Result<Option<ShipmentId>> {
    let cf = db
        .cf_handle(CF_TRACKING)
        .ok_or_else(|| storage_error("tracking column family not found"))?;
    match db
        .get_cf(cf, tracking_number.as_bytes())
        .map_err(storage_error)?
    {
        Some(bytes) => Uuid::from_slice(&bytes).map(Some).map_err(storage_error),
        None => Ok(None),
    }
}

/// Unit of work over [`RocksDBStore`]. Holds the writer lock for its lifetime.
pub struct RocksDBUnitOfWork {
    db: Arc<DB>,
    _writer: OwnedMutexGuard<()>,
    changes: Changeset,
}

impl RocksDBUnitOfWork {
    fn write_batch(&self, changes: &Changeset) -> Result<WriteBatch> {
        let handle = |name: &str| {
            self.db
                .cf_handle(name)
                .ok_or_else(|| storage_error(format!("{} column family not found", name)))
        };
        let mut batch = WriteBatch::default();

        let items = handle(CF_ITEMS)?;
        for item in changes.items.values() {
            batch.put_cf(items, item.id.as_bytes(), encode(item)?);
        }

        let orders = handle(CF_ORDERS)?;
        for order in changes.orders.values() {
            batch.put_cf(orders, order.id.as_bytes(), encode(order)?);
        }

        let transactions = handle(CF_TRANSACTIONS)?;
        let mut next_seq: std::collections::HashMap<OrderId, u32> = Default::default();
        for tx in &changes.transactions {
            let seq = match next_seq.get_mut(&tx.order_id) {
                Some(seq) => seq,
                None => {
                    let stored =
                        scan::<Transaction>(&self.db, CF_TRANSACTIONS, tx.order_id.as_bytes())?;
                    next_seq.entry(tx.order_id).or_insert(stored.len() as u32)
                }
            };
            batch.put_cf(
                transactions,
                child_key(tx.order_id, &seq.to_be_bytes()),
                encode(tx)?,
            );
            *seq += 1;
        }

        let shipments = handle(CF_SHIPMENTS)?;
        let tracking = handle(CF_TRACKING)?;
        for shipment in changes.shipments.values() {
            batch.put_cf(
                shipments,
                child_key(shipment.order_id, shipment.id.as_bytes()),
                encode(shipment)?,
            );
            batch.put_cf(
                tracking,
                shipment.tracking_number.as_bytes(),
                shipment.id.as_bytes(),
            );
        }
        Ok(batch)
    }
}

#[async_trait]
impl UnitOfWork for RocksDBUnitOfWork {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>> {
        if let Some(item) = self.changes.staged_item(id) {
            return Ok(Some(item.clone()));
        }
        get(&self.db, CF_ITEMS, id.as_bytes())
    }

    async fn address(&mut self, id: AddressId) -> Result<Option<Address>> {
        get(&self.db, CF_ADDRESSES, id.as_bytes())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        if let Some(order) = self.changes.staged_order(id) {
            return Ok(Some(order.clone()));
        }
        let order: Option<Order> = get(&self.db, CF_ORDERS, id.as_bytes())?;
        if let Some(order) = &order {
            self.changes.observe(order);
        }
        Ok(order)
    }

    async fn transactions(&mut self, order_id: OrderId) -> Result<Vec<Transaction>> {
        let stored = scan(&self.db, CF_TRANSACTIONS, order_id.as_bytes())?;
        Ok(self.changes.merge_transactions(order_id, stored))
    }

    async fn shipments(&mut self, order_id: OrderId) -> Result<Vec<Shipment>> {
        let stored = scan(&self.db, CF_SHIPMENTS, order_id.as_bytes())?;
        Ok(self.changes.merge_shipments(order_id, stored))
    }

    async fn tracking_number_taken(&mut self, tracking_number: &str) -> Result<bool> {
        Ok(tracking_owner(&self.db, tracking_number)?.is_some()
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
        if self.changes.is_empty() {
            return Ok(());
        }

        // Surface read errors before verifying; the closures below cannot fail.
        let mut versions = std::collections::HashMap::new();
        for id in self.changes.orders.keys() {
            let stored: Option<Order> = get(&self.db, CF_ORDERS, id.as_bytes())?;
            versions.insert(*id, stored.map(|o| o.version));
        }
        let mut owners = std::collections::HashMap::new();
        for shipment in self.changes.shipments.values() {
            let owner = tracking_owner(&self.db, &shipment.tracking_number)?;
            owners.insert(shipment.tracking_number.clone(), owner);
        }
        self.changes.verify(
            |id| versions.get(&id).copied().flatten(),
            |tracking| owners.get(tracking).copied().flatten(),
        )?;

        let batch = self.write_batch(&self.changes)?;
        debug!(
            orders = self.changes.orders.len(),
            transactions = self.changes.transactions.len(),
            "writing unit of work batch"
        );
        self.db.write(batch).map_err(storage_error)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        Ok(Box::new(RocksDBUnitOfWork {
            db: Arc::clone(&self.db),
            _writer: writer,
            changes: Changeset::new(),
        }))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        get(&self.db, CF_ORDERS, id.as_bytes())
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        scan(&self.db, CF_ORDERS, &[])
    }

    async fn transactions(&self, order_id: OrderId) -> Result<Vec<Transaction>> {
        scan(&self.db, CF_TRANSACTIONS, order_id.as_bytes())
    }

    async fn shipments(&self, order_id: OrderId) -> Result<Vec<Shipment>> {
        let mut shipments: Vec<Shipment> = scan(&self.db, CF_SHIPMENTS, order_id.as_bytes())?;
        shipments.sort_by_key(|s| s.created_at);
        Ok(shipments)
    }
}

#[async_trait]
impl CatalogStore for RocksDBStore {
    async fn add_item(&self, item: Item) -> Result<()> {
        let _writer = self.writer.lock().await;
        if get::<Item>(&self.db, CF_ITEMS, item.id.as_bytes())?.is_some() {
            return Err(LedgerError::Conflict("Item already exists".to_string()));
        }
        put(&self.db, CF_ITEMS, item.id.as_bytes(), &item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Item> {
        get(&self.db, CF_ITEMS, id.as_bytes())?.ok_or(LedgerError::NotFound("item"))
    }

    async fn set_item_status(&self, id: ItemId, status: ItemStatus) -> Result<Item> {
        let _writer = self.writer.lock().await;
        let mut item: Item =
            get(&self.db, CF_ITEMS, id.as_bytes())?.ok_or(LedgerError::NotFound("item"))?;
        item.set_listing_status(status, Utc::now())?;
        put(&self.db, CF_ITEMS, id.as_bytes(), &item)?;
        Ok(item)
    }

    async fn items(&self) -> Result<Vec<Item>> {
        scan(&self.db, CF_ITEMS, &[])
    }
}

#[async_trait]
impl AddressBook for RocksDBStore {
    async fn add_address(&self, address: Address) -> Result<()> {
        let _writer = self.writer.lock().await;
        if get::<Address>(&self.db, CF_ADDRESSES, address.id.as_bytes())?.is_some() {
            return Err(LedgerError::Conflict("Address already exists".to_string()));
        }
        put(&self.db, CF_ADDRESSES, address.id.as_bytes(), &address)
    }

    async fn get_address(&self, id: AddressId, owner: UserId) -> Result<Address> {
        get::<Address>(&self.db, CF_ADDRESSES, id.as_bytes())?
            .filter(|a| a.belongs_to(owner))
            .ok_or(LedgerError::NotFound("address"))
    }
}

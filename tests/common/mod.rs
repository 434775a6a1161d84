#![allow(dead_code)]

use marketplace_ledger::application::ledger::{OrderLedger, PlaceOrder};
use marketplace_ledger::domain::address::Address;
use marketplace_ledger::domain::item::Item;
use marketplace_ledger::domain::money::{Amount, Currency};
use marketplace_ledger::domain::ports::{AddressBook, CatalogStore};
use marketplace_ledger::domain::{AddressId, ItemId, UserId};
use marketplace_ledger::infrastructure::carrier::SimulatedCarrier;
use marketplace_ledger::infrastructure::gateway::SimulatedGateway;
use marketplace_ledger::infrastructure::in_memory::InMemoryStore;
use marketplace_ledger::infrastructure::notifier::LogNotifier;
use rust_decimal::Decimal;
use std::io::{Error, Write};
use std::path::Path;
use uuid::Uuid;

pub const HEADER: &str =
    "command,order,actor,item,address,method,carrier,tracking,shipping_cost,reason";

pub const BUYER: &str = "11111111-1111-1111-1111-111111111111";
pub const SELLER: &str = "55555555-5555-5555-5555-555555555555";
pub const OUD: &str = "22222222-2222-2222-2222-222222222222";
pub const DALLAH: &str = "66666666-6666-6666-6666-666666666666";
pub const ADDRESS: &str = "33333333-3333-3333-3333-333333333333";

/// Writes a command CSV made of `rows` (without header) to `path`.
pub fn write_commands(path: &Path, rows: &[String]) -> Result<(), Error> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "{}", HEADER)?;
    for row in rows {
        writeln!(file, "{}", row)?;
    }
    Ok(())
}

/// A seller with one listing and a buyer with one address, behind an in-memory ledger.
pub struct Marketplace {
    pub ledger: OrderLedger,
    pub store: InMemoryStore,
    pub buyer: UserId,
    pub seller: UserId,
    pub address: AddressId,
}

impl Marketplace {
    pub async fn new() -> Self {
        let store = InMemoryStore::new();
        let buyer = Uuid::new_v4();
        let address = Address {
            id: Uuid::new_v4(),
            owner_id: buyer,
            line1: "Al Wasl Road".to_string(),
            line2: None,
            city: "Dubai".to_string(),
            emirate: Some("Dubai".to_string()),
            postal_code: None,
            country: "AE".to_string(),
        };
        let address_id = address.id;
        store.add_address(address).await.unwrap();

        let ledger = OrderLedger::new(
            Box::new(store.clone()),
            Box::new(SimulatedGateway::default()),
            Box::new(SimulatedCarrier::new()),
            Box::new(LogNotifier),
        );
        Self {
            ledger,
            store,
            buyer,
            seller: Uuid::new_v4(),
            address: address_id,
        }
    }

    pub async fn list_item(&self, price: Decimal) -> ItemId {
        let item = Item::new(
            Uuid::new_v4(),
            self.seller,
            "Listing",
            Amount::new(price).unwrap(),
            Currency::Aed,
        );
        let id = item.id;
        self.store.add_item(item).await.unwrap();
        id
    }

    pub fn place(&self, item_id: ItemId) -> PlaceOrder {
        PlaceOrder {
            order_id: None,
            buyer_id: self.buyer,
            item_id,
            shipping_address_id: self.address,
            shipping_cost: None,
        }
    }
}

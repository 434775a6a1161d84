//! Domain layer: entities, value objects and the ports the ledger talks through.

pub mod address;
pub mod event;
pub mod item;
pub mod money;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod shipment;
pub mod transaction;

use uuid::Uuid;

pub type UserId = Uuid;
pub type ItemId = Uuid;
pub type AddressId = Uuid;
pub type OrderId = Uuid;
pub type TransactionId = Uuid;
pub type ShipmentId = Uuid;

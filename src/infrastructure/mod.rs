//! Adapters behind the domain ports: stores, the simulated payment gateway and
//! courier, and the log-backed notifier.

pub mod carrier;
pub mod changeset;
pub mod gateway;
pub mod in_memory;
pub mod notifier;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

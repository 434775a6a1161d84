use super::money::{Amount, Currency};
use super::{ItemId, UserId};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Available,
    Reserved,
    Sold,
    Deleted,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Available => "available",
            ItemStatus::Reserved => "reserved",
            ItemStatus::Sold => "sold",
            ItemStatus::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// A marketplace listing.
///
/// Once an order references the item, its status follows the order lifecycle:
/// `available -> reserved` on order creation, `reserved -> sold` on shipment and
/// `reserved -> available` on cancellation. Only the ledger performs those moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub seller_id: UserId,
    pub title: String,
    pub price: Amount,
    pub currency: Currency,
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(
        id: ItemId,
        seller_id: UserId,
        title: impl Into<String>,
        price: Amount,
        currency: Currency,
    ) -> Self {
        Self {
            id,
            seller_id,
            title: title.into(),
            price,
            currency,
            status: ItemStatus::Available,
            updated_at: Utc::now(),
        }
    }

    /// Whether the ledger currently owns this item's status.
    pub fn is_held_by_order(&self) -> bool {
        matches!(self.status, ItemStatus::Reserved | ItemStatus::Sold)
    }

    /// Reserves the item for a new order.
    pub fn reserve(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != ItemStatus::Available {
            return Err(LedgerError::Conflict("Item is not available".to_string()));
        }
        self.status = ItemStatus::Reserved;
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_sold(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != ItemStatus::Reserved {
            return Err(LedgerError::Conflict(format!(
                "Item cannot be sold while {}",
                self.status
            )));
        }
        self.status = ItemStatus::Sold;
        self.updated_at = now;
        Ok(())
    }

    /// Puts a reserved item back on the market.
    pub fn release(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != ItemStatus::Reserved {
            return Err(LedgerError::Conflict(format!(
                "Item cannot be released while {}",
                self.status
            )));
        }
        self.status = ItemStatus::Available;
        self.updated_at = now;
        Ok(())
    }

    /// Catalog-side status change. Limited to listing and soft-deleting items
    /// that no order holds.
    pub fn set_listing_status(&mut self, status: ItemStatus, now: DateTime<Utc>) -> Result<()> {
        if self.is_held_by_order() {
            return Err(LedgerError::Conflict(format!(
                "Item is {} by an order",
                self.status
            )));
        }
        match status {
            ItemStatus::Available | ItemStatus::Deleted => {
                self.status = status;
                self.updated_at = now;
                Ok(())
            }
            ItemStatus::Reserved | ItemStatus::Sold => Err(LedgerError::ValidationError(format!(
                "Item status {} is managed by orders",
                status
            ))),
        }
    }
}

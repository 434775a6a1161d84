use super::address::Address;
use super::item::Item;
use super::money::{Amount, Currency};
use super::pricing::PriceBreakdown;
use super::{AddressId, ItemId, OrderId, UserId};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    /// Reserved for out-of-band dispute handling. No ledger operation enters or leaves it.
    Disputed,
}

impl OrderStatus {
    /// The order lifecycle as a transition table.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
                | (Delivered, Completed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Disputed => "disputed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        };
        f.write_str(s)
    }
}

/// The central ledger entity.
///
/// The monetary breakdown is fixed when the order is placed; nothing below
/// recomputes it. `version` increases on every saved change and is what the
/// stores compare on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_id: ItemId,
    pub shipping_address_id: AddressId,
    pub item_price: Amount,
    pub shipping_cost: Amount,
    pub buyer_protection_fee: Amount,
    pub total_price: Amount,
    pub currency: Currency,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub cancellation_reason: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds a pending order for `buyer` on `item`.
    ///
    /// Self-purchase is rejected, and the address must belong to the buyer.
    pub fn place(
        id: OrderId,
        buyer_id: UserId,
        item: &Item,
        address: &Address,
        pricing: PriceBreakdown,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if item.seller_id == buyer_id {
            return Err(LedgerError::ValidationError(
                "Cannot buy your own item".to_string(),
            ));
        }
        if !address.belongs_to(buyer_id) {
            return Err(LedgerError::NotFound("shipping address"));
        }

        Ok(Self {
            id,
            buyer_id,
            seller_id: item.seller_id,
            item_id: item.id,
            shipping_address_id: address.id,
            item_price: pricing.item_price,
            shipping_cost: pricing.shipping_cost,
            buyer_protection_fee: pricing.buyer_protection_fee,
            total_price: pricing.total_price,
            currency: item.currency,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            cancellation_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
            completed_at: None,
        })
    }

    pub fn is_party(&self, user: UserId) -> bool {
        self.buyer_id == user || self.seller_id == user
    }

    /// What the seller is paid out on completion.
    pub fn payout_amount(&self) -> Result<Amount> {
        self.item_price.checked_add(self.shipping_cost)
    }

    pub fn ensure_payment_pending(&self) -> Result<()> {
        if self.payment_status != PaymentStatus::Pending {
            return Err(LedgerError::Conflict(
                "Payment already processed".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks the lifecycle table without changing anything.
    pub fn ensure_can(&self, next: OrderStatus) -> Result<()> {
        if self.order_status.can_transition_to(next) {
            return Ok(());
        }
        let action = match next {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "marked delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Pending | OrderStatus::Disputed => "moved",
        };
        Err(LedgerError::InvalidTransition(format!(
            "Order cannot be {} while {}",
            action, self.order_status
        )))
    }

    /// Records a successful payment: `pending/pending -> confirmed/paid`.
    pub fn confirm_payment(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_payment_pending()?;
        self.ensure_can(OrderStatus::Confirmed)?;
        self.order_status = OrderStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        self.touch(now);
        Ok(())
    }

    /// Records a payment the gateway declined. The order stays pending.
    pub fn fail_payment(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_payment_pending()?;
        self.payment_status = PaymentStatus::Failed;
        self.touch(now);
        Ok(())
    }

    pub fn ship(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_can(OrderStatus::Shipped)?;
        self.order_status = OrderStatus::Shipped;
        self.shipped_at = Some(now);
        self.touch(now);
        Ok(())
    }

    pub fn deliver(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_can(OrderStatus::Delivered)?;
        self.order_status = OrderStatus::Delivered;
        self.delivered_at = Some(now);
        self.touch(now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_can(OrderStatus::Completed)?;
        self.order_status = OrderStatus::Completed;
        self.completed_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Cancels the order. Returns `true` when the buyer had paid and a refund
    /// must be booked; the payment status is already `refunded` in that case.
    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<bool> {
        self.ensure_can(OrderStatus::Cancelled)?;
        self.order_status = OrderStatus::Cancelled;
        self.cancellation_reason = reason;
        let refund_due = self.payment_status == PaymentStatus::Paid;
        if refund_due {
            self.payment_status = PaymentStatus::Refunded;
        }
        self.touch(now);
        Ok(refund_due)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

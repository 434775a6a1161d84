use crate::domain::money::Currency;
use crate::domain::order::{Order, OrderStatus, PaymentStatus};
use crate::domain::transaction::{PaymentMethod, Transaction, TransactionStatus, TransactionType};
use crate::domain::{ItemId, OrderId, TransactionId, UserId};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow {
    order: OrderId,
    buyer: UserId,
    seller: UserId,
    item: ItemId,
    item_price: String,
    shipping_cost: String,
    buyer_protection_fee: String,
    total_price: String,
    currency: Currency,
    order_status: OrderStatus,
    payment_status: PaymentStatus,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            order: order.id,
            buyer: order.buyer_id,
            seller: order.seller_id,
            item: order.item_id,
            item_price: order.item_price.to_string(),
            shipping_cost: order.shipping_cost.to_string(),
            buyer_protection_fee: order.buyer_protection_fee.to_string(),
            total_price: order.total_price.to_string(),
            currency: order.currency,
            order_status: order.order_status,
            payment_status: order.payment_status,
        }
    }
}

#[derive(Serialize)]
struct TransactionRow<'a> {
    tx: TransactionId,
    order: OrderId,
    r#type: TransactionType,
    amount: String,
    currency: Currency,
    status: TransactionStatus,
    method: PaymentMethod,
    gateway_ref: Option<&'a str>,
    created_at: String,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            tx: tx.id,
            order: tx.order_id,
            r#type: tx.r#type,
            amount: tx.amount.to_string(),
            currency: tx.currency,
            status: tx.status,
            method: tx.method,
            gateway_ref: tx.gateway_ref.as_deref(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Writes the final order table and the transaction ledger as CSV.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, orders: &[Order]) -> Result<()> {
        for order in orders {
            self.writer.serialize(OrderRow::from(order))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(TransactionRow::from(tx))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

use super::money::{Amount, Currency};
use super::{OrderId, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Refund,
    Payout,
    Fee,
    Chargeback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Card,
    Wallet,
    BankTransfer,
}

impl PaymentMethod {
    /// Methods that settle through the payment gateway rather than at the door.
    pub fn is_gateway_backed(&self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }
}

/// An immutable entry in an order's financial ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub r#type: TransactionType,
    pub amount: Amount,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub method: PaymentMethod,
    /// Identifier assigned by the payment gateway (intent or refund id).
    pub gateway_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        r#type: TransactionType,
        amount: Amount,
        currency: Currency,
        status: TransactionStatus,
        method: PaymentMethod,
        gateway_ref: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            r#type,
            amount,
            currency,
            status,
            method,
            gateway_ref,
            created_at,
        }
    }

    pub fn is_payment(&self) -> bool {
        self.r#type == TransactionType::Payment
    }
}

/// The payment still waiting on the gateway, if any.
///
/// Settlement appends a new payment row rather than updating the pending one, so
/// only the most recent payment row can be open.
pub fn open_payment(history: &[Transaction]) -> Option<&Transaction> {
    history
        .iter()
        .rev()
        .find(|tx| tx.is_payment())
        .filter(|tx| tx.status == TransactionStatus::Pending)
}

/// Picks the method a refund should go back through: the settled payment if
/// there is one, then the earliest recorded transaction, then cash on delivery.
pub fn refund_method(history: &[Transaction]) -> (PaymentMethod, Option<String>) {
    history
        .iter()
        .find(|tx| tx.is_payment() && tx.status == TransactionStatus::Success)
        .or_else(|| history.first())
        .map(|tx| (tx.method, tx.gateway_ref.clone()))
        .unwrap_or((PaymentMethod::Cod, None))
}

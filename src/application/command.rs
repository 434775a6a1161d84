use super::ledger::{OrderLedger, PlaceOrder, ShipOrder};
use crate::domain::order::Order;
use crate::domain::transaction::PaymentMethod;
use crate::domain::{OrderId, UserId};
use crate::error::Result;

/// One lifecycle request, as fed to [`OrderLedger::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    Create(PlaceOrder),
    Pay {
        order_id: OrderId,
        buyer_id: UserId,
        method: PaymentMethod,
    },
    Settle {
        order_id: OrderId,
    },
    Ship {
        order_id: OrderId,
        seller_id: UserId,
        request: ShipOrder,
    },
    Deliver {
        order_id: OrderId,
        buyer_id: UserId,
    },
    Complete {
        order_id: OrderId,
        buyer_id: UserId,
    },
    Cancel {
        order_id: OrderId,
        actor_id: UserId,
        reason: Option<String>,
    },
}

impl LedgerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::Create(_) => "create",
            LedgerCommand::Pay { .. } => "pay",
            LedgerCommand::Settle { .. } => "settle",
            LedgerCommand::Ship { .. } => "ship",
            LedgerCommand::Deliver { .. } => "deliver",
            LedgerCommand::Complete { .. } => "complete",
            LedgerCommand::Cancel { .. } => "cancel",
        }
    }
}

impl OrderLedger {
    /// Dispatches a command to the matching transition.
    pub async fn execute(&self, command: LedgerCommand) -> Result<Order> {
        match command {
            LedgerCommand::Create(request) => self.create_order(request).await,
            LedgerCommand::Pay {
                order_id,
                buyer_id,
                method,
            } => self.confirm_payment(order_id, buyer_id, method).await,
            LedgerCommand::Settle { order_id } => self.settle_payment(order_id).await,
            LedgerCommand::Ship {
                order_id,
                seller_id,
                request,
            } => self.ship_order(order_id, seller_id, request).await,
            LedgerCommand::Deliver { order_id, buyer_id } => {
                self.confirm_delivery(order_id, buyer_id).await
            }
            LedgerCommand::Complete { order_id, buyer_id } => {
                self.complete_order(order_id, buyer_id).await
            }
            LedgerCommand::Cancel {
                order_id,
                actor_id,
                reason,
            } => self.cancel_order(order_id, actor_id, reason).await,
        }
    }
}

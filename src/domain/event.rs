use serde::{Deserialize, Serialize};
use std::fmt;

/// Order events pushed to the notification sink after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    OrderPlaced,
    PaymentConfirmed,
    PaymentFailed,
    OrderShipped,
    OrderDelivered,
    OrderCompleted,
    OrderCancelled,
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedgerEvent::OrderPlaced => "order_placed",
            LedgerEvent::PaymentConfirmed => "payment_confirmed",
            LedgerEvent::PaymentFailed => "payment_failed",
            LedgerEvent::OrderShipped => "order_shipped",
            LedgerEvent::OrderDelivered => "order_delivered",
            LedgerEvent::OrderCompleted => "order_completed",
            LedgerEvent::OrderCancelled => "order_cancelled",
        };
        f.write_str(s)
    }
}

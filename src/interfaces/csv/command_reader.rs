use crate::application::command::LedgerCommand;
use crate::application::ledger::{PlaceOrder, ShipOrder};
use crate::domain::transaction::PaymentMethod;
use crate::domain::{AddressId, ItemId, OrderId, UserId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Create,
    Pay,
    Settle,
    Ship,
    Deliver,
    Complete,
    Cancel,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::Create => "create",
            CommandKind::Pay => "pay",
            CommandKind::Settle => "settle",
            CommandKind::Ship => "ship",
            CommandKind::Deliver => "deliver",
            CommandKind::Complete => "complete",
            CommandKind::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// One row of the command stream. Which columns are required depends on the command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRecord {
    pub command: CommandKind,
    #[serde(default)]
    pub order: Option<OrderId>,
    #[serde(default)]
    pub actor: Option<UserId>,
    #[serde(default)]
    pub item: Option<ItemId>,
    #[serde(default)]
    pub address: Option<AddressId>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking: Option<String>,
    /// Parsed from the raw text so amounts never pass through `f64`.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,
}

fn required<T>(value: Option<T>, column: &str, command: CommandKind) -> Result<T> {
    value.ok_or_else(|| {
        LedgerError::ValidationError(format!("'{}' requires the '{}' column", command, column))
    })
}

impl TryFrom<CommandRecord> for LedgerCommand {
    type Error = LedgerError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let kind = record.command;
        let command = match kind {
            CommandKind::Create => LedgerCommand::Create(PlaceOrder {
                order_id: record.order,
                buyer_id: required(record.actor, "actor", kind)?,
                item_id: required(record.item, "item", kind)?,
                shipping_address_id: required(record.address, "address", kind)?,
                shipping_cost: record.shipping_cost,
            }),
            CommandKind::Pay => LedgerCommand::Pay {
                order_id: required(record.order, "order", kind)?,
                buyer_id: required(record.actor, "actor", kind)?,
                method: record.method.unwrap_or_default(),
            },
            CommandKind::Settle => LedgerCommand::Settle {
                order_id: required(record.order, "order", kind)?,
            },
            CommandKind::Ship => LedgerCommand::Ship {
                order_id: required(record.order, "order", kind)?,
                seller_id: required(record.actor, "actor", kind)?,
                request: ShipOrder {
                    carrier: record.carrier,
                    tracking_number: record.tracking,
                    label_url: None,
                },
            },
            CommandKind::Deliver => LedgerCommand::Deliver {
                order_id: required(record.order, "order", kind)?,
                buyer_id: required(record.actor, "actor", kind)?,
            },
            CommandKind::Complete => LedgerCommand::Complete {
                order_id: required(record.order, "order", kind)?,
                buyer_id: required(record.actor, "actor", kind)?,
            },
            CommandKind::Cancel => LedgerCommand::Cancel {
                order_id: required(record.order, "order", kind)?,
                actor_id: required(record.actor, "actor", kind)?,
                reason: record.reason,
            },
        };
        Ok(command)
    }
}

/// Reads lifecycle commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths, so
/// trailing optional columns may be left off.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts commands, one `Result` per row.
    pub fn commands(self) -> impl Iterator<Item = Result<LedgerCommand>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|result| result.map_err(LedgerError::from).and_then(LedgerCommand::try_from))
    }
}

//! Order lifecycle and ledger for a C2C marketplace.
//!
//! Orders move `pending -> confirmed -> shipped -> delivered -> completed`, or are
//! cancelled before shipping. Each transition commits the order, the listing's
//! reservation and any ledger rows as one unit of work.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

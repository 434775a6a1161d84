//! Application layer containing the order lifecycle orchestration.
//!
//! `OrderLedger` is the entry point for every lifecycle transition. It owns the
//! store and the external adapters, and drives each transition through a single
//! unit of work.

pub mod command;
pub mod ledger;

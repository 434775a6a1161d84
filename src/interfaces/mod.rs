//! Batch interfaces: CSV command streams in, order and ledger tables out.

pub mod csv;

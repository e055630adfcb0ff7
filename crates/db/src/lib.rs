//! Storage layer for the Tally ledger.
//!
//! This crate provides:
//! - Table storage enforcing the ledger's referential constraints
//! - A transactional in-memory store implementing the core repository traits

pub mod repositories;

pub use repositories::{InMemoryLedgerStore, LedgerTables};

//! Repository implementations for the ledger.
//!
//! The core defines the storage traits; this module provides the table
//! storage, its undo journal and the transactional store built on both.

mod journal;
pub mod memory;
pub mod tables;

pub use memory::InMemoryLedgerStore;
pub use tables::LedgerTables;

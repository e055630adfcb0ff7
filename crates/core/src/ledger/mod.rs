//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - The parent/account tree
//! - Bookings and their open/closed state machine
//! - Entries (one debit or one credit each)
//! - Write-path validation
//! - Recursive aggregation of debit/credit totals
//! - Bulk import of flat records
//! - Ledger service tying the store and the rules together

pub mod aggregation;
pub mod booking;
pub mod entry;
pub mod error;
pub mod import;
pub mod repository;
pub mod service;
pub mod tree;
pub mod validation;

#[cfg(test)]
mod aggregation_props;
#[cfg(test)]
mod test_support;
#[cfg(test)]
mod validation_props;

pub use aggregation::{Aggregator, LedgerNode, NodeTotals, RootReport};
pub use booking::{Booking, BookingState, BookingTotals};
pub use entry::{Entry, EntrySide, NewEntry};
pub use error::{LedgerError, LedgerResult};
pub use import::ImportRecord;
pub use repository::{LedgerRead, LedgerRepository, LedgerTx, SumScope};
pub use service::LedgerService;
pub use tree::{Account, Parent};
pub use validation::BookingWrite;

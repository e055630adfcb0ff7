//! Core ledger logic for Tally.
//!
//! This crate contains pure bookkeeping logic with no storage dependencies.
//! Persistence is reached through the repository traits in [`ledger::repository`],
//! which the `tally-db` crate implements.
//!
//! # Modules
//!
//! - `ledger` - Account tree, bookings, entries, invariant checks and aggregation

pub mod ledger;

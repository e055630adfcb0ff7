//! Shared types and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Typed IDs for type-safe entity references
//! - Configuration management
//! - Tracing subscriber setup

pub mod config;
pub mod telemetry;
pub mod types;

pub use config::LedgerConfig;

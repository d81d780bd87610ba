//! # sediment-core: Migration Engine for sediment
//!
//! The engine behind the `sediment` migration tool: parses up/down SQL
//! change-sets from plain-text files, reconciles them against a ledger table
//! in PostgreSQL, and applies or reverses them in deterministic order.
//!
//! The pieces compose left to right: [`MigrationManager`] loads an ordered
//! migration sequence from disk, [`Ledger`] reads and writes the tracking
//! table, and [`MigrationRunner`] drives apply/rollback across both.

pub mod error;
pub mod migrations;

// Re-export core types
pub use error::*;
pub use migrations::*;

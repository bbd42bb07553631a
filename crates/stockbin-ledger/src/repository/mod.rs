//! # Repository Module
//!
//! Database repository implementations for the StockBin ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  AllocationService                                                     │
//! │       │                                                                 │
//! │       │  ledger.balances().balances("WIDGET", &warehouses, None)       │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BalanceRepository                                                     │
//! │  ├── balances(&self, item, warehouses, excluded)                       │
//! │  ├── last_location_with_history(&self, item, warehouse, excluded)      │
//! │  └── record_entry(&self, entry)                                        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  All candidate queries are read-only snapshots: the allocator never    │
//! │  mutates the ledger, so a failed call is always safe to repeat.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`balance::BalanceRepository`] - per-location balance aggregation
//! - [`batch::BatchRepository`] - lot candidates and nested serial lookups
//! - [`serial::SerialRepository`] - individually identified units
//! - [`master_data::MasterDataRepository`] - item tracking flags, settings

pub mod balance;
pub mod batch;
pub mod master_data;
pub mod serial;

//! # stockbin-ledger: Ledger Query Layer for StockBin
//!
//! This crate provides database access for the StockBin allocation system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StockBin Data Flow                               │
//! │                                                                         │
//! │  AllocationService (allocate_mixed_tracking)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockbin-ledger (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Ledger     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BalanceRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BatchRepo     │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ SerialRepo    │    │              │  │   │
//! │  │   │ Management    │    │ MasterData    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (stock_ledger_entries, batches, serial_units, ...)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Ledger error types
//! - [`repository`] - Repository implementations (balances, batches, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbin_ledger::{Ledger, LedgerConfig};
//!
//! let ledger = Ledger::new(LedgerConfig::new("path/to/stockbin.db")).await?;
//! let balances = ledger
//!     .balances()
//!     .balances("WIDGET", &["WH-MAIN".to_string()], None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{LedgerError, LedgerResult};
pub use pool::{Ledger, LedgerConfig};

// Repository re-exports for convenience
pub use repository::balance::{BalanceRepository, LedgerEntry, LocationBalance};
pub use repository::batch::{Batch, BatchCandidate, BatchRepository};
pub use repository::master_data::{
    Item, MasterDataRepository, DEFAULT_STAGING_LOCATION, DEFAULT_STAGING_WAREHOUSE,
};
pub use repository::serial::{SerialRepository, SerialUnit};

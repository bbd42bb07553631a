//! # stockbin-engine: Allocation Service for StockBin
//!
//! The caller-facing crate of the StockBin system. It wires the pure
//! ranking and allocation logic from `stockbin-core` to the SQLite
//! repositories in `stockbin-ledger` and exposes the operations a
//! picking or delivery flow calls:
//!
//! - [`AllocationService::resolve_locations_for_item`] - FIFO walk of
//!   one item's locations for a required quantity
//! - [`AllocationService::allocate_rows`] - grouped plain allocation of
//!   a request list
//! - [`AllocationService::allocate_mixed_tracking`] - full dispatch
//!   across plain, batch-tracked, and serialized items, with
//!   consumption policy, warehouse priority, and warehouse exclusion
//! - [`AllocationService::default_location_for_item`] - stock-first,
//!   history-second default location resolution
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  caller (pick list / delivery flow)                              │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  stockbin-engine (THIS CRATE)   AllocationService                │
//! │       │                    │                                     │
//! │       ▼                    ▼                                     │
//! │  stockbin-core        stockbin-ledger                            │
//! │  rank / allocate      balances, batches, serial units            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbin_engine::AllocationService;
//! use stockbin_ledger::{Ledger, LedgerConfig};
//!
//! let ledger = Ledger::new(LedgerConfig::new("stockbin.db")).await?;
//! let service = AllocationService::new(ledger);
//! let outcomes = service.allocate_rows(&rows).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{EngineError, EngineResult};
pub use service::{AllocationService, DefaultLocationRequest, LocationProposal};

//! # stockbin-core: Pure Allocation Logic for StockBin
//!
//! This crate is the **heart** of StockBin. It turns a snapshot of
//! per-location stock availability into deterministic allocation proposals,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StockBin Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockbin-engine (AllocationService)            │   │
//! │  │   resolve_locations_for_item, allocate_rows, mixed tracking    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockbin-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  ranker   │  │ allocator │  │ grouping  │  │   │
//! │  │   │ Candidate │  │  policy   │  │  Cursor   │  │ RowGroup  │  │   │
//! │  │   │  Outcome  │  │  ordering │  │  splits   │  │ reorder   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockbin-ledger (Ledger Layer)                  │   │
//! │  │        SQLite stock ledger, batches, serial units              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Candidate, AllocationRequest, AllocationOutcome, ...)
//! - [`ranker`] - Availability ranking per consumption policy
//! - [`allocator`] - Greedy splitting allocator with a shared forward cursor
//! - [`grouping`] - Request grouping and result reassembly
//! - [`error`] - Validation error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Forward-Only Cursor**: The no-double-allocation guarantee is structural,
//!    not emergent - a single index that only ever moves forward
//! 4. **Silent Deficits**: Insufficient availability is data, not an error
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbin_core::allocator::allocate_group;
//! use stockbin_core::ranker::rank;
//! use stockbin_core::types::{AllocationRequest, Candidate, ConsumptionPolicy, OrderKey};
//!
//! let candidates = vec![
//!     Candidate::plain("WH-MAIN", "BIN-A1", 5.0, OrderKey::at_creation(1)),
//!     Candidate::plain("WH-MAIN", "BIN-A2", 5.0, OrderKey::at_creation(2)),
//! ];
//! let ranked = rank(candidates, ConsumptionPolicy::OldestFirst, None, None);
//!
//! let rows = vec![AllocationRequest::new("row-1", "WIDGET", "WH-MAIN", 7.0)];
//! let outcomes = allocate_group(&ranked, &rows);
//!
//! // 5 from BIN-A1, split of 2 into BIN-A2
//! assert!(outcomes[0].is_split());
//! assert_eq!(outcomes[0].allocated_qty, 7.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod error;
pub mod grouping;
pub mod ranker;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockbin_core::Candidate` instead of
// `use stockbin_core::types::Candidate`

pub use allocator::{allocate_group, AllocationCursor, QTY_EPSILON};
pub use error::ValidationError;
pub use grouping::{group_rows, reorder_outcomes, GroupedRows, RowGroup};
pub use ranker::rank;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length accepted for item codes and warehouse names.
///
/// ## Why a constant?
/// Keeps validation in step with the VARCHAR widths in the ledger schema.
/// A longer identifier can never match a ledger row, so it is rejected early.
pub const MAX_IDENTIFIER_LEN: usize = 140;

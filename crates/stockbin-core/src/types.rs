//! # Domain Types
//!
//! Core domain types used throughout StockBin.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────┐      │
//! │  │   Candidate     │   │AllocationRequest│   │AllocationOutcome │      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────  │      │
//! │  │  warehouse      │   │  row_id         │   │  row_id          │      │
//! │  │  location       │   │  item_code      │   │  primary         │      │
//! │  │  available      │   │  warehouse      │   │  overflow[]      │      │
//! │  │  order_key      │   │  quantity       │   │  requested_qty   │      │
//! │  │  expiry?        │   └─────────────────┘   │  allocated_qty   │      │
//! │  │  batch_no?      │                         └──────────────────┘      │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐  ┌──────────────────┐      │
//! │  │    OrderKey     │   │ConsumptionPolicy │  │TrackingDiscipline│      │
//! │  │  ─────────────  │   │  ──────────────  │  │  ──────────────  │      │
//! │  │  posting_date   │   │  OldestFirst     │  │  Plain           │      │
//! │  │  posting_time   │   │  NewestFirst     │  │  BatchTracked    │      │
//! │  │  creation       │   │ SoonestExpiry... │  │  SerialTracked   │      │
//! │  └─────────────────┘   └──────────────────┘  └──────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantity Representation
//! Stock quantities are `f64` because the ledger tracks real-valued stock
//! (kilograms, litres, metres). Serialized units are discrete: their
//! producers only ever emit whole-number quantities, so the shared allocator
//! arithmetic stays exact for them.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Consumption Policy
// =============================================================================

/// The order in which available stock is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionPolicy {
    /// FIFO - consume the stock that arrived first (ascending order key).
    OldestFirst,
    /// LIFO - consume the stock that arrived last (descending order key).
    NewestFirst,
    /// FEFO - consume the batch that expires soonest. Batches without an
    /// expiry date sort last. Only meaningful for batch-tracked items;
    /// plain and serialized candidates carry no expiry, so ranking
    /// degrades to creation order.
    SoonestExpiryFirst,
}

impl Default for ConsumptionPolicy {
    fn default() -> Self {
        ConsumptionPolicy::OldestFirst
    }
}

// =============================================================================
// Tracking Discipline
// =============================================================================

/// Per-item tracking flags resolved from master data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingFlags {
    /// Item units are grouped into identifiable lots.
    pub has_batches: bool,
    /// Item units carry individual serial numbers.
    pub has_serial_units: bool,
}

/// How an item's physical units are identified.
///
/// Resolved once per item at the start of an allocation call and fixed for
/// its duration. Exactly one discipline applies to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingDiscipline {
    /// Fungible units - (location, quantity) pairs are the allocatable unit.
    Plain,
    /// Lots are the allocatable unit. If the item is also serialized, the
    /// specific unit identifiers are looked up within the chosen batch.
    BatchTracked,
    /// Individual units are the allocatable unit; quantities are counts.
    SerialTracked,
}

impl TrackingDiscipline {
    /// Resolves the discipline from master data flags.
    ///
    /// Batch tracking takes precedence when both flags are set - the batch
    /// is chosen first and the serial lookup is nested inside it.
    pub fn from_flags(flags: TrackingFlags) -> Self {
        if flags.has_batches {
            TrackingDiscipline::BatchTracked
        } else if flags.has_serial_units {
            TrackingDiscipline::SerialTracked
        } else {
            TrackingDiscipline::Plain
        }
    }
}

// =============================================================================
// Order Key
// =============================================================================

/// Sort key for candidate ordering.
///
/// ## Determinism
/// `creation` is a monotonically increasing marker assigned by the ledger
/// and unique per entry, so comparing two keys can never tie. Every ranking
/// built from order keys is therefore a strict total order, and repeated
/// calls against an unchanged snapshot produce bit-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderKey {
    /// Ledger posting date of the earliest contributing entry.
    pub posting_date: NaiveDate,
    /// Ledger posting time of the earliest contributing entry.
    pub posting_time: NaiveTime,
    /// Monotonically increasing creation marker (tie-break, unique).
    pub creation: i64,
}

impl OrderKey {
    /// Creates an order key from its parts.
    pub fn new(posting_date: NaiveDate, posting_time: NaiveTime, creation: i64) -> Self {
        OrderKey {
            posting_date,
            posting_time,
            creation,
        }
    }

    /// Creates an order key distinguished only by its creation marker.
    ///
    /// Used where the producer has no posting timestamp of its own
    /// (e.g. batch and serial-unit records) and in tests.
    pub fn at_creation(creation: i64) -> Self {
        OrderKey {
            posting_date: NaiveDate::MIN,
            posting_time: NaiveTime::MIN,
            creation,
        }
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// A ranked, available supply of an item at a location.
///
/// Produced fresh per allocation call by a discipline-specific producer,
/// never mutated - the cursor tracks consumption externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Warehouse the location belongs to.
    pub warehouse: String,
    /// Smallest addressable storage unit within the warehouse.
    pub location: String,
    /// Available quantity, already net of cancelled entries.
    /// For serialized items this is a whole-number unit count.
    pub available: f64,
    /// Ordering key per the consumption policy.
    pub order_key: OrderKey,
    /// Batch expiry date, if the candidate is a batch with one.
    pub expiry: Option<NaiveDate>,
    /// Batch identity, if the candidate is a batch.
    pub batch_no: Option<String>,
}

impl Candidate {
    /// Creates a plain (location, quantity) candidate.
    pub fn plain(
        warehouse: impl Into<String>,
        location: impl Into<String>,
        available: f64,
        order_key: OrderKey,
    ) -> Self {
        Candidate {
            warehouse: warehouse.into(),
            location: location.into(),
            available,
            order_key,
            expiry: None,
            batch_no: None,
        }
    }

    /// Creates a batch candidate.
    pub fn batch(
        warehouse: impl Into<String>,
        location: impl Into<String>,
        batch_no: impl Into<String>,
        available: f64,
        order_key: OrderKey,
        expiry: Option<NaiveDate>,
    ) -> Self {
        Candidate {
            warehouse: warehouse.into(),
            location: location.into(),
            available,
            order_key,
            expiry,
            batch_no: Some(batch_no.into()),
        }
    }
}

// =============================================================================
// Allocation Request
// =============================================================================

/// One requested row: a demand for a quantity of an item from a warehouse.
///
/// Immutable once submitted. `row_id` is caller-supplied and opaque -
/// it is used only to correlate outcomes back to requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Caller-supplied correlation id.
    pub row_id: String,
    /// Item being demanded.
    pub item_code: String,
    /// Warehouse to allocate from.
    pub warehouse: String,
    /// Requested quantity. Non-positive rows are no-ops, not errors.
    pub quantity: f64,
}

impl AllocationRequest {
    /// Creates a request row.
    pub fn new(
        row_id: impl Into<String>,
        item_code: impl Into<String>,
        warehouse: impl Into<String>,
        quantity: f64,
    ) -> Self {
        AllocationRequest {
            row_id: row_id.into(),
            item_code: item_code.into(),
            warehouse: warehouse.into(),
            quantity,
        }
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// A single (location, quantity) slice taken from a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Warehouse the slice was taken from.
    pub warehouse: String,
    /// Location the slice was taken from.
    pub location: String,
    /// Quantity taken.
    pub quantity: f64,
    /// Batch the slice was taken from, for batch-tracked items.
    pub batch_no: Option<String>,
    /// Specific unit identifiers, for serialized items. Length equals
    /// `quantity` when populated.
    pub serial_nos: Vec<String>,
}

impl Allocation {
    /// Creates an allocation slice of `quantity` against a candidate.
    pub fn from_candidate(candidate: &Candidate, quantity: f64) -> Self {
        Allocation {
            warehouse: candidate.warehouse.clone(),
            location: candidate.location.clone(),
            quantity,
            batch_no: candidate.batch_no.clone(),
            serial_nos: Vec::new(),
        }
    }
}

// =============================================================================
// Allocation Outcome
// =============================================================================

/// The allocation result for one requested row.
///
/// ## Deficits Are Data
/// When availability ran out, `allocated_qty < requested_qty` and the
/// outcome carries no error. Callers that require full fulfillment compare
/// the two (or call [`AllocationOutcome::deficit`]) and decide for
/// themselves whether to fail their enclosing transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Correlation id copied from the request row.
    pub row_id: String,
    /// Quantity the row asked for.
    pub requested_qty: f64,
    /// Quantity actually allocated across all slices.
    pub allocated_qty: f64,
    /// First slice recorded for the row, if any quantity was allocated.
    pub primary: Option<Allocation>,
    /// Slices beyond what the primary location could supply, in cursor order.
    pub overflow: Vec<Allocation>,
}

impl AllocationOutcome {
    /// Creates an empty outcome for a row that allocated nothing.
    pub fn empty(row_id: impl Into<String>, requested_qty: f64) -> Self {
        AllocationOutcome {
            row_id: row_id.into(),
            requested_qty,
            allocated_qty: 0.0,
            primary: None,
            overflow: Vec::new(),
        }
    }

    /// True iff the row had to be split across more than one location.
    pub fn is_split(&self) -> bool {
        !self.overflow.is_empty()
    }

    /// Unfilled quantity. Zero when the row was fully satisfied.
    pub fn deficit(&self) -> f64 {
        (self.requested_qty - self.allocated_qty).max(0.0)
    }

    /// Iterates primary and overflow slices in consumption order.
    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.primary.iter().chain(self.overflow.iter())
    }

    /// Iterates slices mutably, in consumption order.
    pub fn allocations_mut(&mut self) -> impl Iterator<Item = &mut Allocation> {
        self.primary.iter_mut().chain(self.overflow.iter_mut())
    }
}

// =============================================================================
// Call-Scoped Constraints
// =============================================================================

/// Per-item warehouse preference: warehouses in the list are ranked first
/// among otherwise-equal candidates, in a stable partition.
///
/// Call-scoped, never persisted.
pub type PriorityMap = HashMap<String, Vec<String>>;

/// Warehouses to drop from candidacy entirely (e.g. a staging/WIP
/// warehouse). Applied as a filter before ranking.
///
/// Call-scoped, never persisted.
pub type WarehouseExclusion = HashSet<String>;

// =============================================================================
// Unit Tests
// =============================================================================

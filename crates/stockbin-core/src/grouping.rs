//! # Request Grouper / Result Reassembler
//!
//! Buckets a caller's flat list of requested rows by (item, warehouse) so
//! the allocator sees one contiguous demand per group, then scatters the
//! per-group results back to the caller's original row ordering.
//!
//! ## Why Group?
//! Two rows demanding the same item from the same warehouse must share a
//! candidate list and a cursor - otherwise both would believe the same
//! stock is free. Rows for different (item, warehouse) pairs are
//! independent and each get a fresh ranking and cursor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  input rows (submission order)                                          │
//! │    0: (WIDGET, WH-A, 4)   ┐                                            │
//! │    1: (GADGET, WH-A, 2)   │ group (WIDGET, WH-A): rows [0, 3]          │
//! │    2: (WIDGET, "",   5)   │ group (GADGET, WH-A): rows [1]             │
//! │    3: (WIDGET, WH-A, 6)   ┘ skipped (blank warehouse): rows [2]        │
//! │                                                                         │
//! │  per-group allocation → (index, outcome) pairs → sort by index →       │
//! │  output indexed identically to input                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use crate::types::{AllocationOutcome, AllocationRequest};
use crate::validation::{validate_item_code, validate_quantity, validate_warehouse};

// =============================================================================
// Row Groups
// =============================================================================

/// The rows sharing one (item, warehouse) pair, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    /// Item demanded by every row in the group.
    pub item_code: String,
    /// Warehouse every row in the group draws from.
    pub warehouse: String,
    /// Indices into the caller's row list, in submission order.
    pub row_indices: Vec<usize>,
}

impl RowGroup {
    /// Total quantity demanded across the group's rows.
    pub fn total_quantity(&self, rows: &[AllocationRequest]) -> f64 {
        self.row_indices
            .iter()
            .map(|&index| rows[index].quantity)
            .sum()
    }
}

/// The result of bucketing a request list.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRows {
    /// Allocatable groups. Iteration order is by key, not by input
    /// position - only the row order inside each group matters.
    pub groups: Vec<RowGroup>,
    /// Indices of rows that bypass allocation entirely: missing item,
    /// missing warehouse, or non-positive quantity.
    pub skipped: Vec<usize>,
}

/// Buckets rows by (item, warehouse).
///
/// Invalid rows are diverted to `skipped` without consulting any ranker
/// or allocator - they get empty outcomes directly. A skipped row is a
/// no-op, never an error.
pub fn group_rows(rows: &[AllocationRequest]) -> GroupedRows {
    let mut buckets: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if !is_allocatable(row) {
            skipped.push(index);
            continue;
        }
        buckets
            .entry((row.item_code.clone(), row.warehouse.clone()))
            .or_default()
            .push(index);
    }

    let groups = buckets
        .into_iter()
        .map(|((item_code, warehouse), row_indices)| RowGroup {
            item_code,
            warehouse,
            row_indices,
        })
        .collect();

    GroupedRows { groups, skipped }
}

/// Whether a row participates in allocation at all.
fn is_allocatable(row: &AllocationRequest) -> bool {
    validate_item_code(&row.item_code).is_ok()
        && validate_warehouse(&row.warehouse).is_ok()
        && validate_quantity(row.quantity).is_ok()
}

// =============================================================================
// Reassembly
// =============================================================================

/// Restores outcomes to the caller's original row ordering.
///
/// Takes the (original index, outcome) pairs produced across all groups
/// and skipped rows; the result is indexed identically to the request
/// list.
pub fn reorder_outcomes(mut indexed: Vec<(usize, AllocationOutcome)>) -> Vec<AllocationOutcome> {
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

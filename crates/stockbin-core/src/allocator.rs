//! # Greedy Splitting Allocator
//!
//! Walks a ranked candidate list, consuming quantity to satisfy requested
//! rows in submission order. A single shared cursor advances through the
//! list so that quantity already promised to an earlier row is never
//! reused by a later row in the same group.
//!
//! ## The Cursor Walk
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Candidates:  [BIN-A: 5]  [BIN-B: 5]                                   │
//! │  Rows:        row-1 wants 7, row-2 wants 3                             │
//! │                                                                         │
//! │  row-1: need=7                                                          │
//! │    cursor @ BIN-A, remaining=5  → take 5, advance      (primary)       │
//! │    cursor @ BIN-B, remaining=5  → take 2, remaining=3  (overflow)      │
//! │    outcome: primary=(BIN-A, 5), overflow=[(BIN-B, 2)], split=true      │
//! │                                                                         │
//! │  row-2: need=3                                                          │
//! │    cursor @ BIN-B, remaining=3  → take 3, remaining=0                  │
//! │    outcome: primary=(BIN-B, 3), split=false                            │
//! │                                                                         │
//! │  Forward-only: once the cursor moves past BIN-A, nothing can draw      │
//! │  from it again. No double allocation, by construction.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deficits
//! Exhausting the candidate list with rows still unsatisfied is not an
//! error. Affected rows end with `allocated_qty < requested_qty` and the
//! caller decides what to do about it.

use crate::types::{Allocation, AllocationOutcome, AllocationRequest, Candidate};

/// Quantities smaller than this are treated as consumed.
///
/// Ledger quantities are sums of f64 movements; subtracting a row's need
/// from a candidate can leave dust that must not count as availability.
pub const QTY_EPSILON: f64 = 1e-9;

// =============================================================================
// Allocation Cursor
// =============================================================================

/// Call-scoped pointer into a candidate list.
///
/// Tracks which candidate is being consumed and how much of it remains.
/// Exists only for the duration of one (item, warehouse) group and is
/// discarded after - it is never shared across groups. The index only
/// moves forward, which makes the no-double-allocation invariant a
/// structural property of this type rather than an emergent one.
#[derive(Debug, Clone, Copy)]
pub struct AllocationCursor {
    /// Index of the candidate currently being consumed.
    index: usize,
    /// Quantity left at that candidate.
    remaining: f64,
}

impl AllocationCursor {
    /// Positions a fresh cursor at the first candidate.
    pub fn new(candidates: &[Candidate]) -> Self {
        AllocationCursor {
            index: 0,
            remaining: candidates.first().map_or(0.0, |c| c.available),
        }
    }

    /// True when the cursor has run past the last candidate.
    pub fn exhausted(&self, candidates: &[Candidate]) -> bool {
        self.index >= candidates.len()
    }

    /// Moves to the next candidate, resetting `remaining` to its full
    /// quantity (or zero past the end).
    fn advance(&mut self, candidates: &[Candidate]) {
        self.index += 1;
        self.remaining = candidates.get(self.index).map_or(0.0, |c| c.available);
    }
}

// =============================================================================
// Group Allocation
// =============================================================================

/// Allocates a group of rows against one ranked candidate list.
///
/// Rows must share one (item, warehouse) group and are consumed in the
/// order given. Returns one outcome per row, in the same order.
///
/// ## Guarantees
/// - Conservation: total allocated never exceeds total candidate quantity
/// - No backtracking: a candidate left behind is gone for this group
/// - A zero-quantity row produces an empty, non-split outcome
pub fn allocate_group(
    candidates: &[Candidate],
    rows: &[AllocationRequest],
) -> Vec<AllocationOutcome> {
    let mut cursor = AllocationCursor::new(candidates);
    rows.iter()
        .map(|row| consume_row(candidates, &mut cursor, row))
        .collect()
}

/// Consumes candidates for one row, carrying the cursor forward.
fn consume_row(
    candidates: &[Candidate],
    cursor: &mut AllocationCursor,
    row: &AllocationRequest,
) -> AllocationOutcome {
    let mut need = row.quantity.max(0.0);
    let mut slices: Vec<Allocation> = Vec::new();

    while need > QTY_EPSILON && !cursor.exhausted(candidates) {
        let candidate = &candidates[cursor.index];

        if cursor.remaining >= need {
            // Current candidate can fulfill the row's remaining need
            slices.push(Allocation::from_candidate(candidate, need));
            cursor.remaining -= need;
            need = 0.0;
        } else {
            // Take what's left here, then move on
            if cursor.remaining > QTY_EPSILON {
                slices.push(Allocation::from_candidate(candidate, cursor.remaining));
                need -= cursor.remaining;
            }
            cursor.advance(candidates);
        }
    }

    let allocated_qty = slices.iter().map(|s| s.quantity).sum();
    let mut slices = slices.into_iter();
    AllocationOutcome {
        row_id: row.row_id.clone(),
        requested_qty: row.quantity,
        allocated_qty,
        primary: slices.next(),
        overflow: slices.collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderKey;

    fn candidate(location: &str, qty: f64, creation: i64) -> Candidate {
        Candidate::plain("WH-MAIN", location, qty, OrderKey::at_creation(creation))
    }

    fn row(row_id: &str, qty: f64) -> AllocationRequest {
        AllocationRequest::new(row_id, "WIDGET", "WH-MAIN", qty)
    }

    #[test]
    fn test_single_row_single_location() {
        let candidates = vec![candidate("BIN-A", 10.0, 1)];
        let outcomes = allocate_group(&candidates, &[row("row-1", 4.0)]);

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert!(!outcome.is_split());
        assert_eq!(outcome.allocated_qty, 4.0);
        let primary = outcome.primary.as_ref().unwrap();
        assert_eq!(primary.location, "BIN-A");
        assert_eq!(primary.quantity, 4.0);
    }

    #[test]
    fn test_split_across_two_locations() {
        // Candidates [5, 5], one row requesting 7:
        // primary 5 from the first, overflow 2 from the second
        let candidates = vec![candidate("BIN-A", 5.0, 1), candidate("BIN-B", 5.0, 2)];
        let outcomes = allocate_group(&candidates, &[row("row-1", 7.0)]);

        let outcome = &outcomes[0];
        assert!(outcome.is_split());
        assert_eq!(outcome.primary.as_ref().unwrap().quantity, 5.0);
        assert_eq!(outcome.primary.as_ref().unwrap().location, "BIN-A");
        assert_eq!(outcome.overflow.len(), 1);
        assert_eq!(outcome.overflow[0].quantity, 2.0);
        assert_eq!(outcome.overflow[0].location, "BIN-B");
        assert_eq!(outcome.allocated_qty, 7.0);
    }

    #[test]
    fn test_deficit_without_error() {
        // One candidate of 3 against a request of 10: allocate 3,
        // no overflow, caller-visible deficit of 7
        let candidates = vec![candidate("BIN-A", 3.0, 1)];
        let outcomes = allocate_group(&candidates, &[row("row-1", 10.0)]);

        let outcome = &outcomes[0];
        assert!(!outcome.is_split());
        assert_eq!(outcome.allocated_qty, 3.0);
        assert_eq!(outcome.deficit(), 7.0);
    }

    #[test]
    fn test_cursor_shared_across_rows() {
        // Rows of 4 and 6 against candidates [10]: row 1 gets 4,
        // row 2 gets 6, the candidate is never reused
        let candidates = vec![candidate("BIN-A", 10.0, 1)];
        let outcomes = allocate_group(&candidates, &[row("row-1", 4.0), row("row-2", 6.0)]);

        assert_eq!(outcomes[0].allocated_qty, 4.0);
        assert_eq!(outcomes[1].allocated_qty, 6.0);
        assert!(!outcomes[0].is_split());
        assert!(!outcomes[1].is_split());

        // Third row would find nothing left
        let outcomes = allocate_group(
            &candidates,
            &[row("row-1", 4.0), row("row-2", 6.0), row("row-3", 1.0)],
        );
        assert_eq!(outcomes[2].allocated_qty, 0.0);
        assert!(outcomes[2].primary.is_none());
    }

    #[test]
    fn test_conservation() {
        // Total allocated never exceeds total available, with equality
        // when total requested <= total available
        let candidates = vec![
            candidate("BIN-A", 4.0, 1),
            candidate("BIN-B", 2.5, 2),
            candidate("BIN-C", 3.5, 3),
        ];
        let rows = vec![row("row-1", 6.0), row("row-2", 4.0)];
        let outcomes = allocate_group(&candidates, &rows);

        let total_allocated: f64 = outcomes.iter().map(|o| o.allocated_qty).sum();
        let total_available: f64 = candidates.iter().map(|c| c.available).sum();
        assert!((total_allocated - total_available).abs() < QTY_EPSILON);
        assert!((total_allocated - 10.0).abs() < QTY_EPSILON);
    }

    #[test]
    fn test_no_double_counting() {
        // Per-location consumption across all rows stays within that
        // location's availability
        let candidates = vec![candidate("BIN-A", 5.0, 1), candidate("BIN-B", 5.0, 2)];
        let rows = vec![row("row-1", 3.0), row("row-2", 3.0), row("row-3", 3.0)];
        let outcomes = allocate_group(&candidates, &rows);

        let taken_from = |location: &str| -> f64 {
            outcomes
                .iter()
                .flat_map(|o| o.allocations())
                .filter(|a| a.location == location)
                .map(|a| a.quantity)
                .sum()
        };
        assert!(taken_from("BIN-A") <= 5.0 + QTY_EPSILON);
        assert!(taken_from("BIN-B") <= 5.0 + QTY_EPSILON);
    }

    #[test]
    fn test_zero_quantity_row_is_noop() {
        let candidates = vec![candidate("BIN-A", 5.0, 1)];
        let outcomes = allocate_group(&candidates, &[row("row-1", 0.0), row("row-2", 5.0)]);

        assert!(outcomes[0].primary.is_none());
        assert!(!outcomes[0].is_split());
        assert_eq!(outcomes[0].allocated_qty, 0.0);

        // The zero row consumed nothing - row 2 still gets everything
        assert_eq!(outcomes[1].allocated_qty, 5.0);
    }

    #[test]
    fn test_empty_candidate_list() {
        let outcomes = allocate_group(&[], &[row("row-1", 5.0)]);
        assert_eq!(outcomes[0].allocated_qty, 0.0);
        assert_eq!(outcomes[0].deficit(), 5.0);
    }

    #[test]
    fn test_batch_identity_carried_into_slices() {
        let candidates = vec![Candidate::batch(
            "WH-MAIN",
            "BIN-A",
            "BATCH-001",
            5.0,
            OrderKey::at_creation(1),
            None,
        )];
        let outcomes = allocate_group(&candidates, &[row("row-1", 2.0)]);
        assert_eq!(
            outcomes[0].primary.as_ref().unwrap().batch_no.as_deref(),
            Some("BATCH-001")
        );
    }

    #[test]
    fn test_fractional_quantities_split_cleanly() {
        let candidates = vec![candidate("BIN-A", 1.5, 1), candidate("BIN-B", 2.25, 2)];
        let outcomes = allocate_group(&candidates, &[row("row-1", 2.0), row("row-2", 1.75)]);

        assert!(outcomes[0].is_split());
        assert_eq!(outcomes[0].primary.as_ref().unwrap().quantity, 1.5);
        assert!((outcomes[0].overflow[0].quantity - 0.5).abs() < QTY_EPSILON);
        assert!((outcomes[1].allocated_qty - 1.75).abs() < QTY_EPSILON);
        assert_eq!(outcomes[1].deficit(), 0.0);
    }
}

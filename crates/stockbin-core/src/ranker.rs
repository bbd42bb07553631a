//! # Availability Ranker
//!
//! Turns a raw, unordered set of candidates into a deterministically
//! ordered list per the chosen consumption policy.
//!
//! ## Ranking Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ranking Pipeline                                   │
//! │                                                                         │
//! │  raw candidates (per warehouse pool, unordered)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Drop non-positive quantities  (dropped, not zeroed)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. Drop excluded warehouses      (filter BEFORE ranking, so excluded  │
//! │       │                            quantity never displaces real       │
//! │       │                            candidates from a limited caller)   │
//! │       ▼                                                                 │
//! │  3. Policy sort                   (stable; creation marker ascending   │
//! │       │                            breaks ties regardless of policy)   │
//! │       ▼                                                                 │
//! │  4. Priority partition            (stable: preferred warehouses move   │
//! │       │                            to the front, relative order kept   │
//! │       ▼                            within BOTH partitions)             │
//! │  ranked candidates                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The priority step is a partition, not a re-sort: re-sorting would break
//! the policy ordering inside each partition.

use std::cmp::Ordering;

use crate::types::{Candidate, ConsumptionPolicy, WarehouseExclusion};

/// Ranks candidates for consumption.
///
/// ## Arguments
/// * `candidates` - Raw candidates; may span multiple warehouses (the
///   output is one pool, not segmented by warehouse)
/// * `policy` - Consumption order
/// * `priority_warehouses` - Warehouses to move to the front, stably
/// * `excluded` - Warehouses to drop from candidacy entirely
///
/// ## Determinism
/// The comparator always falls through to the creation marker, which is
/// unique per candidate source row, so two calls with identical input
/// produce identical output.
pub fn rank(
    candidates: Vec<Candidate>,
    policy: ConsumptionPolicy,
    priority_warehouses: Option<&[String]>,
    excluded: Option<&WarehouseExclusion>,
) -> Vec<Candidate> {
    let mut pool: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.available > 0.0)
        .filter(|c| excluded.map_or(true, |ex| !ex.contains(&c.warehouse)))
        .collect();

    // sort_by is stable, so equal keys keep their input order
    pool.sort_by(|a, b| compare_candidates(a, b, policy));

    match priority_warehouses {
        Some(priority) if !priority.is_empty() => {
            let (mut preferred, rest): (Vec<Candidate>, Vec<Candidate>) = pool
                .into_iter()
                .partition(|c| priority.contains(&c.warehouse));
            preferred.extend(rest);
            preferred
        }
        _ => pool,
    }
}

/// Compares two candidates under a consumption policy.
///
/// ## Tie-Break Rule
/// The creation marker ascends regardless of policy. For `NewestFirst`
/// only the posting date/time are reversed; for `SoonestExpiryFirst`
/// candidates without an expiry date sort last among the unexpired.
fn compare_candidates(a: &Candidate, b: &Candidate, policy: ConsumptionPolicy) -> Ordering {
    match policy {
        ConsumptionPolicy::OldestFirst => a.order_key.cmp(&b.order_key),
        ConsumptionPolicy::NewestFirst => b
            .order_key
            .posting_date
            .cmp(&a.order_key.posting_date)
            .then(b.order_key.posting_time.cmp(&a.order_key.posting_time))
            .then(a.order_key.creation.cmp(&b.order_key.creation)),
        ConsumptionPolicy::SoonestExpiryFirst => match (a.expiry, b.expiry) {
            (Some(ea), Some(eb)) => ea
                .cmp(&eb)
                .then(a.order_key.creation.cmp(&b.order_key.creation)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.order_key.creation.cmp(&b.order_key.creation),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

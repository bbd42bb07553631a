//! # Allocation Service
//!
//! The caller-facing surface of StockBin. Composes the pure allocation
//! logic from `stockbin-core` with the repositories in `stockbin-ledger`.
//!
//! ## Dispatch Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                     allocate_mixed_tracking                          │
//! │                                                                      │
//! │  rows ──► group_rows ──► per (item, warehouse) group:                │
//! │                             │                                        │
//! │                             ▼                                        │
//! │                      tracking_flags(item)                            │
//! │                             │                                        │
//! │           ┌─────────────────┼──────────────────┐                     │
//! │           ▼                 ▼                  ▼                     │
//! │        Plain          BatchTracked       SerialTracked               │
//! │     balances()      batch_candidates()  serial_candidates()          │
//! │           │                 │                  │                     │
//! │           └────────► rank ──┴─► allocate_group ┘                     │
//! │                             │                                        │
//! │                             ▼                                        │
//! │              attach batch / serial identities                        │
//! │                             │                                        │
//! │  outcomes ◄── reorder_outcomes (original row order) ◄────────────────┘
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Shape
//! Data conditions (unknown item, nothing in stock, partial fulfillment)
//! produce empty or short outcomes and the call succeeds. Only ledger
//! failures abort the call, as [`crate::error::EngineError::Ledger`].

use std::collections::VecDeque;

use chrono::Utc;
use tracing::debug;

use stockbin_core::{
    allocate_group, group_rows, rank, reorder_outcomes, AllocationOutcome, AllocationRequest,
    Candidate, ConsumptionPolicy, OrderKey, PriorityMap, RowGroup, TrackingDiscipline,
    WarehouseExclusion, QTY_EPSILON,
};
use stockbin_ledger::{Ledger, DEFAULT_STAGING_LOCATION};

use crate::error::EngineResult;

// =============================================================================
// Proposal Types
// =============================================================================

/// One step of a location walk: how much to take from where.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocationProposal {
    /// Location to draw from.
    pub location: String,
    /// Quantity available at the location.
    pub available_qty: f64,
    /// Quantity the walk assigns to the location.
    pub qty_to_take: f64,
}

/// One lookup in a batched default-location resolution.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DefaultLocationRequest {
    /// Item to resolve a location for.
    pub item_code: String,
    /// Warehouse to resolve within.
    pub warehouse: String,
}

impl DefaultLocationRequest {
    /// Creates a lookup entry.
    pub fn new(item_code: impl Into<String>, warehouse: impl Into<String>) -> Self {
        DefaultLocationRequest {
            item_code: item_code.into(),
            warehouse: warehouse.into(),
        }
    }
}

/// Configured staging exclusions, loaded once per call.
#[derive(Debug, Default)]
struct StagingExclusions {
    warehouses: WarehouseExclusion,
    location: Option<String>,
}

/// The serial units sitting at one (warehouse, location), in creation
/// order. Drained as identifiers are handed out so no unit is assigned
/// twice within a call.
#[derive(Debug)]
struct SerialPool {
    warehouse: String,
    location: String,
    creation: i64,
    units: VecDeque<String>,
}

// =============================================================================
// Allocation Service
// =============================================================================

/// Stateless allocation facade over a [`Ledger`] handle.
///
/// Cheap to clone; all state lives in the ledger and in per-call
/// structures. The service never mutates the ledger.
#[derive(Debug, Clone)]
pub struct AllocationService {
    ledger: Ledger,
}

impl AllocationService {
    /// Creates a service over an open ledger.
    pub fn new(ledger: Ledger) -> Self {
        AllocationService { ledger }
    }

    /// Access to the underlying ledger handle.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // =========================================================================
    // Single-Item Walk
    // =========================================================================

    /// Walks the FIFO-ranked locations of one item in one warehouse,
    /// taking `min(available, remaining)` per location until the required
    /// quantity is covered or availability runs out.
    ///
    /// Blank inputs or a non-positive quantity yield an empty walk, not
    /// an error.
    pub async fn resolve_locations_for_item(
        &self,
        item_code: &str,
        warehouse: &str,
        required_qty: f64,
    ) -> EngineResult<Vec<LocationProposal>> {
        if item_code.trim().is_empty()
            || warehouse.trim().is_empty()
            || !required_qty.is_finite()
            || required_qty <= 0.0
        {
            return Ok(Vec::new());
        }

        let balances = self
            .ledger
            .balances()
            .balances(item_code, &[warehouse.to_string()], None)
            .await?;
        let candidates = rank(
            balances.into_iter().map(|b| b.into_candidate()).collect(),
            ConsumptionPolicy::OldestFirst,
            None,
            None,
        );

        let mut remaining = required_qty;
        let mut proposals = Vec::new();
        for candidate in candidates {
            if remaining <= QTY_EPSILON {
                break;
            }
            let take = candidate.available.min(remaining);
            remaining -= take;
            proposals.push(LocationProposal {
                location: candidate.location,
                available_qty: candidate.available,
                qty_to_take: take,
            });
        }

        debug!(
            item = %item_code,
            warehouse = %warehouse,
            steps = proposals.len(),
            shortfall = remaining.max(0.0),
            "Resolved location walk"
        );
        Ok(proposals)
    }

    // =========================================================================
    // Grouped Allocation
    // =========================================================================

    /// Allocates a request list as plain quantities, oldest first, with
    /// no priority or exclusion constraints.
    ///
    /// Rows sharing an (item, warehouse) pair draw from one shared
    /// cursor, so the same stock is never promised twice. Tracking flags
    /// are deliberately not consulted; callers that need batch or serial
    /// identities use [`AllocationService::allocate_mixed_tracking`].
    pub async fn allocate_rows(
        &self,
        rows: &[AllocationRequest],
    ) -> EngineResult<Vec<AllocationOutcome>> {
        let grouped = group_rows(rows);
        let mut indexed = self.skipped_outcomes(rows, &grouped.skipped);

        for group in &grouped.groups {
            let outcomes = self
                .allocate_plain_group(rows, group, ConsumptionPolicy::OldestFirst, None, None)
                .await?;
            collect_group_outcomes(&mut indexed, group, outcomes);
        }

        Ok(reorder_outcomes(indexed))
    }

    /// Full tracking-discipline dispatch.
    ///
    /// Resolves the tracking flags once per item, produces the
    /// discipline-specific candidate set, ranks it under `policy` with
    /// the call-scoped constraints applied, allocates each group through
    /// a shared cursor, and attaches batch and serial identities where
    /// the discipline carries them. Outcomes are indexed identically to
    /// `rows`.
    ///
    /// `priority_map` maps item codes to warehouses to try first; those
    /// warehouses are added to the group's candidate pool and moved to
    /// the front of the ranking, stably. `excluded` warehouses never
    /// contribute candidates at all.
    pub async fn allocate_mixed_tracking(
        &self,
        rows: &[AllocationRequest],
        policy: ConsumptionPolicy,
        priority_map: Option<&PriorityMap>,
        excluded: Option<&WarehouseExclusion>,
    ) -> EngineResult<Vec<AllocationOutcome>> {
        let grouped = group_rows(rows);
        let mut indexed = self.skipped_outcomes(rows, &grouped.skipped);

        for group in &grouped.groups {
            let flags = self
                .ledger
                .master_data()
                .tracking_flags(&group.item_code)
                .await?;
            let discipline = TrackingDiscipline::from_flags(flags);
            debug!(
                item = %group.item_code,
                warehouse = %group.warehouse,
                discipline = ?discipline,
                rows = group.row_indices.len(),
                demand = group.total_quantity(rows),
                "Dispatching allocation group"
            );

            let outcomes = match discipline {
                TrackingDiscipline::Plain => {
                    self.allocate_plain_group(rows, group, policy, priority_map, excluded)
                        .await?
                }
                TrackingDiscipline::BatchTracked => {
                    self.allocate_batch_group(
                        rows,
                        group,
                        policy,
                        priority_map,
                        excluded,
                        flags.has_serial_units,
                    )
                    .await?
                }
                TrackingDiscipline::SerialTracked => {
                    self.allocate_serial_group(rows, group, policy, priority_map, excluded)
                        .await?
                }
            };
            collect_group_outcomes(&mut indexed, group, outcomes);
        }

        Ok(reorder_outcomes(indexed))
    }

    // =========================================================================
    // Default Location Resolution
    // =========================================================================

    /// Resolves the default location for an item in a warehouse.
    ///
    /// Prefers the first FIFO location currently holding stock; when
    /// nothing is in stock, falls back to the most recent location that
    /// ever held the item. The configured staging warehouse and staging
    /// location never qualify.
    pub async fn default_location_for_item(
        &self,
        item_code: &str,
        warehouse: &str,
    ) -> EngineResult<Option<String>> {
        let staging = self.staging_exclusions().await?;
        self.default_location_with(item_code, warehouse, &staging)
            .await
    }

    /// Batched form of [`AllocationService::default_location_for_item`].
    ///
    /// Loads the staging exclusions once and resolves each lookup
    /// independently; results are indexed identically to `requests`.
    pub async fn default_locations_for_items(
        &self,
        requests: &[DefaultLocationRequest],
    ) -> EngineResult<Vec<Option<String>>> {
        let staging = self.staging_exclusions().await?;
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let location = self
                .default_location_with(&request.item_code, &request.warehouse, &staging)
                .await?;
            results.push(location);
        }
        Ok(results)
    }

    // =========================================================================
    // Discipline-Specific Group Allocation
    // =========================================================================

    /// Plain discipline: rank aggregated location balances, allocate.
    async fn allocate_plain_group(
        &self,
        rows: &[AllocationRequest],
        group: &RowGroup,
        policy: ConsumptionPolicy,
        priority_map: Option<&PriorityMap>,
        excluded: Option<&WarehouseExclusion>,
    ) -> EngineResult<Vec<AllocationOutcome>> {
        let priority = group_priority(group, priority_map);
        let pool = warehouse_pool(group, priority);

        let balances = self
            .ledger
            .balances()
            .balances(&group.item_code, &pool, excluded)
            .await?;
        let candidates = rank(
            balances.into_iter().map(|b| b.into_candidate()).collect(),
            policy,
            priority,
            excluded,
        );

        let requests = group_requests(rows, group);
        Ok(allocate_group(&candidates, &requests))
    }

    /// Batch discipline: rank (batch, location) triples, allocate, then
    /// attach the per-slice serial identifiers when the item also
    /// carries serial units.
    async fn allocate_batch_group(
        &self,
        rows: &[AllocationRequest],
        group: &RowGroup,
        policy: ConsumptionPolicy,
        priority_map: Option<&PriorityMap>,
        excluded: Option<&WarehouseExclusion>,
        with_serial_units: bool,
    ) -> EngineResult<Vec<AllocationOutcome>> {
        let priority = group_priority(group, priority_map);
        let pool = warehouse_pool(group, priority);
        let today = Utc::now().date_naive();

        let batches = self
            .ledger
            .batches()
            .batch_candidates(&group.item_code, &pool, excluded, today)
            .await?;
        let candidates = rank(
            batches.into_iter().map(|b| b.into_candidate()).collect(),
            policy,
            priority,
            excluded,
        );

        let requests = group_requests(rows, group);
        let mut outcomes = allocate_group(&candidates, &requests);

        if with_serial_units {
            self.attach_batch_serials(&group.item_code, &mut outcomes)
                .await?;
        }
        Ok(outcomes)
    }

    /// Serial discipline: bucket active units per (warehouse, location),
    /// allocate the whole-unit counts, then hand out the specific unit
    /// identifiers by draining each bucket in creation order.
    async fn allocate_serial_group(
        &self,
        rows: &[AllocationRequest],
        group: &RowGroup,
        policy: ConsumptionPolicy,
        priority_map: Option<&PriorityMap>,
        excluded: Option<&WarehouseExclusion>,
    ) -> EngineResult<Vec<AllocationOutcome>> {
        let priority = group_priority(group, priority_map);
        let pool = warehouse_pool(group, priority);

        let units = self
            .ledger
            .serial_units()
            .serial_candidates(&group.item_code, &pool, excluded)
            .await?;

        let mut pools: Vec<SerialPool> = Vec::new();
        for unit in units {
            match pools
                .iter_mut()
                .find(|p| p.warehouse == unit.warehouse && p.location == unit.location)
            {
                Some(pool) => pool.units.push_back(unit.serial_no),
                None => pools.push(SerialPool {
                    warehouse: unit.warehouse,
                    location: unit.location,
                    creation: unit.creation,
                    units: VecDeque::from([unit.serial_no]),
                }),
            }
        }

        let candidates = rank(
            pools
                .iter()
                .map(|p| {
                    Candidate::plain(
                        p.warehouse.as_str(),
                        p.location.as_str(),
                        p.units.len() as f64,
                        OrderKey::at_creation(p.creation),
                    )
                })
                .collect(),
            policy,
            priority,
            excluded,
        );

        // Serialized demand is whole units; fractional demand truncates.
        let requests: Vec<AllocationRequest> = group
            .row_indices
            .iter()
            .map(|&index| {
                let row = &rows[index];
                AllocationRequest::new(
                    row.row_id.clone(),
                    row.item_code.clone(),
                    row.warehouse.clone(),
                    row.quantity.trunc(),
                )
            })
            .collect();

        let mut outcomes = allocate_group(&candidates, &requests);

        // Restore the original demand so deficits reflect what was asked.
        for (outcome, &index) in outcomes.iter_mut().zip(&group.row_indices) {
            outcome.requested_qty = rows[index].quantity;
        }

        for outcome in &mut outcomes {
            for allocation in outcome.allocations_mut() {
                let Some(pool) = pools.iter_mut().find(|p| {
                    p.warehouse == allocation.warehouse && p.location == allocation.location
                }) else {
                    continue;
                };
                let wanted = (allocation.quantity.round() as usize).min(pool.units.len());
                allocation.serial_nos = pool.units.drain(..wanted).collect();
            }
        }
        Ok(outcomes)
    }

    /// Attaches serial identifiers to batch allocations, fetching each
    /// batch's unit list once and draining it across slices.
    async fn attach_batch_serials(
        &self,
        item_code: &str,
        outcomes: &mut [AllocationOutcome],
    ) -> EngineResult<()> {
        let mut pools: Vec<(String, VecDeque<String>)> = Vec::new();

        for outcome in outcomes.iter_mut() {
            for allocation in outcome.allocations_mut() {
                let Some(batch_no) = allocation.batch_no.clone() else {
                    continue;
                };
                if !pools.iter().any(|(no, _)| *no == batch_no) {
                    let serial_nos = self
                        .ledger
                        .batches()
                        .serial_nos_for_batch(item_code, &batch_no)
                        .await?;
                    pools.push((batch_no.clone(), serial_nos.into()));
                }
                let Some((_, pool)) = pools.iter_mut().find(|(no, _)| *no == batch_no) else {
                    continue;
                };
                // Whole units only; a fractional remainder carries no
                // unit identifiers.
                let wanted = (allocation.quantity.floor() as usize).min(pool.len());
                allocation.serial_nos = pool.drain(..wanted).collect();
            }
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Empty outcomes for rows that bypass allocation.
    fn skipped_outcomes(
        &self,
        rows: &[AllocationRequest],
        skipped: &[usize],
    ) -> Vec<(usize, AllocationOutcome)> {
        skipped
            .iter()
            .map(|&index| {
                let row = &rows[index];
                (
                    index,
                    AllocationOutcome::empty(row.row_id.clone(), row.quantity),
                )
            })
            .collect()
    }

    /// Loads the configured staging warehouse and location, if any.
    async fn staging_exclusions(&self) -> EngineResult<StagingExclusions> {
        let master = self.ledger.master_data();
        let mut staging = StagingExclusions::default();
        if let Some(warehouse) = master.default_staging_warehouse().await? {
            staging.warehouses.insert(warehouse);
        }
        staging.location = master.default_location(DEFAULT_STAGING_LOCATION).await?;
        Ok(staging)
    }

    /// One default-location lookup under preloaded staging exclusions.
    async fn default_location_with(
        &self,
        item_code: &str,
        warehouse: &str,
        staging: &StagingExclusions,
    ) -> EngineResult<Option<String>> {
        if item_code.trim().is_empty() || warehouse.trim().is_empty() {
            return Ok(None);
        }
        let excluded = if staging.warehouses.is_empty() {
            None
        } else {
            Some(&staging.warehouses)
        };

        let balances = self
            .ledger
            .balances()
            .balances(item_code, &[warehouse.to_string()], excluded)
            .await?;
        let stocked = balances
            .into_iter()
            .map(|b| b.location)
            .find(|location| staging.location.as_deref() != Some(location.as_str()));
        if stocked.is_some() {
            return Ok(stocked);
        }

        let historical = self
            .ledger
            .balances()
            .last_location_with_history(item_code, warehouse, excluded)
            .await?;
        Ok(historical.filter(|location| staging.location.as_deref() != Some(location.as_str())))
    }
}

// =============================================================================
// Free Helpers
// =============================================================================

/// The priority warehouses configured for a group's item, if any.
fn group_priority<'a>(
    group: &RowGroup,
    priority_map: Option<&'a PriorityMap>,
) -> Option<&'a [String]> {
    priority_map
        .and_then(|map| map.get(&group.item_code))
        .map(Vec::as_slice)
}

/// The warehouses a group may draw from: its own warehouse plus any
/// priority warehouses for the item.
fn warehouse_pool(group: &RowGroup, priority: Option<&[String]>) -> Vec<String> {
    let mut pool = vec![group.warehouse.clone()];
    if let Some(priority) = priority {
        for warehouse in priority {
            if !pool.contains(warehouse) {
                pool.push(warehouse.clone());
            }
        }
    }
    pool
}

/// Clones a group's rows out of the caller's list, in submission order.
fn group_requests(rows: &[AllocationRequest], group: &RowGroup) -> Vec<AllocationRequest> {
    group
        .row_indices
        .iter()
        .map(|&index| rows[index].clone())
        .collect()
}

/// Records group outcomes against their original row indices.
fn collect_group_outcomes(
    indexed: &mut Vec<(usize, AllocationOutcome)>,
    group: &RowGroup,
    outcomes: Vec<AllocationOutcome>,
) {
    for (&index, outcome) in group.row_indices.iter().zip(outcomes) {
        indexed.push((index, outcome));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use stockbin_core::TrackingFlags;
    use stockbin_ledger::repository::balance::LedgerEntry;
    use stockbin_ledger::repository::batch::Batch;
    use stockbin_ledger::repository::serial::SerialUnit;
    use stockbin_ledger::{Item, Ledger, LedgerConfig, DEFAULT_STAGING_WAREHOUSE};
    use uuid::Uuid;

    async fn test_service() -> AllocationService {
        let ledger = Ledger::new(LedgerConfig::in_memory()).await.unwrap();
        AllocationService::new(ledger)
    }

    async fn seed_item(service: &AllocationService, code: &str, flags: TrackingFlags) {
        service
            .ledger()
            .master_data()
            .upsert_item(&Item {
                item_code: code.to_string(),
                item_name: format!("{code} (test)"),
                has_batch_no: flags.has_batches,
                has_serial_no: flags.has_serial_units,
                disabled: false,
            })
            .await
            .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    async fn receipt(
        service: &AllocationService,
        item: &str,
        warehouse: &str,
        location: &str,
        qty: f64,
        batch_no: Option<&str>,
        serial_no: Option<&str>,
        age_days: i64,
        creation: i64,
    ) {
        let today = Utc::now().date_naive();
        service
            .ledger()
            .balances()
            .record_entry(&LedgerEntry {
                id: Uuid::new_v4().to_string(),
                item_code: item.to_string(),
                warehouse: warehouse.to_string(),
                location: Some(location.to_string()),
                actual_qty: qty,
                posting_date: today - Duration::days(age_days),
                posting_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                creation,
                batch_no: batch_no.map(str::to_string),
                serial_no: serial_no.map(str::to_string),
                voucher_type: Some("Stock Receipt".to_string()),
                voucher_no: Some(format!("SR-{creation:05}")),
                is_cancelled: false,
                docstatus: 1,
            })
            .await
            .unwrap();
    }

    async fn seed_batch(
        service: &AllocationService,
        item: &str,
        batch_no: &str,
        creation: i64,
        expiry_days: Option<i64>,
    ) {
        let today = Utc::now().date_naive();
        service
            .ledger()
            .batches()
            .insert_batch(&Batch {
                batch_no: batch_no.to_string(),
                item_code: item.to_string(),
                creation,
                expiry_date: expiry_days.map(|d| today + Duration::days(d)),
                disabled: false,
            })
            .await
            .unwrap();
    }

    async fn seed_serial_unit(
        service: &AllocationService,
        item: &str,
        serial_no: &str,
        warehouse: &str,
        location: &str,
        batch_no: Option<&str>,
        creation: i64,
    ) {
        service
            .ledger()
            .serial_units()
            .insert_unit(&SerialUnit {
                serial_no: serial_no.to_string(),
                item_code: item.to_string(),
                warehouse: warehouse.to_string(),
                location: location.to_string(),
                batch_no: batch_no.map(str::to_string),
                creation,
            })
            .await
            .unwrap();
    }

    fn row(row_id: &str, item: &str, warehouse: &str, qty: f64) -> AllocationRequest {
        AllocationRequest::new(row_id, item, warehouse, qty)
    }

    #[tokio::test]
    async fn test_resolve_locations_walks_fifo_order() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 5.0, None, None, 10, 1).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-2", 10.0, None, None, 5, 2).await;

        let proposals = service
            .resolve_locations_for_item("WIDGET", "WH-A", 8.0)
            .await
            .unwrap();

        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].location, "BIN-1");
        assert_eq!(proposals[0].qty_to_take, 5.0);
        assert_eq!(proposals[1].location, "BIN-2");
        assert_eq!(proposals[1].qty_to_take, 3.0);
        assert_eq!(proposals[1].available_qty, 10.0);
    }

    #[tokio::test]
    async fn test_resolve_locations_blank_inputs_are_empty() {
        let service = test_service().await;
        assert!(service
            .resolve_locations_for_item("", "WH-A", 5.0)
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .resolve_locations_for_item("WIDGET", "  ", 5.0)
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .resolve_locations_for_item("WIDGET", "WH-A", 0.0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_allocate_rows_shares_cursor_across_group() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 5.0, None, None, 10, 1).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-2", 10.0, None, None, 5, 2).await;

        let rows = vec![
            row("r0", "WIDGET", "WH-A", 4.0),
            row("r1", "WIDGET", "WH-A", 6.0),
        ];
        let outcomes = service.allocate_rows(&rows).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].row_id, "r0");
        assert_eq!(outcomes[0].allocated_qty, 4.0);
        assert!(!outcomes[0].is_split());

        // r1 picks up the 1.0 left in BIN-1 before spilling into BIN-2.
        assert_eq!(outcomes[1].allocated_qty, 6.0);
        assert!(outcomes[1].is_split());
        let slices: Vec<_> = outcomes[1].allocations().collect();
        assert_eq!(slices[0].location, "BIN-1");
        assert_eq!(slices[0].quantity, 1.0);
        assert_eq!(slices[1].location, "BIN-2");
        assert_eq!(slices[1].quantity, 5.0);

        // BIN-1 supplied exactly its 5.0 across both rows.
        let from_bin_1: f64 = outcomes
            .iter()
            .flat_map(|o| o.allocations())
            .filter(|a| a.location == "BIN-1")
            .map(|a| a.quantity)
            .sum();
        assert_eq!(from_bin_1, 5.0);
    }

    #[tokio::test]
    async fn test_invalid_rows_get_empty_outcomes_in_place() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 9.0, None, None, 3, 1).await;

        let rows = vec![
            row("r0", "WIDGET", "WH-A", 2.0),
            row("r1", "", "WH-A", 2.0),
            row("r2", "WIDGET", "WH-A", -1.0),
            row("r3", "WIDGET", "WH-A", 3.0),
        ];
        let outcomes = service.allocate_rows(&rows).await.unwrap();

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].allocated_qty, 2.0);
        assert_eq!(outcomes[1].row_id, "r1");
        assert_eq!(outcomes[1].allocated_qty, 0.0);
        assert_eq!(outcomes[2].row_id, "r2");
        assert!(outcomes[2].primary.is_none());
        assert_eq!(outcomes[3].allocated_qty, 3.0);
    }

    #[tokio::test]
    async fn test_deficit_is_silent() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 5.0, None, None, 3, 1).await;

        let rows = vec![row("r0", "WIDGET", "WH-A", 20.0)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, None)
            .await
            .unwrap();

        assert_eq!(outcomes[0].allocated_qty, 5.0);
        assert_eq!(outcomes[0].deficit(), 15.0);
    }

    #[tokio::test]
    async fn test_unknown_item_allocates_nothing() {
        let service = test_service().await;
        let rows = vec![row("r0", "GHOST", "WH-A", 5.0)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, None)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].allocated_qty, 0.0);
        assert_eq!(outcomes[0].deficit(), 5.0);
    }

    #[tokio::test]
    async fn test_batch_allocation_follows_policy() {
        let service = test_service().await;
        seed_item(
            &service,
            "RESIN",
            TrackingFlags {
                has_batches: true,
                has_serial_units: false,
            },
        )
        .await;
        seed_batch(&service, "RESIN", "B-OLD", 1, Some(90)).await;
        seed_batch(&service, "RESIN", "B-NEW", 2, Some(10)).await;
        receipt(&service, "RESIN", "WH-A", "RACK-1", 5.0, Some("B-OLD"), None, 20, 3).await;
        receipt(&service, "RESIN", "WH-A", "RACK-1", 10.0, Some("B-NEW"), None, 5, 4).await;

        let rows = vec![row("r0", "RESIN", "WH-A", 7.0)];

        // OldestFirst consumes the older batch before the newer one.
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, None)
            .await
            .unwrap();
        let slices: Vec<_> = outcomes[0].allocations().collect();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].batch_no.as_deref(), Some("B-OLD"));
        assert_eq!(slices[0].quantity, 5.0);
        assert_eq!(slices[1].batch_no.as_deref(), Some("B-NEW"));
        assert_eq!(slices[1].quantity, 2.0);

        // SoonestExpiryFirst flips the order: B-NEW expires sooner.
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::SoonestExpiryFirst, None, None)
            .await
            .unwrap();
        let slices: Vec<_> = outcomes[0].allocations().collect();
        assert_eq!(slices[0].batch_no.as_deref(), Some("B-NEW"));
        assert_eq!(slices[0].quantity, 7.0);
    }

    #[tokio::test]
    async fn test_serial_allocation_assigns_unique_units() {
        let service = test_service().await;
        seed_item(
            &service,
            "PUMP",
            TrackingFlags {
                has_batches: false,
                has_serial_units: true,
            },
        )
        .await;
        for n in 1..=3 {
            let serial_no = format!("PMP-{n:03}");
            seed_serial_unit(&service, "PUMP", &serial_no, "WH-A", "BIN-1", None, n).await;
            receipt(&service, "PUMP", "WH-A", "BIN-1", 1.0, None, Some(&serial_no), 10, 10 + n).await;
        }
        for n in 4..=5 {
            let serial_no = format!("PMP-{n:03}");
            seed_serial_unit(&service, "PUMP", &serial_no, "WH-A", "BIN-2", None, n).await;
            receipt(&service, "PUMP", "WH-A", "BIN-2", 1.0, None, Some(&serial_no), 5, 10 + n).await;
        }

        let rows = vec![row("r0", "PUMP", "WH-A", 4.0)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, None)
            .await
            .unwrap();

        assert_eq!(outcomes[0].allocated_qty, 4.0);
        let slices: Vec<_> = outcomes[0].allocations().collect();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].location, "BIN-1");
        assert_eq!(
            slices[0].serial_nos,
            vec!["PMP-001", "PMP-002", "PMP-003"]
        );
        assert_eq!(slices[1].location, "BIN-2");
        assert_eq!(slices[1].serial_nos, vec!["PMP-004"]);

        // No unit appears twice.
        let mut all: Vec<_> = outcomes[0]
            .allocations()
            .flat_map(|a| a.serial_nos.iter())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_serial_demand_truncates_to_whole_units() {
        let service = test_service().await;
        seed_item(
            &service,
            "PUMP",
            TrackingFlags {
                has_batches: false,
                has_serial_units: true,
            },
        )
        .await;
        for n in 1..=3 {
            let serial_no = format!("PMP-{n:03}");
            seed_serial_unit(&service, "PUMP", &serial_no, "WH-A", "BIN-1", None, n).await;
            receipt(&service, "PUMP", "WH-A", "BIN-1", 1.0, None, Some(&serial_no), 5, 10 + n).await;
        }

        let rows = vec![row("r0", "PUMP", "WH-A", 2.5)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, None)
            .await
            .unwrap();

        assert_eq!(outcomes[0].requested_qty, 2.5);
        assert_eq!(outcomes[0].allocated_qty, 2.0);
        let slices: Vec<_> = outcomes[0].allocations().collect();
        assert_eq!(slices[0].serial_nos.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_and_serial_item_carries_both_identities() {
        let service = test_service().await;
        seed_item(
            &service,
            "VALVE",
            TrackingFlags {
                has_batches: true,
                has_serial_units: true,
            },
        )
        .await;
        seed_batch(&service, "VALVE", "VB-1", 1, None).await;
        for n in 1..=3 {
            let serial_no = format!("VLV-{n:03}");
            seed_serial_unit(&service, "VALVE", &serial_no, "WH-A", "RACK-1", Some("VB-1"), n)
                .await;
            receipt(
                &service,
                "VALVE",
                "WH-A",
                "RACK-1",
                1.0,
                Some("VB-1"),
                Some(&serial_no),
                4,
                10 + n,
            )
            .await;
        }

        let rows = vec![row("r0", "VALVE", "WH-A", 2.0)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, None)
            .await
            .unwrap();

        assert_eq!(outcomes[0].allocated_qty, 2.0);
        let slice = outcomes[0].primary.as_ref().unwrap();
        assert_eq!(slice.batch_no.as_deref(), Some("VB-1"));
        assert_eq!(slice.serial_nos, vec!["VLV-001", "VLV-002"]);
    }

    #[tokio::test]
    async fn test_priority_warehouse_is_tried_first() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 10.0, None, None, 10, 1).await;
        receipt(&service, "WIDGET", "WH-B", "BIN-9", 10.0, None, None, 5, 2).await;

        let mut priority = PriorityMap::new();
        priority.insert("WIDGET".to_string(), vec!["WH-B".to_string()]);

        let rows = vec![row("r0", "WIDGET", "WH-A", 4.0)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, Some(&priority), None)
            .await
            .unwrap();

        // WH-B is newer but preferred, so it supplies the row.
        let slice = outcomes[0].primary.as_ref().unwrap();
        assert_eq!(slice.warehouse, "WH-B");
        assert_eq!(slice.location, "BIN-9");
    }

    #[tokio::test]
    async fn test_excluded_warehouse_never_supplies() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 10.0, None, None, 5, 1).await;

        let mut excluded = WarehouseExclusion::new();
        excluded.insert("WH-A".to_string());

        let rows = vec![row("r0", "WIDGET", "WH-A", 4.0)];
        let outcomes = service
            .allocate_mixed_tracking(&rows, ConsumptionPolicy::OldestFirst, None, Some(&excluded))
            .await
            .unwrap();

        assert_eq!(outcomes[0].allocated_qty, 0.0);
        assert_eq!(outcomes[0].deficit(), 4.0);
    }

    #[tokio::test]
    async fn test_default_location_prefers_stock_then_history() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;

        // Stocked: the oldest location with a positive balance wins.
        receipt(&service, "WIDGET", "WH-A", "BIN-2", 5.0, None, None, 3, 2).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 5.0, None, None, 10, 1).await;
        let location = service
            .default_location_for_item("WIDGET", "WH-A")
            .await
            .unwrap();
        assert_eq!(location.as_deref(), Some("BIN-1"));

        // Zeroed out: fall back to the most recent location with history.
        seed_item(&service, "GEAR", TrackingFlags::default()).await;
        receipt(&service, "GEAR", "WH-A", "BIN-7", 5.0, None, None, 10, 3).await;
        receipt(&service, "GEAR", "WH-A", "BIN-7", -5.0, None, None, 2, 4).await;
        let location = service
            .default_location_for_item("GEAR", "WH-A")
            .await
            .unwrap();
        assert_eq!(location.as_deref(), Some("BIN-7"));

        // Nothing anywhere.
        let location = service
            .default_location_for_item("GHOST", "WH-A")
            .await
            .unwrap();
        assert!(location.is_none());
    }

    #[tokio::test]
    async fn test_default_location_skips_staging_warehouse() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        service
            .ledger()
            .master_data()
            .set_setting(DEFAULT_STAGING_WAREHOUSE, "WH-STAGING")
            .await
            .unwrap();
        receipt(&service, "WIDGET", "WH-STAGING", "DOCK-1", 50.0, None, None, 20, 1).await;

        let location = service
            .default_location_for_item("WIDGET", "WH-STAGING")
            .await
            .unwrap();
        assert!(location.is_none());
    }

    #[tokio::test]
    async fn test_default_locations_batched_preserves_order() {
        let service = test_service().await;
        seed_item(&service, "WIDGET", TrackingFlags::default()).await;
        receipt(&service, "WIDGET", "WH-A", "BIN-1", 5.0, None, None, 3, 1).await;

        let requests = vec![
            DefaultLocationRequest::new("WIDGET", "WH-A"),
            DefaultLocationRequest::new("GHOST", "WH-A"),
            DefaultLocationRequest::new("", "WH-A"),
        ];
        let results = service
            .default_locations_for_items(&requests)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_deref(), Some("BIN-1"));
        assert!(results[1].is_none());
        assert!(results[2].is_none());
    }
}

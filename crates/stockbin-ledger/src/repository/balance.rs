//! # Balance Repository
//!
//! Per-location balance aggregation over the stock ledger.
//!
//! ## The Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              How Location Balances Are Computed                         │
//! │                                                                         │
//! │  stock_ledger_entries (signed movements)                               │
//! │    WIDGET  WH-MAIN  BIN-A1  +10   2026-01-05  creation=101             │
//! │    WIDGET  WH-MAIN  BIN-A1   -4   2026-01-08  creation=109             │
//! │    WIDGET  WH-MAIN  BIN-B2   +5   2026-01-07  creation=105             │
//! │       │                                                                 │
//! │       ▼  GROUP BY (warehouse, location), SUM(actual_qty)               │
//! │                                                                         │
//! │    BIN-A1: 6   earliest 2026-01-05, creation 101                       │
//! │    BIN-B2: 5   earliest 2026-01-07, creation 105                       │
//! │       │                                                                 │
//! │       ▼  HAVING available_qty > 0 (zero/negative never appear)         │
//! │                                                                         │
//! │  Only finalized, non-cancelled entries participate, and only rows      │
//! │  that actually carry a location.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveTime};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::LedgerResult;
use stockbin_core::{Candidate, OrderKey, WarehouseExclusion};

// =============================================================================
// Row Types
// =============================================================================

/// One aggregated per-location balance, annotated with the earliest
/// contributing transaction for ordering.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LocationBalance {
    pub warehouse: String,
    pub location: String,
    /// Net quantity at the location. Always positive in query results.
    pub available_qty: f64,
    /// Earliest posting date among contributing entries.
    pub posting_date: NaiveDate,
    /// Earliest posting time among contributing entries.
    pub posting_time: NaiveTime,
    /// Earliest creation marker among contributing entries.
    pub creation: i64,
}

impl LocationBalance {
    /// Converts the balance into an allocation candidate.
    pub fn into_candidate(self) -> Candidate {
        Candidate::plain(
            self.warehouse,
            self.location,
            self.available_qty,
            OrderKey::new(self.posting_date, self.posting_time, self.creation),
        )
    }
}

/// A single ledger movement, as written by receiving/issuing documents.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: String,
    pub item_code: String,
    pub warehouse: String,
    pub location: Option<String>,
    /// Signed movement: positive for receipts, negative for issues.
    pub actual_qty: f64,
    pub posting_date: NaiveDate,
    pub posting_time: NaiveTime,
    /// Monotonically increasing marker, unique per entry.
    pub creation: i64,
    pub batch_no: Option<String>,
    pub serial_no: Option<String>,
    pub voucher_type: Option<String>,
    pub voucher_no: Option<String>,
    pub is_cancelled: bool,
    /// 0 = draft, 1 = finalized, 2 = cancelled.
    pub docstatus: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for balance aggregation queries.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    pool: SqlitePool,
}

impl BalanceRepository {
    /// Creates a new BalanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BalanceRepository { pool }
    }

    /// Returns positive per-location balances of an item across the given
    /// warehouses, ordered oldest-first by earliest contributing entry.
    ///
    /// ## Filters
    /// - Only finalized (`docstatus < 2`), non-cancelled entries
    /// - Only entries carrying a location
    /// - `excluded` warehouses are filtered in SQL, before any ranking,
    ///   so excluded quantity never displaces real candidates
    ///
    /// ## Arguments
    /// * `item_code` - Item to aggregate
    /// * `warehouses` - Warehouse pool; empty means all warehouses
    /// * `excluded` - Warehouses to drop from candidacy
    pub async fn balances(
        &self,
        item_code: &str,
        warehouses: &[String],
        excluded: Option<&WarehouseExclusion>,
    ) -> LedgerResult<Vec<LocationBalance>> {
        debug!(item = %item_code, warehouses = warehouses.len(), "Aggregating location balances");

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT \
                sle.warehouse, \
                sle.location, \
                SUM(sle.actual_qty) AS available_qty, \
                MIN(sle.posting_date) AS posting_date, \
                MIN(sle.posting_time) AS posting_time, \
                MIN(sle.creation) AS creation \
             FROM stock_ledger_entries sle \
             WHERE sle.item_code = ",
        );
        query.push_bind(item_code);
        query.push(
            " AND sle.location IS NOT NULL \
              AND sle.location != '' \
              AND sle.is_cancelled = 0 \
              AND sle.docstatus < 2",
        );
        push_warehouse_filters(&mut query, warehouses, excluded);
        query.push(
            " GROUP BY sle.warehouse, sle.location \
              HAVING available_qty > 0 \
              ORDER BY MIN(sle.posting_date), MIN(sle.posting_time), MIN(sle.creation)",
        );

        let balances = query
            .build_query_as::<LocationBalance>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = balances.len(), "Balance aggregation returned rows");
        Ok(balances)
    }

    /// Returns the most recent location that ever held the item in the
    /// warehouse, regardless of current balance.
    ///
    /// Fallback for default-location resolution: when nothing is in stock,
    /// the last place stock existed is still the best guess.
    pub async fn last_location_with_history(
        &self,
        item_code: &str,
        warehouse: &str,
        excluded: Option<&WarehouseExclusion>,
    ) -> LedgerResult<Option<String>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT sle.location \
             FROM stock_ledger_entries sle \
             WHERE sle.item_code = ",
        );
        query.push_bind(item_code);
        query.push(" AND sle.warehouse = ");
        query.push_bind(warehouse);
        query.push(
            " AND sle.location IS NOT NULL \
              AND sle.location != '' \
              AND sle.is_cancelled = 0 \
              AND sle.docstatus < 2",
        );
        push_warehouse_filters(&mut query, &[], excluded);
        query.push(
            " ORDER BY sle.posting_date DESC, sle.posting_time DESC, sle.creation DESC \
              LIMIT 1",
        );

        let location = query
            .build_query_scalar::<String>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(location)
    }

    /// Records a ledger movement.
    ///
    /// Used by seeding and tests; document posting flows own this in
    /// production and the allocator itself never writes.
    pub async fn record_entry(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO stock_ledger_entries ( \
                id, item_code, warehouse, location, actual_qty, \
                posting_date, posting_time, creation, batch_no, serial_no, \
                voucher_type, voucher_no, is_cancelled, docstatus \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&entry.id)
        .bind(&entry.item_code)
        .bind(&entry.warehouse)
        .bind(&entry.location)
        .bind(entry.actual_qty)
        .bind(entry.posting_date)
        .bind(entry.posting_time)
        .bind(entry.creation)
        .bind(&entry.batch_no)
        .bind(&entry.serial_no)
        .bind(&entry.voucher_type)
        .bind(&entry.voucher_no)
        .bind(entry.is_cancelled)
        .bind(entry.docstatus)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Appends `warehouse IN (...)` and `warehouse NOT IN (...)` clauses.
pub(crate) fn push_warehouse_filters(
    query: &mut QueryBuilder<'_, Sqlite>,
    warehouses: &[String],
    excluded: Option<&WarehouseExclusion>,
) {
    if !warehouses.is_empty() {
        query.push(" AND sle.warehouse IN (");
        {
            let mut separated = query.separated(", ");
            for warehouse in warehouses {
                separated.push_bind(warehouse.clone());
            }
        }
        query.push(")");
    }

    if let Some(excluded) = excluded {
        if !excluded.is_empty() {
            query.push(" AND sle.warehouse NOT IN (");
            {
                let mut separated = query.separated(", ");
                for warehouse in excluded {
                    separated.push_bind(warehouse.clone());
                }
            }
            query.push(")");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

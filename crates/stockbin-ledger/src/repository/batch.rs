//! # Batch Repository
//!
//! Lot candidates for batch-tracked items.
//!
//! ## Batches Are The Allocatable Unit
//! For a batch-tracked item the allocator consumes (batch, location)
//! slices, not raw ledger rows: the ordering key comes from the batch
//! itself (creation or expiry), while the location attached to a batch
//! slice still comes from the ledger. Disabled batches and batches past
//! their expiry are excluded outright - they are not candidates at all,
//! not candidates ranked last.

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::LedgerResult;
use crate::repository::balance::push_warehouse_filters;
use stockbin_core::{Candidate, OrderKey, WarehouseExclusion};

// =============================================================================
// Row Types
// =============================================================================

/// One (batch, warehouse, location) candidate triple with a positive
/// net quantity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BatchCandidate {
    pub batch_no: String,
    pub warehouse: String,
    pub location: String,
    pub available_qty: f64,
    /// The batch's own creation marker (not the ledger entry's).
    pub creation: i64,
    /// None means the batch never expires.
    pub expiry_date: Option<NaiveDate>,
}

impl BatchCandidate {
    /// Converts the triple into an allocation candidate.
    pub fn into_candidate(self) -> Candidate {
        Candidate::batch(
            self.warehouse,
            self.location,
            self.batch_no,
            self.available_qty,
            OrderKey::at_creation(self.creation),
            self.expiry_date,
        )
    }
}

/// A batch master record.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Batch {
    pub batch_no: String,
    pub item_code: String,
    pub creation: i64,
    pub expiry_date: Option<NaiveDate>,
    pub disabled: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for batch candidate queries.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Returns (batch, warehouse, location) candidates for an item.
    ///
    /// ## Filters
    /// - Disabled batches are skipped
    /// - Batches expired as of `today` are skipped (indefinite-expiry
    ///   batches stay in)
    /// - Ledger filters match the balance aggregation: finalized,
    ///   non-cancelled, location-carrying entries only
    ///
    /// ## Arguments
    /// * `item_code` - Item to search
    /// * `warehouses` - Warehouse pool; empty means all warehouses
    /// * `excluded` - Warehouses to drop from candidacy
    /// * `today` - Expiry reference date, supplied by the caller so the
    ///   query itself stays deterministic
    pub async fn batch_candidates(
        &self,
        item_code: &str,
        warehouses: &[String],
        excluded: Option<&WarehouseExclusion>,
        today: NaiveDate,
    ) -> LedgerResult<Vec<BatchCandidate>> {
        debug!(item = %item_code, "Fetching batch candidates");

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT \
                b.batch_no, \
                sle.warehouse, \
                sle.location, \
                SUM(sle.actual_qty) AS available_qty, \
                b.creation AS creation, \
                b.expiry_date AS expiry_date \
             FROM stock_ledger_entries sle \
             INNER JOIN batches b ON b.batch_no = sle.batch_no \
             WHERE sle.item_code = ",
        );
        query.push_bind(item_code);
        query.push(
            " AND b.disabled = 0 \
              AND (b.expiry_date IS NULL OR b.expiry_date >= ",
        );
        query.push_bind(today);
        query.push(
            ") AND sle.location IS NOT NULL \
              AND sle.location != '' \
              AND sle.is_cancelled = 0 \
              AND sle.docstatus < 2",
        );
        push_warehouse_filters(&mut query, warehouses, excluded);
        query.push(
            " GROUP BY b.batch_no, sle.warehouse, sle.location \
              HAVING available_qty > 0 \
              ORDER BY b.creation, sle.warehouse, sle.location",
        );

        let candidates = query
            .build_query_as::<BatchCandidate>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = candidates.len(), "Batch candidate query returned rows");
        Ok(candidates)
    }

    /// Returns the serial numbers belonging to a batch, in creation order.
    ///
    /// Used for the nested serial lookup when an item is both batch- and
    /// serial-tracked: once a batch is chosen, the specific unit
    /// identifiers come from here, bounded by the quantity taken.
    pub async fn serial_nos_for_batch(
        &self,
        item_code: &str,
        batch_no: &str,
    ) -> LedgerResult<Vec<String>> {
        let serial_nos = sqlx::query_scalar::<_, String>(
            "SELECT serial_no FROM serial_units \
             WHERE item_code = ?1 \
               AND batch_no = ?2 \
               AND status = 'active' \
               AND warehouse IS NOT NULL \
               AND warehouse != '' \
             ORDER BY creation",
        )
        .bind(item_code)
        .bind(batch_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(serial_nos)
    }

    /// Inserts a batch master record.
    ///
    /// Used by seeding and tests.
    pub async fn insert_batch(&self, batch: &Batch) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO batches (batch_no, item_code, creation, expiry_date, disabled) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&batch.batch_no)
        .bind(&batch.item_code)
        .bind(batch.creation)
        .bind(batch.expiry_date)
        .bind(batch.disabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

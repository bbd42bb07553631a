//! # Serial Unit Repository
//!
//! Individually identified units for serial-tracked items.
//!
//! ## Units Are Discrete
//! A serial-tracked item is allocated by counting units, not by summing
//! quantity. The query returns every in-stock unit (full fetch, so the
//! caller can reorder before bounding to demand); grouping units into
//! per-location counts happens in the engine, against the unit's location
//! at time of last movement.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::LedgerResult;
use stockbin_core::WarehouseExclusion;

// =============================================================================
// Row Types
// =============================================================================

/// One in-stock serialized unit.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SerialUnit {
    pub serial_no: String,
    pub item_code: String,
    /// Warehouse at time of last movement.
    pub warehouse: String,
    /// Location at time of last movement.
    pub location: String,
    /// Batch the unit belongs to, if the item is also batch-tracked.
    pub batch_no: Option<String>,
    /// The unit's own creation marker.
    pub creation: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for serial unit queries.
#[derive(Debug, Clone)]
pub struct SerialRepository {
    pool: SqlitePool,
}

impl SerialRepository {
    /// Creates a new SerialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SerialRepository { pool }
    }

    /// Returns every active unit of an item currently assigned to a
    /// non-empty warehouse, in creation order.
    ///
    /// ## Arguments
    /// * `item_code` - Item to search
    /// * `warehouses` - Warehouse pool; empty means all warehouses
    /// * `excluded` - Warehouses to drop from candidacy
    pub async fn serial_candidates(
        &self,
        item_code: &str,
        warehouses: &[String],
        excluded: Option<&WarehouseExclusion>,
    ) -> LedgerResult<Vec<SerialUnit>> {
        debug!(item = %item_code, "Fetching serial candidates");

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT su.serial_no, su.item_code, su.warehouse, su.location, \
                    su.batch_no, su.creation \
             FROM serial_units su \
             WHERE su.item_code = ",
        );
        query.push_bind(item_code);
        query.push(
            " AND su.status = 'active' \
              AND su.warehouse IS NOT NULL \
              AND su.warehouse != '' \
              AND su.location IS NOT NULL \
              AND su.location != ''",
        );

        if !warehouses.is_empty() {
            query.push(" AND su.warehouse IN (");
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
                query.push(" AND su.warehouse NOT IN (");
                {
                    let mut separated = query.separated(", ");
                    for warehouse in excluded {
                        separated.push_bind(warehouse.clone());
                    }
                }
                query.push(")");
            }
        }

        query.push(" ORDER BY su.creation");

        let units = query
            .build_query_as::<SerialUnit>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = units.len(), "Serial candidate query returned rows");
        Ok(units)
    }

    /// Returns the last known location of a specific unit within a
    /// warehouse, or None when the unit is not there.
    pub async fn latest_location(
        &self,
        item_code: &str,
        warehouse: &str,
        serial_no: &str,
    ) -> LedgerResult<Option<String>> {
        let location = sqlx::query_scalar::<_, String>(
            "SELECT location FROM serial_units \
             WHERE item_code = ?1 \
               AND warehouse = ?2 \
               AND serial_no = ?3 \
               AND location IS NOT NULL \
               AND location != ''",
        )
        .bind(item_code)
        .bind(warehouse)
        .bind(serial_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Inserts a serial unit record.
    ///
    /// Used by seeding and tests.
    pub async fn insert_unit(&self, unit: &SerialUnit) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO serial_units \
                (serial_no, item_code, warehouse, location, batch_no, creation, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active')",
        )
        .bind(&unit.serial_no)
        .bind(&unit.item_code)
        .bind(&unit.warehouse)
        .bind(&unit.location)
        .bind(&unit.batch_no)
        .bind(unit.creation)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Marks a unit as no longer allocatable (scrapped, sold, ...).
    ///
    /// Used by tests to verify inactive units never surface.
    pub async fn retire_unit(&self, serial_no: &str) -> LedgerResult<()> {
        sqlx::query("UPDATE serial_units SET status = 'retired' WHERE serial_no = ?1")
            .bind(serial_no)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Ledger, LedgerConfig};

    fn unit(serial_no: &str, warehouse: &str, location: &str, creation: i64) -> SerialUnit {
        SerialUnit {
            serial_no: serial_no.to_string(),
            item_code: "PUMP".to_string(),
            warehouse: warehouse.to_string(),
            location: location.to_string(),
            batch_no: None,
            creation,
        }
    }

    #[tokio::test]
    async fn test_serial_candidates_in_creation_order() {
        let ledger = Ledger::new(LedgerConfig::in_memory()).await.unwrap();
        let repo = ledger.serial_units();

        repo.insert_unit(&unit("SN-003", "WH-MAIN", "BIN-A", 3)).await.unwrap();
        repo.insert_unit(&unit("SN-001", "WH-MAIN", "BIN-A", 1)).await.unwrap();
        repo.insert_unit(&unit("SN-002", "WH-MAIN", "BIN-B", 2)).await.unwrap();

        let units = repo.serial_candidates("PUMP", &[], None).await.unwrap();
        let serials: Vec<&str> = units.iter().map(|u| u.serial_no.as_str()).collect();
        assert_eq!(serials, vec!["SN-001", "SN-002", "SN-003"]);
    }

    #[tokio::test]
    async fn test_retired_units_never_surface() {
        let ledger = Ledger::new(LedgerConfig::in_memory()).await.unwrap();
        let repo = ledger.serial_units();

        repo.insert_unit(&unit("SN-001", "WH-MAIN", "BIN-A", 1)).await.unwrap();
        repo.insert_unit(&unit("SN-002", "WH-MAIN", "BIN-A", 2)).await.unwrap();
        repo.retire_unit("SN-001").await.unwrap();

        let units = repo.serial_candidates("PUMP", &[], None).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].serial_no, "SN-002");
    }

    #[tokio::test]
    async fn test_warehouse_pool_and_exclusion() {
        let ledger = Ledger::new(LedgerConfig::in_memory()).await.unwrap();
        let repo = ledger.serial_units();

        repo.insert_unit(&unit("SN-001", "WH-MAIN", "BIN-A", 1)).await.unwrap();
        repo.insert_unit(&unit("SN-002", "WH-STAGING", "STAGE", 2)).await.unwrap();

        let excluded: WarehouseExclusion = ["WH-STAGING".to_string()].into_iter().collect();
        let units = repo.serial_candidates("PUMP", &[], Some(&excluded)).await.unwrap();
        assert_eq!(units.len(), 1);

        let pooled = repo
            .serial_candidates("PUMP", &["WH-STAGING".to_string()], None)
            .await
            .unwrap();
        assert_eq!(pooled.len(), 1);
        assert_eq!(pooled[0].serial_no, "SN-002");
    }

    #[tokio::test]
    async fn test_latest_location() {
        let ledger = Ledger::new(LedgerConfig::in_memory()).await.unwrap();
        let repo = ledger.serial_units();

        repo.insert_unit(&unit("SN-001", "WH-MAIN", "BIN-A", 1)).await.unwrap();

        let found = repo.latest_location("PUMP", "WH-MAIN", "SN-001").await.unwrap();
        assert_eq!(found.as_deref(), Some("BIN-A"));

        let absent = repo.latest_location("PUMP", "WH-OTHER", "SN-001").await.unwrap();
        assert!(absent.is_none());
    }
}

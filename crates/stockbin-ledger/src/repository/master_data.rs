//! # Master Data Repository
//!
//! Item tracking flags and single-value settings.
//!
//! ## Why Unknown Items Resolve To Plain
//! `tracking_flags` for an item without a master record returns default
//! (plain) flags rather than an error: the balance query for such an item
//! comes back empty, so its rows end with empty outcomes - the same
//! no-availability path every other unfulfillable row takes. Only a
//! failed query is a hard error.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::LedgerResult;
use stockbin_core::TrackingFlags;

/// Setting name for the warehouse that allocation should never draw from.
pub const DEFAULT_STAGING_WAREHOUSE: &str = "default_staging_warehouse";

/// Setting name for the default staging location used by document flows.
pub const DEFAULT_STAGING_LOCATION: &str = "default_staging_location";

// =============================================================================
// Row Types
// =============================================================================

/// An item master record.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Item {
    pub item_code: String,
    pub item_name: String,
    pub has_batch_no: bool,
    pub has_serial_no: bool,
    pub disabled: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item master data and settings.
#[derive(Debug, Clone)]
pub struct MasterDataRepository {
    pool: SqlitePool,
}

impl MasterDataRepository {
    /// Creates a new MasterDataRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MasterDataRepository { pool }
    }

    /// Resolves the tracking flags for an item.
    ///
    /// Returns default (plain) flags for unknown or disabled items.
    pub async fn tracking_flags(&self, item_code: &str) -> LedgerResult<TrackingFlags> {
        let item = self.get_item(item_code).await?;

        Ok(match item {
            Some(item) if !item.disabled => TrackingFlags {
                has_batches: item.has_batch_no,
                has_serial_units: item.has_serial_no,
            },
            _ => TrackingFlags::default(),
        })
    }

    /// Gets an item master record.
    pub async fn get_item(&self, item_code: &str) -> LedgerResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT item_code, item_name, has_batch_no, has_serial_no, disabled \
             FROM items WHERE item_code = ?1",
        )
        .bind(item_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Reads a single-value setting, e.g. the default staging warehouse.
    pub async fn default_location(&self, name: &str) -> LedgerResult<Option<String>> {
        let value = sqlx::query_scalar::<_, Option<String>>(
            "SELECT value FROM settings WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.flatten().filter(|v| !v.is_empty()))
    }

    /// Convenience accessor for the staging warehouse setting.
    pub async fn default_staging_warehouse(&self) -> LedgerResult<Option<String>> {
        self.default_location(DEFAULT_STAGING_WAREHOUSE).await
    }

    /// Inserts or replaces an item master record.
    ///
    /// Used by seeding and tests.
    pub async fn upsert_item(&self, item: &Item) -> LedgerResult<()> {
        debug!(item = %item.item_code, "Upserting item");

        sqlx::query(
            "INSERT OR REPLACE INTO items \
                (item_code, item_name, has_batch_no, has_serial_no, disabled) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&item.item_code)
        .bind(&item.item_name)
        .bind(item.has_batch_no)
        .bind(item.has_serial_no)
        .bind(item.disabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a single-value setting.
    ///
    /// Used by seeding and tests.
    pub async fn set_setting(&self, name: &str, value: &str) -> LedgerResult<()> {
        sqlx::query("INSERT OR REPLACE INTO settings (name, value) VALUES (?1, ?2)")
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

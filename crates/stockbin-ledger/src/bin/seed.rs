//! # Seed Data Generator
//!
//! Populates the ledger with demo items, stock entries, batches, and serial
//! units for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p stockbin-ledger --bin seed
//!
//! # Specify database path
//! cargo run -p stockbin-ledger --bin seed -- --db ./data/stockbin.db
//! ```
//!
//! ## Generated Data
//! Creates one item per tracking discipline, with ledger history spread
//! across three warehouses and several storage locations:
//! - `WIDGET` - plain item, no batch or serial tracking
//! - `RESIN` - batch-tracked, with one near-expiry batch
//! - `PUMP` - serial-tracked units
//! - `VALVE` - batch-tracked units that also carry serial numbers
//!
//! Warehouses: `WH-MAIN`, `WH-OVERFLOW`, and `WH-STAGING` (the staging
//! warehouse is registered as the default exclusion in settings).

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use std::env;
use stockbin_ledger::repository::balance::LedgerEntry;
use stockbin_ledger::repository::batch::Batch;
use stockbin_ledger::repository::serial::SerialUnit;
use stockbin_ledger::{Item, Ledger, LedgerConfig, DEFAULT_STAGING_WAREHOUSE};
use uuid::Uuid;

const WAREHOUSES: &[&str] = &["WH-MAIN", "WH-OVERFLOW"];
const STAGING_WAREHOUSE: &str = "WH-STAGING";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockbin_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StockBin Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockbin_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 StockBin Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = LedgerConfig::new(&db_path);
    let ledger = Ledger::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check for existing data
    if ledger.master_data().get_item("WIDGET").await?.is_some() {
        println!("⚠ Database already seeded.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let mut creation: i64 = 1;

    // ---- Items -------------------------------------------------------------

    let items: &[(&str, &str, bool, bool)] = &[
        ("WIDGET", "Widget, plain stock", false, false),
        ("RESIN", "Epoxy resin, batch tracked", true, false),
        ("PUMP", "Hydraulic pump, serialized", false, true),
        ("VALVE", "Control valve, batch + serial", true, true),
    ];

    for (code, name, has_batch_no, has_serial_no) in items {
        ledger
            .master_data()
            .upsert_item(&Item {
                item_code: code.to_string(),
                item_name: name.to_string(),
                has_batch_no: *has_batch_no,
                has_serial_no: *has_serial_no,
                disabled: false,
            })
            .await?;
    }
    println!("✓ Inserted {} items", items.len());

    // Staging warehouse is excluded from default-location resolution.
    ledger
        .master_data()
        .set_setting(DEFAULT_STAGING_WAREHOUSE, STAGING_WAREHOUSE)
        .await?;
    println!("✓ Registered staging warehouse: {}", STAGING_WAREHOUSE);

    // ---- Plain stock: WIDGET ----------------------------------------------

    let mut entries = 0usize;
    for (day_offset, warehouse, location, qty) in [
        (30, WAREHOUSES[0], "BIN-A1", 40.0),
        (20, WAREHOUSES[0], "BIN-A2", 25.0),
        (10, WAREHOUSES[1], "BIN-B1", 60.0),
        (5, STAGING_WAREHOUSE, "DOCK-1", 15.0),
    ] {
        record_receipt(
            &ledger,
            "WIDGET",
            warehouse,
            location,
            qty,
            None,
            None,
            today - Duration::days(day_offset),
            &mut creation,
        )
        .await?;
        entries += 1;
    }

    // ---- Batch stock: RESIN ------------------------------------------------

    let resin_batches: &[(&str, i64, Option<NaiveDate>)] = &[
        ("RESIN-B001", 45, Some(today + Duration::days(90))),
        ("RESIN-B002", 30, Some(today + Duration::days(14))),
        ("RESIN-B003", 15, None),
    ];
    for (batch_no, age_days, expiry) in resin_batches {
        ledger
            .batches()
            .insert_batch(&Batch {
                batch_no: batch_no.to_string(),
                item_code: "RESIN".to_string(),
                creation,
                expiry_date: *expiry,
                disabled: false,
            })
            .await?;
        record_receipt(
            &ledger,
            "RESIN",
            WAREHOUSES[0],
            "RACK-R1",
            50.0,
            Some(batch_no),
            None,
            today - Duration::days(*age_days),
            &mut creation,
        )
        .await?;
        entries += 1;
    }

    // ---- Serial stock: PUMP ------------------------------------------------

    for n in 0..8 {
        let serial_no = format!("PMP-{:05}", n + 1);
        let warehouse = WAREHOUSES[n % 2];
        let location = if n % 2 == 0 { "BIN-A3" } else { "BIN-B2" };
        ledger
            .serial_units()
            .insert_unit(&SerialUnit {
                serial_no: serial_no.clone(),
                item_code: "PUMP".to_string(),
                warehouse: warehouse.to_string(),
                location: location.to_string(),
                batch_no: None,
                creation,
            })
            .await?;
        record_receipt(
            &ledger,
            "PUMP",
            warehouse,
            location,
            1.0,
            None,
            Some(&serial_no),
            today - Duration::days(8 - n as i64),
            &mut creation,
        )
        .await?;
        entries += 1;
    }

    // ---- Batch + serial stock: VALVE ---------------------------------------

    ledger
        .batches()
        .insert_batch(&Batch {
            batch_no: "VALVE-B001".to_string(),
            item_code: "VALVE".to_string(),
            creation,
            expiry_date: None,
            disabled: false,
        })
        .await?;
    for n in 0..4 {
        let serial_no = format!("VLV-{:05}", n + 1);
        ledger
            .serial_units()
            .insert_unit(&SerialUnit {
                serial_no: serial_no.clone(),
                item_code: "VALVE".to_string(),
                warehouse: WAREHOUSES[0].to_string(),
                location: "RACK-R2".to_string(),
                batch_no: Some("VALVE-B001".to_string()),
                creation,
            })
            .await?;
        record_receipt(
            &ledger,
            "VALVE",
            WAREHOUSES[0],
            "RACK-R2",
            1.0,
            Some("VALVE-B001"),
            Some(&serial_no),
            today - Duration::days(3),
            &mut creation,
        )
        .await?;
        entries += 1;
    }

    println!("✓ Recorded {} ledger entries", entries);
    println!();
    println!("✓ Seed complete!");

    ledger.close().await;
    Ok(())
}

/// Records a single positive stock movement into a location.
#[allow(clippy::too_many_arguments)]
async fn record_receipt(
    ledger: &Ledger,
    item_code: &str,
    warehouse: &str,
    location: &str,
    qty: f64,
    batch_no: Option<&str>,
    serial_no: Option<&str>,
    posting_date: NaiveDate,
    creation: &mut i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let entry = LedgerEntry {
        id: Uuid::new_v4().to_string(),
        item_code: item_code.to_string(),
        warehouse: warehouse.to_string(),
        location: Some(location.to_string()),
        actual_qty: qty,
        posting_date,
        posting_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        creation: *creation,
        batch_no: batch_no.map(str::to_string),
        serial_no: serial_no.map(str::to_string),
        voucher_type: Some("Stock Receipt".to_string()),
        voucher_no: Some(format!("SR-{:05}", *creation)),
        is_cancelled: false,
        docstatus: 1,
    };
    ledger.balances().record_entry(&entry).await?;
    *creation += 1;
    Ok(())
}

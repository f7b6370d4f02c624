//! Shared test utilities for `budget-quest`.
//!
//! Fixed instants and small state builders for the pure core, and an
//! in-memory `SQLite` storage for the persistence tests.

use crate::{
    core::state::{Budget, FundKind, FundTransaction},
    errors::Result,
    storage::LocalStorage,
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// A wall-clock instant on the hour for a user at UTC. Panics on an invalid
/// date, which is a bug in the test itself.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    at_offset(0, year, month, day, hour)
}

/// [`at`] as a UTC instant, for the storage layer and the store.
pub fn at_utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    at(year, month, day, hour).to_utc()
}

/// A wall-clock instant on the hour for a user `offset_hours` east of UTC.
#[allow(clippy::unwrap_used)]
pub fn at_offset(
    offset_hours: i32,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(offset_hours * 3600)
        .unwrap()
        .with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap()
}

/// A non-archived budget with an empty history.
pub fn budget_with(id: i64, name: &str, total_budget: f64) -> Budget {
    Budget {
        id,
        name: name.to_string(),
        total_budget,
        order: id,
        ..Budget::default()
    }
}

/// An income entry for the fund history.
pub fn income(amount: f64, timestamp: DateTime<FixedOffset>) -> FundTransaction {
    FundTransaction {
        kind: FundKind::Add,
        desc: "Income".to_string(),
        amount,
        timestamp: timestamp.to_utc(),
    }
}

/// Creates an in-memory `SQLite` database with the storage table created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::storage::create_tables(&db).await?;
    Ok(db)
}

/// In-memory storage ready for use.
pub async fn setup_test_storage() -> Result<LocalStorage> {
    Ok(LocalStorage::new(setup_test_db().await?))
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

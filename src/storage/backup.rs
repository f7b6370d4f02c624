//! Rotating internal backups under `budgetAppBackup_{millis}` keys.
//!
//! Each backup is a full export file. The number kept is capped and the
//! oldest are evicted first. An automatic backup is due when the newest one
//! is older than the configured interval.

use super::LocalStorage;
use super::export::{decode_backup, encode_backup};
use crate::config::settings::Settings;
use crate::core::state::AppState;
use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

/// Prefix shared by every backup key.
pub const BACKUP_PREFIX: &str = "budgetAppBackup_";

/// A stored backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// Storage key
    pub key: String,
    /// Creation instant encoded in the key
    pub created_at: DateTime<Utc>,
}

fn parse_key(key: &str) -> Option<BackupInfo> {
    let millis = key.strip_prefix(BACKUP_PREFIX)?.parse().ok()?;
    let created_at = DateTime::from_timestamp_millis(millis)?;
    Some(BackupInfo {
        key: key.to_string(),
        created_at,
    })
}

/// Stored backups, oldest first. Keys that do not parse are skipped.
pub async fn list_backups(storage: &LocalStorage) -> Result<Vec<BackupInfo>> {
    let mut backups: Vec<BackupInfo> = storage
        .keys_with_prefix(BACKUP_PREFIX)
        .await?
        .iter()
        .filter_map(|key| parse_key(key))
        .collect();
    backups.sort_by_key(|b| b.created_at);
    Ok(backups)
}

/// Whether the newest backup is older than `interval_days`, or none exists.
#[must_use]
pub fn is_backup_due(backups: &[BackupInfo], as_of: DateTime<Utc>, interval_days: i64) -> bool {
    backups
        .iter()
        .map(|b| b.created_at)
        .max()
        .is_none_or(|newest| as_of - newest >= Duration::days(interval_days))
}

/// Writes a backup of `state` and evicts the oldest beyond `max_backups`.
/// Returns the new key.
#[instrument(skip(storage, state, settings))]
pub async fn create_backup(
    storage: &LocalStorage,
    state: &AppState,
    settings: &Settings,
    as_of: DateTime<Utc>,
) -> Result<String> {
    let key = format!("{BACKUP_PREFIX}{}", as_of.timestamp_millis());
    let file = encode_backup(state, &settings.app_version, &settings.export_secret)?;
    storage.set_item(&key, &file).await?;

    let backups = list_backups(storage).await?;
    let excess = backups.len().saturating_sub(settings.max_backups.max(1));
    for old in backups.iter().take(excess) {
        storage.remove_item(&old.key).await?;
        info!("Evicted backup {}", old.key);
    }
    info!("Created backup {}", key);
    Ok(key)
}

/// Creates a backup when one is due. Returns the new key if one was written.
pub async fn auto_backup(
    storage: &LocalStorage,
    state: &AppState,
    settings: &Settings,
    as_of: DateTime<Utc>,
) -> Result<Option<String>> {
    let backups = list_backups(storage).await?;
    if !is_backup_due(&backups, as_of, settings.backup_interval_days) {
        return Ok(None);
    }
    create_backup(storage, state, settings, as_of).await.map(Some)
}

/// Reads and validates a stored backup. The caller replaces its state only
/// when this succeeds.
#[instrument(skip(storage, secret))]
pub async fn restore_backup(storage: &LocalStorage, key: &str, secret: &str) -> Result<AppState> {
    let file = storage.get_item(key).await?.ok_or_else(|| Error::Import {
        message: format!("Backup not found: {key}"),
    })?;
    decode_backup(&file, secret).inspect_err(|e| warn!("Backup {} rejected: {}", key, e))
}

//! The persisted app state: one JSON blob under `budgetAppState_v{version}`.
//!
//! Migration is additive. A snapshot written by an older version is loaded
//! through the serde defaults and re-saved under the current key.
//!
//! A snapshot that no longer parses is copied under `budgetAppCorrupt_v...`
//! before anything new is saved, so the user's data is never overwritten.

use super::LocalStorage;
use crate::core::state::AppState;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

/// Prefix shared by every snapshot key.
pub const STATE_KEY_PREFIX: &str = "budgetAppState_v";

/// Prefix of quarantined snapshot keys. Must not share [`STATE_KEY_PREFIX`],
/// or migration would pick a quarantined blob up again.
pub const CORRUPT_KEY_PREFIX: &str = "budgetAppCorrupt_v";

/// Snapshot key for an app version.
#[must_use]
pub fn state_key(version: &str) -> String {
    format!("{STATE_KEY_PREFIX}{version}")
}

/// Numeric components of a version string; non-numeric parts count as zero.
fn version_parts(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

/// Writes the state under the current version's key.
#[instrument(skip(storage, state))]
pub async fn save_state(storage: &LocalStorage, state: &AppState, version: &str) -> Result<()> {
    let json = serde_json::to_string(state)?;
    storage.set_item(&state_key(version), &json).await
}

/// Loads the state for `version`, migrating the newest older snapshot when
/// the current key is absent. `Ok(None)` means nothing was ever saved.
#[instrument(skip(storage))]
pub async fn load_state(storage: &LocalStorage, version: &str) -> Result<Option<AppState>> {
    let current = state_key(version);
    if let Some(json) = storage.get_item(&current).await? {
        return Ok(Some(serde_json::from_str(&json)?));
    }

    let older = storage
        .keys_with_prefix(STATE_KEY_PREFIX)
        .await?
        .into_iter()
        .filter(|key| *key != current)
        .filter_map(|key| {
            let parts = version_parts(key.strip_prefix(STATE_KEY_PREFIX)?);
            Some((parts, key))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, key)| key);
    let Some(older) = older else {
        return Ok(None);
    };
    let Some(json) = storage.get_item(&older).await? else {
        return Ok(None);
    };

    let state: AppState = serde_json::from_str(&json).inspect_err(|e| {
        warn!("Snapshot {} is unreadable: {}", older, e);
    })?;
    save_state(storage, &state, version).await?;
    info!("Migrated snapshot {} to {}", older, current);
    Ok(Some(state))
}

/// Copies the raw snapshot for `version` under a quarantine key stamped with
/// `as_of`, leaving the original in place.
///
/// # Arguments
///
/// * `storage` - The key-value store
/// * `version` - App version whose snapshot failed to load
/// * `as_of` - Timestamp used in the quarantine key
///
/// # Returns
///
/// The quarantine key, or `None` when there was no snapshot to keep.
///
/// # Errors
///
/// Returns `Error::Database` if the snapshot cannot be read or copied. The
/// caller must not overwrite the snapshot in that case.
#[instrument(skip(storage))]
pub async fn quarantine_state(
    storage: &LocalStorage,
    version: &str,
    as_of: DateTime<Utc>,
) -> Result<Option<String>> {
    let Some(raw) = storage.get_item(&state_key(version)).await? else {
        return Ok(None);
    };
    let key = format!(
        "{CORRUPT_KEY_PREFIX}{version}_{}",
        as_of.timestamp_millis()
    );
    storage.set_item(&key, &raw).await?;
    warn!("Unreadable snapshot kept as {}", key);
    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::{at, at_utc, budget_with, income, setup_test_storage};

    #[tokio::test]
    async fn test_save_and_load() -> Result<()> {
        let storage = setup_test_storage().await?;
        assert!(load_state(&storage, "3.0").await?.is_none());

        let mut state = AppState::default();
        state.budgets.push(budget_with(1, "Food", 100.0));
        state.fund_history.push(income(50.0, at(2025, 1, 2, 3)));
        save_state(&storage, &state, "3.0").await?;

        assert_eq!(load_state(&storage, "3.0").await?, Some(state));
        assert!(storage.get_item("budgetAppState_v3.0").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_migrates_newest_older_snapshot() -> Result<()> {
        let storage = setup_test_storage().await?;
        storage
            .set_item("budgetAppState_v2.9", r#"{"budgets":[],"archives":[]}"#)
            .await?;
        storage
            .set_item(
                "budgetAppState_v2.10",
                r#"{"budgets":[{"id":4,"name":"Rent","totalBudget":900}],"archives":[]}"#,
            )
            .await?;

        let state = load_state(&storage, "3.0").await?.unwrap();
        assert_eq!(state.budgets[0].name, "Rent");
        assert_eq!(state.budgets[0].color, "#6366f1");
        assert!(storage.get_item("budgetAppState_v3.0").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() -> Result<()> {
        let storage = setup_test_storage().await?;
        storage.set_item("budgetAppState_v3.0", "{not json").await?;
        let err = load_state(&storage, "3.0").await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_quarantine_keeps_raw_snapshot() -> Result<()> {
        let storage = setup_test_storage().await?;
        assert!(quarantine_state(&storage, "3.0", at_utc(2025, 1, 1, 0)).await?.is_none());

        storage.set_item("budgetAppState_v3.0", r#"{"budgets":[{"id""#).await?;
        let key = quarantine_state(&storage, "3.0", at_utc(2025, 1, 1, 0))
            .await?
            .unwrap();
        assert!(key.starts_with(CORRUPT_KEY_PREFIX));
        assert!(!key.starts_with(STATE_KEY_PREFIX));
        assert_eq!(
            storage.get_item(&key).await?.as_deref(),
            Some(r#"{"budgets":[{"id""#)
        );
        // quarantined blobs are never migration candidates
        assert!(load_state(&storage, "3.1").await.is_err());
        storage.remove_item("budgetAppState_v3.0").await?;
        assert!(load_state(&storage, "3.1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_migration_ignores_lookalike_keys() -> Result<()> {
        let storage = setup_test_storage().await?;
        storage.set_item("budgetAppStateXv9", "{not json").await?;
        storage.set_item("budgetappstate_v2.0", "{not json").await?;
        assert!(load_state(&storage, "3.0").await?.is_none());
        Ok(())
    }

    #[test]
    fn test_version_ordering() {
        assert!(version_parts("2.10") > version_parts("2.9"));
        assert_eq!(state_key("3.0"), "budgetAppState_v3.0");
    }
}

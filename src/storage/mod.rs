//! Persistence Adapter.
//!
//! [`LocalStorage`] is a string key/value store over the `storage_entries`
//! table. The submodules build the app's persisted formats on top of it:
//! the versioned state snapshot, rotating backups and the export file.
//! Nothing here touches an in-memory state; callers decide what to do with
//! what is loaded.

pub mod backup;
pub mod export;
pub mod snapshot;

use crate::{
    entities::{StorageEntry, storage_entry},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// Key/value storage backed by the database.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    db: DatabaseConnection,
}

impl LocalStorage {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Reads the value stored under `key`.
    #[instrument(skip(self))]
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let entry = StorageEntry::find_by_id(key.to_string()).one(&self.db).await?;
        debug!("Read key '{}': {}", key, entry.is_some());
        Ok(entry.map(|e| e.value))
    }

    /// Writes `value` under `key`, replacing any previous value.
    #[instrument(skip(self, value), fields(len = value.len()))]
    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        let existing = StorageEntry::find_by_id(key.to_string()).one(&self.db).await?;

        if let Some(entry) = existing {
            let mut active_model: storage_entry::ActiveModel = entry.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let entry = storage_entry::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
            };
            entry.insert(&self.db).await?;
        }
        Ok(())
    }

    /// Deletes `key`. Returns whether it existed.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, key: &str) -> Result<bool> {
        let result = StorageEntry::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Every key starting with `prefix`, in ascending order.
    ///
    /// `SQLite` LIKE treats `_` and `%` as wildcards and ignores ASCII case,
    /// so the query over-matches and the prefix is checked again here.
    #[instrument(skip(self))]
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = StorageEntry::find()
            .filter(storage_entry::Column::Key.starts_with(prefix))
            .order_by_asc(storage_entry::Column::Key)
            .all(&self.db)
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| e.key)
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

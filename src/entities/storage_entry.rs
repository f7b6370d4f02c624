//! Storage entry entity - one key/value item of the local storage.
//! The whole app state, the rotating backups and small markers all live here
//! as JSON text under their own keys.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_entries")]
pub struct Model {
    /// Storage key (e.g., `"budgetAppState_v3.0"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Stored text, usually JSON
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When the entry was last written
    pub updated_at: DateTime,
}

/// `StorageEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

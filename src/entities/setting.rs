//! Setting entity - Per-ledger key-value pairs (e.g., `"starting_balance"`).
//! (`ledger_id`, `key`) is unique; writes create or overwrite.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting database model - stores key-value pairs for one ledger
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ledger the setting belongs to
    pub ledger_id: i64,
    /// Setting key
    pub key: String,
    /// Setting value stored as string
    pub value: String,
    /// When this setting was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Setting and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each setting belongs to one ledger
    #[sea_orm(
        belongs_to = "super::ledger::Entity",
        from = "Column::LedgerId",
        to = "super::ledger::Column::Id",
        on_delete = "Cascade"
    )]
    Ledger,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Category entity - Groups plans as income or expense within one ledger.
//!
//! (`ledger_id`, `name`, `type`) is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a category collects money coming in or going out.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Money coming in
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ledger that owns the category
    pub ledger_id: i64,
    /// Display name (e.g., "Groceries")
    pub name: String,
    /// Income or expense
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Optional icon (usually an emoji)
    pub icon: Option<String>,
    /// Optional display color (e.g., `"#22c55e"`)
    pub color: Option<String>,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one ledger
    #[sea_orm(
        belongs_to = "super::ledger::Entity",
        from = "Column::LedgerId",
        to = "super::ledger::Column::Id",
        on_delete = "Cascade"
    )]
    Ledger,
    /// One category is used by many plans
    #[sea_orm(has_many = "super::plan::Entity")]
    Plans,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

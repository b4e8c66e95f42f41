//! Entry entity - A realized ledger line recorded against exactly one plan.
//!
//! Entries reach their ledger only through `plan_id`; deleting a plan deletes its entries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plan the entry realizes
    pub plan_id: i64,
    /// Month the entry counts towards (`YYYY-MM`)
    pub month: String,
    /// Realized amount
    pub amount: f64,
    /// Actual date (`YYYY-MM-DD`), if known
    pub date: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the entry was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Entry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one plan
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::Id",
        on_delete = "Cascade"
    )]
    Plan,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

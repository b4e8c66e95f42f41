//! Plan entity - A recurring or one-time expected financial item.
//!
//! Plans are scoped to a ledger and point at one category of that ledger. A plan starts
//! `active`; a `one-time` plan becomes `completed` when its first entry is recorded.
//! Months are stored as `YYYY-MM` strings so they sort lexically.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How often a plan is expected to occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Frequency {
    /// Happens once; completes with its first entry
    #[sea_orm(string_value = "one-time")]
    #[serde(rename = "one-time")]
    OneTime,
    /// Every week
    #[sea_orm(string_value = "weekly")]
    #[serde(rename = "weekly")]
    Weekly,
    /// Every other week
    #[sea_orm(string_value = "biweekly")]
    #[serde(rename = "biweekly")]
    Biweekly,
    /// Once a month
    #[sea_orm(string_value = "monthly")]
    #[serde(rename = "monthly")]
    Monthly,
}

/// Lifecycle state of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Still expected to produce entries
    #[sea_orm(string_value = "active")]
    Active,
    /// One-time plan that has been realized
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Plan database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    /// Unique identifier for the plan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ledger that owns the plan
    pub ledger_id: i64,
    /// Category of the same ledger
    pub category_id: i64,
    /// Human-readable name (e.g., "Rent")
    pub name: String,
    /// Amount expected per occurrence
    pub expected_amount: f64,
    /// How often the plan occurs
    pub frequency: Frequency,
    /// Expected day of month (1-31), if any
    pub expected_day: Option<i32>,
    /// First month the plan applies to (`YYYY-MM`)
    pub start_month: String,
    /// Last month the plan applies to (`YYYY-MM`), open-ended if None
    pub end_month: Option<String>,
    /// Active or completed
    pub status: PlanStatus,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the plan was created
    pub created_at: DateTimeUtc,
    /// When the plan was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Plan and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each plan belongs to one ledger
    #[sea_orm(
        belongs_to = "super::ledger::Entity",
        from = "Column::LedgerId",
        to = "super::ledger::Column::Id",
        on_delete = "Cascade"
    )]
    Ledger,
    /// Each plan points at one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// One plan has many entries
    #[sea_orm(has_many = "super::entry::Entity")]
    Entries,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

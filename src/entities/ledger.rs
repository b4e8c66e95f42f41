//! Ledger entity - A named, shareable container of financial data (a "cashflow").
//!
//! Access to a ledger is mediated entirely by membership rows. `owner_id` records the
//! creator and is informational only. `share_id` is the public share token; it only
//! grants anything while `is_public` is set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledgers")]
pub struct Model {
    /// Unique identifier for the ledger
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name (e.g., "Household")
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// User who created the ledger
    pub owner_id: i64,
    /// Public share token
    #[sea_orm(unique)]
    pub share_id: String,
    /// Whether the share token currently grants anonymous access
    pub is_public: bool,
    /// When the ledger was created
    pub created_at: DateTimeUtc,
    /// When the ledger metadata was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Ledger and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One ledger has many memberships
    #[sea_orm(has_many = "super::membership::Entity")]
    Memberships,
    /// One ledger has many categories
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// One ledger has many plans
    #[sea_orm(has_many = "super::plan::Entity")]
    Plans,
    /// One ledger has many settings
    #[sea_orm(has_many = "super::setting::Entity")]
    Settings,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plans.def()
    }
}

impl Related<super::setting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

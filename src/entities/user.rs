//! User entity - An identity established through an external provider.
//!
//! Users are created on the first successful identity exchange and are never deleted.
//! `email` is globally unique, and so is the (`provider`, `provider_id`) pair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Email address reported by the provider
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar image URL, if the provider supplies one
    pub avatar_url: Option<String>,
    /// Provider name (e.g., `"google"`, `"github"`)
    pub provider: String,
    /// Identifier assigned to the user by the provider
    pub provider_id: String,
    /// When the user first signed in
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user holds many memberships
    #[sea_orm(has_many = "super::membership::Entity")]
    Memberships,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

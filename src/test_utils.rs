//! Shared test utilities for the cashflow tracker.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::defaults::LedgerDefaults,
    core::{
        access::Caller,
        ledger::{self, LedgerView, NewLedger},
        plan::{self, NewPlan},
        session::Principal,
    },
    entities::{Category, CategoryKind, Frequency, category, plan as plan_entity, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Inserts a user directly, as if they had signed in through `test` provider.
///
/// The local part of the email doubles as name and provider id.
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    let local = email.split('@').next().unwrap_or(email);
    let created = user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(local.to_string()),
        avatar_url: Set(None),
        provider: Set("test".to_string()),
        provider_id: Set(local.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created)
}

/// The principal a session for `user` would resolve to.
#[must_use]
pub const fn principal_of(user: &user::Model) -> Principal {
    Principal::new(user.id)
}

/// Creates a ledger owned by `owner` with the built-in defaults.
pub async fn create_test_ledger(
    db: &DatabaseConnection,
    owner: &user::Model,
    name: &str,
) -> Result<LedgerView> {
    ledger::create_ledger(
        db,
        principal_of(owner),
        NewLedger {
            name: name.to_string(),
            description: None,
        },
        &LedgerDefaults::default(),
    )
    .await
}

/// Database with one owner and one seeded "Household" ledger.
pub async fn setup_with_ledger() -> Result<(DatabaseConnection, user::Model, LedgerView)> {
    let db = setup_test_db().await?;
    let owner = create_test_user(&db, "owner@example.com").await?;
    let ledger = create_test_ledger(&db, &owner, "Household").await?;
    Ok((db, owner, ledger))
}

/// First category of `kind` in a ledger, by id.
pub async fn first_category(
    db: &DatabaseConnection,
    ledger_id: i64,
    kind: CategoryKind,
) -> Result<category::Model> {
    Category::find()
        .filter(category::Column::LedgerId.eq(ledger_id))
        .filter(category::Column::Kind.eq(kind))
        .order_by_asc(category::Column::Id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            resource: "category",
        })
}

/// Creates a plan of 100.0 starting 2025-01 in the first category of `kind`.
///
/// The category is looked up in the ledger the caller resolves to.
pub async fn create_test_plan(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    kind: CategoryKind,
    name: &str,
    frequency: Frequency,
) -> Result<plan_entity::Model> {
    let ledger_id = match caller {
        Caller::Member { ledger_id, .. } => *ledger_id,
        Caller::Public { share_id } => {
            crate::core::public::resolve_public_ledger(db, share_id)
                .await?
                .id
        }
    };
    let category = first_category(db, ledger_id, kind).await?;
    plan::create_plan(
        db,
        caller,
        NewPlan::new(category.id, name, 100.0, frequency, "2025-01"),
    )
    .await
}

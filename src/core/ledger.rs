//! Ledger business logic - creation, listing, metadata updates and cascading deletion.
//!
//! A ledger is created together with its creator's `owner` membership and the configured
//! default categories and settings, in one transaction. Deletion removes every dependent
//! row in foreign-key order inside one transaction, so a failure part-way leaves the
//! ledger fully intact.

use crate::{
    config::defaults::LedgerDefaults,
    core::{
        access::{ANY_ROLE, EDITORS, OWNERS, check_access},
        session::Principal,
        validation::{optional_text, require_name},
    },
    entities::{
        Category, Entry, Ledger, Membership, Plan, Role, Setting, category, entry, ledger,
        membership, plan, setting,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Ledger as presented to a caller, with the caller's role when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerView {
    /// Ledger id
    pub id: i64,
    /// Ledger name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Creator of the ledger
    pub owner_id: i64,
    /// Public share token
    pub share_id: String,
    /// Whether the share token grants anonymous access
    pub is_public: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last metadata change
    pub updated_at: DateTime<Utc>,
    /// Caller's role; absent for public access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl LedgerView {
    /// Builds a view from a stored ledger and the caller's role.
    #[must_use]
    pub fn from_model(model: ledger::Model, role: Option<Role>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            owner_id: model.owner_id,
            share_id: model.share_id,
            is_public: model.is_public,
            created_at: model.created_at,
            updated_at: model.updated_at,
            role,
        }
    }
}

/// Input for [`create_ledger`].
#[derive(Debug, Clone, Default)]
pub struct NewLedger {
    /// Ledger name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Fields to change in [`update_ledger`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct LedgerUpdate {
    /// New name
    pub name: Option<String>,
    /// New description; blank clears it
    pub description: Option<String>,
    /// New public flag (owners only)
    pub is_public: Option<bool>,
}

pub(crate) fn new_share_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Creates a ledger owned by `principal`, seeded with `defaults`.
///
/// The ledger row, the owner membership, the default categories and the default
/// settings are written in one transaction.
#[instrument(skip(db, new_ledger, defaults))]
pub async fn create_ledger(
    db: &DatabaseConnection,
    principal: Principal,
    new_ledger: NewLedger,
    defaults: &LedgerDefaults,
) -> Result<LedgerView> {
    let name = require_name(&new_ledger.name, "Ledger")?;
    let description = optional_text(new_ledger.description);

    let txn = db.begin().await?;
    let now = Utc::now();

    let created = ledger::ActiveModel {
        name: Set(name),
        description: Set(description),
        owner_id: Set(principal.user_id),
        share_id: Set(new_share_id()),
        is_public: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    membership::ActiveModel {
        ledger_id: Set(created.id),
        user_id: Set(principal.user_id),
        role: Set(Role::Owner),
        invited_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for default in &defaults.categories {
        category::ActiveModel {
            ledger_id: Set(created.id),
            name: Set(default.name.trim().to_string()),
            kind: Set(default.kind),
            icon: Set(default.icon.clone()),
            color: Set(default.color.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for default in &defaults.settings {
        setting::ActiveModel {
            ledger_id: Set(created.id),
            key: Set(default.key.clone()),
            value: Set(default.value.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(ledger_id = created.id, "Ledger created");

    Ok(LedgerView::from_model(created, Some(Role::Owner)))
}

/// Lists every ledger the principal is a member of, ordered by name.
pub async fn list_ledgers(db: &DatabaseConnection, principal: Principal) -> Result<Vec<LedgerView>> {
    let rows = Membership::find()
        .filter(membership::Column::UserId.eq(principal.user_id))
        .find_also_related(Ledger)
        .all(db)
        .await?;

    let mut views: Vec<LedgerView> = rows
        .into_iter()
        .filter_map(|(member, ledger)| {
            ledger.map(|ledger| LedgerView::from_model(ledger, Some(member.role)))
        })
        .collect();
    views.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(views)
}

/// Fetches one ledger for a member, including the member's role.
pub async fn get_ledger(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
) -> Result<LedgerView> {
    let role = check_access(db, principal.user_id, ledger_id, ANY_ROLE).await?;
    let ledger = Ledger::find_by_id(ledger_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { resource: "ledger" })?;
    Ok(LedgerView::from_model(ledger, Some(role)))
}

/// Renames, re-describes or changes the visibility of a ledger.
///
/// Name and description need `owner` or `editor`; changing `is_public` needs `owner`.
#[instrument(skip(db, update))]
pub async fn update_ledger(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
    update: LedgerUpdate,
) -> Result<LedgerView> {
    let name = update
        .name
        .as_deref()
        .map(|n| require_name(n, "Ledger"))
        .transpose()?;
    let allowed = if update.is_public.is_some() {
        OWNERS
    } else {
        EDITORS
    };

    let txn = db.begin().await?;
    let role = check_access(&txn, principal.user_id, ledger_id, allowed).await?;

    let mut active: ledger::ActiveModel = Ledger::find_by_id(ledger_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { resource: "ledger" })?
        .into();

    if let Some(name) = name {
        active.name = Set(name);
    }
    if update.description.is_some() {
        active.description = Set(optional_text(update.description));
    }
    if let Some(is_public) = update.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    debug!(is_public = updated.is_public, "Ledger updated");

    Ok(LedgerView::from_model(updated, Some(role)))
}

/// Replaces the share token, invalidating the old one. Owners only.
#[instrument(skip(db))]
pub async fn regenerate_share_id(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
) -> Result<LedgerView> {
    let txn = db.begin().await?;
    let role = check_access(&txn, principal.user_id, ledger_id, OWNERS).await?;

    let mut active: ledger::ActiveModel = Ledger::find_by_id(ledger_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { resource: "ledger" })?
        .into();
    active.share_id = Set(new_share_id());
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    info!("Share token regenerated");

    Ok(LedgerView::from_model(updated, Some(role)))
}

/// Deletes a ledger and everything it owns. Owners only.
///
/// Order: settings, entries (through the ledger's plans), plans, categories,
/// memberships, then the ledger row. All of it commits or none of it does.
#[instrument(skip(db))]
pub async fn delete_ledger(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    check_access(&txn, principal.user_id, ledger_id, OWNERS).await?;

    Setting::delete_many()
        .filter(setting::Column::LedgerId.eq(ledger_id))
        .exec(&txn)
        .await?;

    let plan_ids: Vec<i64> = Plan::find()
        .filter(plan::Column::LedgerId.eq(ledger_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if !plan_ids.is_empty() {
        Entry::delete_many()
            .filter(entry::Column::PlanId.is_in(plan_ids))
            .exec(&txn)
            .await?;
    }

    Plan::delete_many()
        .filter(plan::Column::LedgerId.eq(ledger_id))
        .exec(&txn)
        .await?;
    Category::delete_many()
        .filter(category::Column::LedgerId.eq(ledger_id))
        .exec(&txn)
        .await?;
    Membership::delete_many()
        .filter(membership::Column::LedgerId.eq(ledger_id))
        .exec(&txn)
        .await?;
    Ledger::delete_by_id(ledger_id).exec(&txn).await?;

    txn.commit().await?;
    info!("Ledger deleted");
    Ok(())
}

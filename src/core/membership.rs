//! Membership management - listing members, inviting, changing roles and removing.
//!
//! Listing needs any role; every mutation needs `owner`. Owner memberships are
//! permanent: they cannot be re-roled or removed, and nobody can be promoted to owner.
//! The only way an owner membership disappears is deletion of the whole ledger.

use crate::{
    core::{
        access::{ANY_ROLE, OWNERS, check_access},
        session::Principal,
        user::{find_by_email, normalize_email},
    },
    entities::{Membership, Role, User, membership, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// A member of a ledger together with the member's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    /// Membership id
    pub id: i64,
    /// Member's user id
    pub user_id: i64,
    /// Member's email
    pub email: String,
    /// Member's display name
    pub name: String,
    /// Member's avatar URL
    pub avatar_url: Option<String>,
    /// Role in the ledger
    pub role: Role,
    /// When the member was added
    pub invited_at: DateTime<Utc>,
}

impl MemberView {
    fn new(member: membership::Model, user: user::Model) -> Self {
        Self {
            id: member.id,
            user_id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            role: member.role,
            invited_at: member.invited_at,
        }
    }
}

fn reject_owner_grant(role: Role) -> Result<()> {
    if role == Role::Owner {
        return Err(Error::invalid_operation(
            "the owner role can only be held by the ledger's creator",
        ));
    }
    Ok(())
}

async fn find_member<C>(conn: &C, ledger_id: i64, membership_id: i64) -> Result<membership::Model>
where
    C: ConnectionTrait,
{
    Membership::find_by_id(membership_id)
        .filter(membership::Column::LedgerId.eq(ledger_id))
        .one(conn)
        .await?
        .ok_or(Error::NotFound {
            resource: "membership",
        })
}

async fn load_user<C>(conn: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(Error::NotFound { resource: "user" })
}

/// Lists the members of a ledger, oldest membership first.
pub async fn list_members(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
) -> Result<Vec<MemberView>> {
    let txn = db.begin().await?;
    check_access(&txn, principal.user_id, ledger_id, ANY_ROLE).await?;

    let rows = Membership::find()
        .filter(membership::Column::LedgerId.eq(ledger_id))
        .order_by_asc(membership::Column::InvitedAt)
        .order_by_asc(membership::Column::Id)
        .find_also_related(User)
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(rows
        .into_iter()
        .filter_map(|(member, user)| user.map(|user| MemberView::new(member, user)))
        .collect())
}

/// Adds an existing user, found by email (case-insensitive), to a ledger with `role`.
///
/// # Errors
/// * [`Error::InvalidOperation`] if `role` is owner, the user has never signed in, or
///   the user is already a member
/// * [`Error::Forbidden`] unless the principal owns the ledger
#[instrument(skip(db, email))]
pub async fn invite_member(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
    email: &str,
    role: Role,
) -> Result<MemberView> {
    reject_owner_grant(role)?;
    let email = normalize_email(email);

    let txn = db.begin().await?;
    check_access(&txn, principal.user_id, ledger_id, OWNERS).await?;

    let invitee = find_by_email(&txn, &email)
        .await?
        .ok_or_else(|| {
            Error::invalid_operation(format!("no user with email {email} has signed in yet"))
        })?;

    let existing = Membership::find()
        .filter(membership::Column::LedgerId.eq(ledger_id))
        .filter(membership::Column::UserId.eq(invitee.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::invalid_operation(format!(
            "{email} is already a member of this ledger"
        )));
    }

    let member = membership::ActiveModel {
        ledger_id: Set(ledger_id),
        user_id: Set(invitee.id),
        role: Set(role),
        invited_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(user_id = invitee.id, %role, "Member invited");

    Ok(MemberView::new(member, invitee))
}

/// Changes a member's role between `editor` and `viewer`.
///
/// # Errors
/// * [`Error::InvalidOperation`] if the target is an owner or the new role is owner;
///   the membership is left unchanged
/// * [`Error::NotFound`] if the membership is not part of this ledger
#[instrument(skip(db))]
pub async fn update_member_role(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
    membership_id: i64,
    role: Role,
) -> Result<MemberView> {
    let txn = db.begin().await?;
    check_access(&txn, principal.user_id, ledger_id, OWNERS).await?;

    let member = find_member(&txn, ledger_id, membership_id).await?;
    if member.role == Role::Owner {
        return Err(Error::invalid_operation("the owner role cannot be changed"));
    }
    reject_owner_grant(role)?;

    let mut active: membership::ActiveModel = member.into();
    active.role = Set(role);
    let updated = active.update(&txn).await?;
    let user = load_user(&txn, updated.user_id).await?;

    txn.commit().await?;
    info!(%role, "Member role updated");

    Ok(MemberView::new(updated, user))
}

/// Removes a non-owner member from a ledger.
///
/// # Errors
/// * [`Error::InvalidOperation`] if the target is an owner
/// * [`Error::NotFound`] if the membership is not part of this ledger
#[instrument(skip(db))]
pub async fn remove_member(
    db: &DatabaseConnection,
    principal: Principal,
    ledger_id: i64,
    membership_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    check_access(&txn, principal.user_id, ledger_id, OWNERS).await?;

    let member = find_member(&txn, ledger_id, membership_id).await?;
    if member.role == Role::Owner {
        return Err(Error::invalid_operation("an owner cannot be removed"));
    }

    Membership::delete_by_id(member.id).exec(&txn).await?;
    txn.commit().await?;
    info!(user_id = member.user_id, "Member removed");
    Ok(())
}

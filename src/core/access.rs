//! Access control gate.
//!
//! Two independent trust boundaries lead into a ledger's financial data:
//!
//! * membership: an authenticated [`Principal`] holding a role in the ledger, checked by
//!   [`check_access`];
//! * public sharing: anyone presenting the share token of a ledger whose public flag is
//!   set, resolved by [`crate::core::public::resolve_public_ledger`].
//!
//! [`authorize`] picks the boundary from the [`Caller`]. The public path never looks at
//! memberships. Every guarded operation runs the check on the same transaction as the
//! mutation it guards, so a concurrent role change cannot slip in between.

use crate::{
    core::{public, session::Principal},
    entities::{Membership, Role, membership},
    errors::{ACCESS_DENIED, Error, INSUFFICIENT_PERMISSIONS, Result},
};
use sea_orm::prelude::*;
use tracing::{debug, instrument, warn};

/// Any membership suffices (reads).
pub const ANY_ROLE: &[Role] = &[Role::Owner, Role::Editor, Role::Viewer];
/// Roles allowed to modify categories, plans, entries and settings.
pub const EDITORS: &[Role] = &[Role::Owner, Role::Editor];
/// Roles allowed to delete a ledger, change its visibility, and manage members.
pub const OWNERS: &[Role] = &[Role::Owner];

/// Resolves the caller's role in a ledger and checks it against `allowed_roles`.
///
/// A missing membership is reported as [`Error::Forbidden`], not as not-found, so
/// non-members cannot probe which ledger ids exist.
///
/// # Errors
/// * [`Error::Forbidden`] with [`ACCESS_DENIED`] if the principal is not a member
/// * [`Error::Forbidden`] with [`INSUFFICIENT_PERMISSIONS`] if the role is not allowed
#[instrument(skip(conn, allowed_roles))]
pub async fn check_access<C>(
    conn: &C,
    principal_id: i64,
    ledger_id: i64,
    allowed_roles: &[Role],
) -> Result<Role>
where
    C: ConnectionTrait,
{
    let membership = Membership::find()
        .filter(membership::Column::LedgerId.eq(ledger_id))
        .filter(membership::Column::UserId.eq(principal_id))
        .one(conn)
        .await?
        .ok_or_else(|| {
            debug!("No membership found");
            Error::Forbidden {
                reason: ACCESS_DENIED,
            }
        })?;

    if !allowed_roles.contains(&membership.role) {
        warn!(role = %membership.role, "Role not allowed for operation");
        return Err(Error::Forbidden {
            reason: INSUFFICIENT_PERMISSIONS,
        });
    }

    Ok(membership.role)
}

/// Who is asking for ledger-scoped financial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller<'a> {
    /// An authenticated member addressing a ledger by id
    Member {
        /// Authenticated user
        principal: Principal,
        /// Ledger being addressed
        ledger_id: i64,
    },
    /// An anonymous visitor holding a share token
    Public {
        /// Share token of the ledger
        share_id: &'a str,
    },
}

impl<'a> Caller<'a> {
    /// Member access to `ledger_id`.
    #[must_use]
    pub const fn member(principal: Principal, ledger_id: i64) -> Self {
        Self::Member {
            principal,
            ledger_id,
        }
    }

    /// Anonymous access through a share token.
    #[must_use]
    pub const fn public(share_id: &'a str) -> Self {
        Self::Public { share_id }
    }
}

/// What the caller wants to do with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// List and fetch
    Read,
    /// Create, update and delete
    Write,
}

/// Proof that a caller passed the gate for one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    /// Ledger the grant is scoped to
    pub ledger_id: i64,
    /// Resolved role; `None` for public access
    pub role: Option<Role>,
}

/// Admits a caller to a ledger's categories, plans, entries and settings.
///
/// Members need any role to read and `owner`/`editor` to write. Public callers get
/// editor-equivalent access to a public ledger without a membership check.
///
/// # Errors
/// * [`Error::Forbidden`] for members lacking a membership or the needed role
/// * [`Error::NotFound`] for unknown or private share tokens
pub async fn authorize<C>(conn: &C, caller: &Caller<'_>, capability: Capability) -> Result<Grant>
where
    C: ConnectionTrait,
{
    match *caller {
        Caller::Member {
            principal,
            ledger_id,
        } => {
            let allowed = match capability {
                Capability::Read => ANY_ROLE,
                Capability::Write => EDITORS,
            };
            let role = check_access(conn, principal.user_id, ledger_id, allowed).await?;
            Ok(Grant {
                ledger_id,
                role: Some(role),
            })
        }
        Caller::Public { share_id } => {
            let ledger = public::resolve_public_ledger(conn, share_id).await?;
            Ok(Grant {
                ledger_id: ledger.id,
                role: None,
            })
        }
    }
}

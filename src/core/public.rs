//! Public share resolution.
//!
//! A share token only resolves while the ledger's public flag is set. Unknown tokens and
//! tokens of private ledgers fail with the same [`Error::NotFound`], so a private token
//! cannot be told apart from garbage.
//!
//! Public callers reach categories, plans, entries and settings through
//! [`crate::core::access::Caller::Public`]. Ledger rename, visibility, deletion and
//! membership management take a [`crate::core::session::Principal`] and are not reachable
//! from here.

use crate::{
    core::ledger::LedgerView,
    entities::{Ledger, ledger},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use tracing::{debug, instrument};

/// Finds the public ledger behind a share token.
///
/// # Errors
/// [`Error::NotFound`] if no ledger has this token or the ledger is not public.
#[instrument(skip(conn, share_id))]
pub async fn resolve_public_ledger<C>(conn: &C, share_id: &str) -> Result<ledger::Model>
where
    C: ConnectionTrait,
{
    let found = Ledger::find()
        .filter(ledger::Column::ShareId.eq(share_id))
        .filter(ledger::Column::IsPublic.eq(true))
        .one(conn)
        .await?;

    found.ok_or_else(|| {
        debug!("Share token did not resolve to a public ledger");
        Error::NotFound { resource: "ledger" }
    })
}

/// Fetches a public ledger for anonymous display. The view carries no role.
pub async fn get_public_ledger(db: &DatabaseConnection, share_id: &str) -> Result<LedgerView> {
    let ledger = resolve_public_ledger(db, share_id).await?;
    Ok(LedgerView::from_model(ledger, None))
}

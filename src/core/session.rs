//! Principal resolution.
//!
//! Validating credentials (signatures, expiry) is the job of an external session
//! resolver. This module only fixes the contract: anything short of a resolved principal
//! is [`Error::Unauthenticated`], and there is no fallback principal.

use crate::errors::{Error, Result};
use tracing::debug;

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    /// Id of the authenticated user
    pub user_id: i64,
}

impl Principal {
    /// Wraps a user id that a resolver has already vouched for.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Turns an opaque session credential into a user id.
pub trait SessionResolver {
    /// Returns the user id for a valid credential, `None` for anything else
    /// (malformed, expired, bad signature, revoked).
    fn resolve(&self, credential: &str) -> Option<i64>;
}

/// Resolves the principal for a request.
///
/// # Errors
/// Returns [`Error::Unauthenticated`] if the credential is absent, blank, or rejected by
/// the resolver.
pub fn resolve_principal<R>(resolver: &R, credential: Option<&str>) -> Result<Principal>
where
    R: SessionResolver + ?Sized,
{
    let credential = credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(Error::Unauthenticated)?;

    resolver.resolve(credential).map(Principal::new).ok_or_else(|| {
        debug!("Session credential rejected");
        Error::Unauthenticated
    })
}

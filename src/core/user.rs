//! User accounts created from external identity exchanges.
//!
//! The identity provider is outside this crate: whatever performed the exchange hands
//! over an [`ExternalIdentity`], and [`upsert_user_from_identity`] turns it into a user
//! row. The (`provider`, `provider_id`) pair identifies a returning user; name, avatar
//! and email are refreshed from the provider on every exchange.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Identity tuple returned by a successful provider exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalIdentity {
    /// Email reported by the provider
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Provider name (e.g., `"google"`)
    pub provider: String,
    /// Identifier assigned by the provider
    pub provider_id: String,
}

/// Emails are stored and matched trimmed and lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) async fn find_by_email<C>(conn: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    Ok(User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(conn)
        .await?)
}

/// Creates the user on first sign-in, refreshes the profile on later ones.
///
/// # Errors
/// * [`Error::InvalidInput`] if email, provider or provider id is blank
/// * [`Error::Conflict`] if the email already belongs to a user of another identity
#[instrument(skip(db, identity), fields(provider = %identity.provider))]
pub async fn upsert_user_from_identity(
    db: &DatabaseConnection,
    identity: ExternalIdentity,
) -> Result<user::Model> {
    let email = normalize_email(&identity.email);
    if email.is_empty() || identity.provider.is_empty() || identity.provider_id.is_empty() {
        return Err(Error::invalid_input(
            "identity must carry an email, a provider and a provider id",
        ));
    }
    let name = if identity.name.trim().is_empty() {
        email.clone()
    } else {
        identity.name.trim().to_string()
    };

    let txn = db.begin().await?;
    let existing = User::find()
        .filter(user::Column::Provider.eq(identity.provider.as_str()))
        .filter(user::Column::ProviderId.eq(identity.provider_id.as_str()))
        .one(&txn)
        .await?;

    let saved = if let Some(existing) = existing {
        let mut active: user::ActiveModel = existing.into();
        active.email = Set(email);
        active.name = Set(name);
        active.avatar_url = Set(identity.avatar_url);
        active.update(&txn).await?
    } else {
        let created = user::ActiveModel {
            email: Set(email),
            name: Set(name),
            avatar_url: Set(identity.avatar_url),
            provider: Set(identity.provider),
            provider_id: Set(identity.provider_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        info!(user_id = created.id, "User created");
        created
    };

    txn.commit().await?;
    Ok(saved)
}

/// Fetches a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { resource: "user" })
}

/// Looks a user up by email, ignoring case.
pub async fn find_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    find_by_email(db, email).await
}

//! Ledger settings - string key-value pairs with upsert semantics.

use crate::{
    config::defaults::STARTING_BALANCE_KEY,
    core::access::{Capability, Caller, authorize},
    entities::{Setting, setting},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, instrument, warn};

pub(crate) async fn find_setting<C>(
    conn: &C,
    ledger_id: i64,
    key: &str,
) -> Result<Option<setting::Model>>
where
    C: ConnectionTrait,
{
    Ok(Setting::find()
        .filter(setting::Column::LedgerId.eq(ledger_id))
        .filter(setting::Column::Key.eq(key))
        .one(conn)
        .await?)
}

/// Reads the starting balance of a ledger, treating a missing or unparsable value as zero.
pub(crate) async fn starting_balance<C>(conn: &C, ledger_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let Some(setting) = find_setting(conn, ledger_id, STARTING_BALANCE_KEY).await? else {
        return Ok(0.0);
    };
    Ok(setting.value.trim().parse::<f64>().unwrap_or_else(|_| {
        warn!(ledger_id, value = %setting.value, "Unparsable starting balance, using 0");
        0.0
    }))
}

/// Lists the settings of the caller's ledger ordered by key.
pub async fn list_settings(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
) -> Result<Vec<setting::Model>> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;

    let settings = Setting::find()
        .filter(setting::Column::LedgerId.eq(grant.ledger_id))
        .order_by_asc(setting::Column::Key)
        .all(&txn)
        .await?;

    txn.commit().await?;
    Ok(settings)
}

/// Fetches one setting of the caller's ledger.
///
/// # Errors
/// * [`Error::NotFound`] if the key has never been written
pub async fn get_setting(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    key: &str,
) -> Result<setting::Model> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;
    let setting = find_setting(&txn, grant.ledger_id, key)
        .await?
        .ok_or(Error::NotFound { resource: "setting" })?;
    txn.commit().await?;
    Ok(setting)
}

/// Creates or overwrites a setting of the caller's ledger.
#[instrument(skip(db, value))]
pub async fn upsert_setting(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    key: &str,
    value: &str,
) -> Result<setting::Model> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::invalid_input("setting key cannot be empty"));
    }

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;

    let saved = match find_setting(&txn, grant.ledger_id, key).await? {
        Some(existing) => {
            let mut active: setting::ActiveModel = existing.into();
            active.value = Set(value.to_string());
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?
        }
        None => {
            setting::ActiveModel {
                ledger_id: Set(grant.ledger_id),
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;
    debug!(setting_id = saved.id, "Setting saved");
    Ok(saved)
}

//! Entry business logic - realized amounts recorded against plans.
//!
//! An entry reaches its ledger only through its plan, so every lookup joins the plan and
//! filters on the caller's ledger. Recording the first entry of a `one-time` plan
//! completes the plan in the same transaction as the insert.

use crate::{
    core::{
        access::{Capability, Caller, authorize},
        plan::find_plan_in_ledger,
        validation::{optional_text, require_amount, require_date, require_month},
    },
    entities::{Entry, Frequency, Plan, PlanStatus, entry, plan},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Input for [`record_entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Month the entry counts towards (`YYYY-MM`)
    pub month: String,
    /// Realized amount
    pub amount: f64,
    /// Actual date (`YYYY-MM-DD`)
    pub date: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

impl NewEntry {
    /// An entry with only month and amount.
    #[must_use]
    pub fn new(month: &str, amount: f64) -> Self {
        Self {
            month: month.to_string(),
            amount,
            date: None,
            notes: None,
        }
    }
}

/// Fields to change in [`update_entry`]; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    /// New month
    pub month: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// New or cleared date
    pub date: Option<Option<String>>,
    /// New or cleared notes
    pub notes: Option<Option<String>>,
}

/// Optional filters for [`list_entries`]. Month bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Only entries of this plan
    pub plan_id: Option<i64>,
    /// Earliest month (`YYYY-MM`)
    pub from_month: Option<String>,
    /// Latest month (`YYYY-MM`)
    pub to_month: Option<String>,
}

async fn find_entry_in_ledger<C>(conn: &C, ledger_id: i64, entry_id: i64) -> Result<entry::Model>
where
    C: ConnectionTrait,
{
    Entry::find_by_id(entry_id)
        .inner_join(Plan)
        .filter(plan::Column::LedgerId.eq(ledger_id))
        .one(conn)
        .await?
        .ok_or(Error::NotFound { resource: "entry" })
}

/// Records an entry against a plan of the caller's ledger.
///
/// For a `one-time` plan the status flips to `completed` in the same transaction as the
/// insert. Recording against an already completed plan is allowed and leaves it
/// completed.
///
/// # Errors
/// * [`Error::NotFound`] if the plan does not belong to the caller's ledger
/// * [`Error::InvalidInput`] / [`Error::InvalidAmount`] for malformed fields
#[instrument(skip(db, new_entry))]
pub async fn record_entry(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    plan_id: i64,
    new_entry: NewEntry,
) -> Result<entry::Model> {
    let month = require_month(&new_entry.month)?;
    let amount = require_amount(new_entry.amount)?;
    let date = new_entry.date.as_deref().map(require_date).transpose()?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let plan = find_plan_in_ledger(&txn, grant.ledger_id, plan_id).await?;

    let created = entry::ActiveModel {
        plan_id: Set(plan.id),
        month: Set(month),
        amount: Set(amount),
        date: Set(date),
        notes: Set(optional_text(new_entry.notes)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if plan.frequency == Frequency::OneTime && plan.status == PlanStatus::Active {
        let mut active: plan::ActiveModel = plan.into();
        active.status = Set(PlanStatus::Completed);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        debug!(plan_id, "One-time plan completed");
    }

    txn.commit().await?;
    info!(entry_id = created.id, "Entry recorded");
    Ok(created)
}

/// Lists the entries of the caller's ledger ordered by month, then by recording order.
pub async fn list_entries(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    filter: EntryFilter,
) -> Result<Vec<entry::Model>> {
    let from_month = filter.from_month.as_deref().map(require_month).transpose()?;
    let to_month = filter.to_month.as_deref().map(require_month).transpose()?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;

    let mut query = Entry::find()
        .inner_join(Plan)
        .filter(plan::Column::LedgerId.eq(grant.ledger_id));
    if let Some(plan_id) = filter.plan_id {
        query = query.filter(entry::Column::PlanId.eq(plan_id));
    }
    if let Some(from_month) = from_month {
        query = query.filter(entry::Column::Month.gte(from_month));
    }
    if let Some(to_month) = to_month {
        query = query.filter(entry::Column::Month.lte(to_month));
    }

    let entries = query
        .order_by_asc(entry::Column::Month)
        .order_by_asc(entry::Column::CreatedAt)
        .order_by_asc(entry::Column::Id)
        .all(&txn)
        .await?;
    txn.commit().await?;
    Ok(entries)
}

/// Fetches one entry of the caller's ledger.
pub async fn get_entry(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    entry_id: i64,
) -> Result<entry::Model> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;
    let entry = find_entry_in_ledger(&txn, grant.ledger_id, entry_id).await?;
    txn.commit().await?;
    Ok(entry)
}

/// Applies a partial update to an entry of the caller's ledger.
#[instrument(skip(db, update))]
pub async fn update_entry(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    entry_id: i64,
    update: EntryUpdate,
) -> Result<entry::Model> {
    let month = update.month.as_deref().map(require_month).transpose()?;
    let amount = update.amount.map(require_amount).transpose()?;
    let date = update
        .date
        .map(|date| date.as_deref().map(require_date).transpose())
        .transpose()?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let existing = find_entry_in_ledger(&txn, grant.ledger_id, entry_id).await?;

    let mut active: entry::ActiveModel = existing.into();
    if let Some(month) = month {
        active.month = Set(month);
    }
    if let Some(amount) = amount {
        active.amount = Set(amount);
    }
    if let Some(date) = date {
        active.date = Set(date);
    }
    if let Some(notes) = update.notes {
        active.notes = Set(optional_text(notes));
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes an entry of the caller's ledger. A completed plan stays completed.
#[instrument(skip(db))]
pub async fn delete_entry(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    entry_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let entry = find_entry_in_ledger(&txn, grant.ledger_id, entry_id).await?;

    Entry::delete_by_id(entry.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{ledger, plan as plans};
    use crate::entities::{CategoryKind, Role};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    async fn count_entries(db: &DatabaseConnection, plan_id: i64) -> Result<u64> {
        Ok(Entry::find()
            .filter(entry::Column::PlanId.eq(plan_id))
            .count(db)
            .await?)
    }

    #[tokio::test]
    async fn test_record_entry_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let caller = Caller::public("anything");

        assert!(matches!(
            record_entry(&db, &caller, 1, NewEntry::new("January", 10.0)).await,
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            record_entry(&db, &caller, 1, NewEntry::new("2025-01", f64::NAN)).await,
            Err(Error::InvalidAmount { .. })
        ));

        let mut bad_date = NewEntry::new("2025-01", 10.0);
        bad_date.date = Some("2025-01-32".to_string());
        assert!(matches!(
            record_entry(&db, &caller, 1, bad_date).await,
            Err(Error::InvalidInput { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_one_time_plan_completes_with_first_entry() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &caller, CategoryKind::Expense, "Laptop", Frequency::OneTime)
            .await?;
        assert_eq!(plan.status, PlanStatus::Active);

        let mut new_entry = NewEntry::new("2025-04", 1499.0);
        new_entry.date = Some("2025-04-12".to_string());
        let recorded = record_entry(&db, &caller, plan.id, new_entry).await?;
        assert_eq!(recorded.plan_id, plan.id);
        assert_eq!(recorded.date.as_deref(), Some("2025-04-12"));

        assert_eq!(count_entries(&db, plan.id).await?, 1);
        let plan = plans::get_plan(&db, &caller, plan.id).await?;
        assert_eq!(plan.status, PlanStatus::Completed);

        // A correction is still accepted and does not reopen the plan
        record_entry(&db, &caller, plan.id, NewEntry::new("2025-04", 20.0)).await?;
        assert_eq!(count_entries(&db, plan.id).await?, 2);
        let plan = plans::get_plan(&db, &caller, plan.id).await?;
        assert_eq!(plan.status, PlanStatus::Completed);

        Ok(())
    }

    #[tokio::test]
    async fn test_recurring_plan_stays_active() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &caller, CategoryKind::Income, "Salary", Frequency::Biweekly)
            .await?;

        record_entry(&db, &caller, plan.id, NewEntry::new("2025-01", 1500.0)).await?;
        record_entry(&db, &caller, plan.id, NewEntry::new("2025-01", 1500.0)).await?;

        let plan = plans::get_plan(&db, &caller, plan.id).await?;
        assert_eq!(plan.status, PlanStatus::Active);

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_completion_rolls_back_entry() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &caller, CategoryKind::Expense, "Sofa", Frequency::OneTime)
            .await?;
        db.execute_unprepared(
            "CREATE TRIGGER fail_plan_update BEFORE UPDATE ON plans
             BEGIN SELECT RAISE(ABORT, 'store unavailable'); END;",
        )
        .await?;

        let result = record_entry(&db, &caller, plan.id, NewEntry::new("2025-05", 700.0)).await;
        assert!(result.is_err());

        assert_eq!(count_entries(&db, plan.id).await?, 0);
        let plan = Plan::find_by_id(plan.id).one(&db).await?.unwrap();
        assert_eq!(plan.status, PlanStatus::Active);

        Ok(())
    }

    #[tokio::test]
    async fn test_plan_from_other_ledger_is_not_found() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let other = create_test_ledger(&db, &owner, "Other").await?;
        let other_caller = Caller::member(principal_of(&owner), other.id);
        let foreign = create_test_plan(&db, &other_caller, CategoryKind::Expense, "Gym", Frequency::Monthly)
            .await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);

        let result = record_entry(&db, &caller, foreign.id, NewEntry::new("2025-01", 30.0)).await;
        assert!(matches!(result, Err(Error::NotFound { resource: "plan" })));
        assert_eq!(count_entries(&db, foreign.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_viewer_cannot_record() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let viewer = create_test_user(&db, "viewer@example.com").await?;
        crate::core::membership::invite_member(
            &db,
            principal_of(&owner),
            ledger.id,
            "viewer@example.com",
            Role::Viewer,
        )
        .await?;
        let owner_caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &owner_caller, CategoryKind::Expense, "Water", Frequency::Monthly)
            .await?;

        let viewer_caller = Caller::member(principal_of(&viewer), ledger.id);
        let result = record_entry(&db, &viewer_caller, plan.id, NewEntry::new("2025-01", 30.0)).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        // Viewers can still read
        assert!(list_entries(&db, &viewer_caller, EntryFilter::default()).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_public_caller_records_entries() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let owner_caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &owner_caller, CategoryKind::Expense, "Trip", Frequency::OneTime)
            .await?;
        ledger::update_ledger(
            &db,
            principal_of(&owner),
            ledger.id,
            ledger::LedgerUpdate {
                is_public: Some(true),
                ..Default::default()
            },
        )
        .await?;

        let public = Caller::public(&ledger.share_id);
        record_entry(&db, &public, plan.id, NewEntry::new("2025-07", 900.0)).await?;

        let plan = plans::get_plan(&db, &public, plan.id).await?;
        assert_eq!(plan.status, PlanStatus::Completed);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_entries_filters_and_order() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let rent = create_test_plan(&db, &caller, CategoryKind::Expense, "Rent", Frequency::Monthly)
            .await?;
        let salary = create_test_plan(&db, &caller, CategoryKind::Income, "Salary", Frequency::Monthly)
            .await?;
        record_entry(&db, &caller, rent.id, NewEntry::new("2025-03", 1200.0)).await?;
        record_entry(&db, &caller, rent.id, NewEntry::new("2025-01", 1200.0)).await?;
        record_entry(&db, &caller, salary.id, NewEntry::new("2025-02", 3000.0)).await?;

        let all = list_entries(&db, &caller, EntryFilter::default()).await?;
        let months: Vec<&str> = all.iter().map(|e| e.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-02", "2025-03"]);

        let rent_only = list_entries(
            &db,
            &caller,
            EntryFilter {
                plan_id: Some(rent.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(rent_only.len(), 2);

        let window = list_entries(
            &db,
            &caller,
            EntryFilter {
                from_month: Some("2025-02".to_string()),
                to_month: Some("2025-03".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].plan_id, salary.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_entry() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &caller, CategoryKind::Expense, "Power", Frequency::Monthly)
            .await?;
        let mut new_entry = NewEntry::new("2025-01", 80.0);
        new_entry.notes = Some("estimated".to_string());
        let recorded = record_entry(&db, &caller, plan.id, new_entry).await?;

        let updated = update_entry(
            &db,
            &caller,
            recorded.id,
            EntryUpdate {
                amount: Some(91.25),
                notes: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.amount, 91.25);
        assert!(updated.notes.is_none());
        assert_eq!(updated.month, "2025-01");

        delete_entry(&db, &caller, recorded.id).await?;
        assert!(matches!(
            get_entry(&db, &caller, recorded.id).await,
            Err(Error::NotFound { resource: "entry" })
        ));

        Ok(())
    }
}

//! Plan business logic - recurring and one-time expected items of a ledger.
//!
//! Plans are reached through a [`Caller`]: members need any role to read and
//! `owner`/`editor` to write; public callers get both through a public share token.
//! A plan id is only ever resolved inside the caller's ledger, so ids from another
//! ledger behave as if they did not exist.

use crate::{
    core::{
        access::{Capability, Caller, authorize},
        validation::{
            optional_text, require_amount, require_day, require_month, require_month_order,
            require_name,
        },
    },
    entities::{Category, Entry, Frequency, Plan, PlanStatus, category, entry, plan},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Input for [`create_plan`].
#[derive(Debug, Clone)]
pub struct NewPlan {
    /// Category of the same ledger
    pub category_id: i64,
    /// Plan name
    pub name: String,
    /// Amount per occurrence
    pub expected_amount: f64,
    /// Occurrence frequency
    pub frequency: Frequency,
    /// Expected day of month
    pub expected_day: Option<i32>,
    /// First month (`YYYY-MM`)
    pub start_month: String,
    /// Last month (`YYYY-MM`)
    pub end_month: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

impl NewPlan {
    /// A plan with the required fields set and no optional ones.
    #[must_use]
    pub fn new(
        category_id: i64,
        name: &str,
        expected_amount: f64,
        frequency: Frequency,
        start_month: &str,
    ) -> Self {
        Self {
            category_id,
            name: name.to_string(),
            expected_amount,
            frequency,
            expected_day: None,
            start_month: start_month.to_string(),
            end_month: None,
            notes: None,
        }
    }
}

/// Fields to change in [`update_plan`].
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct PlanUpdate {
    /// New category (must belong to the same ledger)
    pub category_id: Option<i64>,
    /// New name
    pub name: Option<String>,
    /// New amount
    pub expected_amount: Option<f64>,
    /// New frequency
    pub frequency: Option<Frequency>,
    /// New or cleared expected day
    pub expected_day: Option<Option<i32>>,
    /// New start month
    pub start_month: Option<String>,
    /// New or cleared end month
    pub end_month: Option<Option<String>>,
    /// New or cleared notes
    pub notes: Option<Option<String>>,
}

/// Loads a plan, provided it belongs to `ledger_id`.
pub(crate) async fn find_plan_in_ledger<C>(
    conn: &C,
    ledger_id: i64,
    plan_id: i64,
) -> Result<plan::Model>
where
    C: ConnectionTrait,
{
    Plan::find_by_id(plan_id)
        .filter(plan::Column::LedgerId.eq(ledger_id))
        .one(conn)
        .await?
        .ok_or(Error::NotFound { resource: "plan" })
}

async fn require_category_in_ledger<C>(conn: &C, ledger_id: i64, category_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .filter(category::Column::LedgerId.eq(ledger_id))
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or(Error::NotFound {
            resource: "category",
        })
}

/// Status a plan must have after its frequency changes to `frequency`.
///
/// A `one-time` plan with recorded entries is `completed`; a recurring plan is always
/// `active`. Without a frequency change the status is left alone.
async fn reconciled_status<C>(
    conn: &C,
    existing: &plan::Model,
    frequency: Option<Frequency>,
) -> Result<PlanStatus>
where
    C: ConnectionTrait,
{
    match frequency {
        None => Ok(existing.status),
        Some(Frequency::OneTime) => {
            if existing.status == PlanStatus::Completed {
                return Ok(PlanStatus::Completed);
            }
            let recorded = Entry::find()
                .filter(entry::Column::PlanId.eq(existing.id))
                .count(conn)
                .await?;
            Ok(if recorded > 0 {
                PlanStatus::Completed
            } else {
                PlanStatus::Active
            })
        }
        Some(_) => Ok(PlanStatus::Active),
    }
}

/// Lists the plans of the caller's ledger ordered by name, optionally by status.
pub async fn list_plans(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    status: Option<PlanStatus>,
) -> Result<Vec<plan::Model>> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;

    let mut query = Plan::find().filter(plan::Column::LedgerId.eq(grant.ledger_id));
    if let Some(status) = status {
        query = query.filter(plan::Column::Status.eq(status));
    }
    let plans = query
        .order_by_asc(plan::Column::Name)
        .order_by_asc(plan::Column::Id)
        .all(&txn)
        .await?;

    txn.commit().await?;
    Ok(plans)
}

/// Fetches one plan of the caller's ledger.
pub async fn get_plan(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    plan_id: i64,
) -> Result<plan::Model> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;
    let plan = find_plan_in_ledger(&txn, grant.ledger_id, plan_id).await?;
    txn.commit().await?;
    Ok(plan)
}

/// Creates an `active` plan in the caller's ledger.
///
/// # Errors
/// * [`Error::InvalidInput`] / [`Error::InvalidAmount`] for malformed fields
/// * [`Error::NotFound`] if the category is not part of the caller's ledger
#[instrument(skip(db, new_plan))]
pub async fn create_plan(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    new_plan: NewPlan,
) -> Result<plan::Model> {
    let name = require_name(&new_plan.name, "Plan")?;
    let expected_amount = require_amount(new_plan.expected_amount)?;
    let expected_day = new_plan.expected_day.map(require_day).transpose()?;
    let start_month = require_month(&new_plan.start_month)?;
    let end_month = new_plan
        .end_month
        .as_deref()
        .map(require_month)
        .transpose()?;
    require_month_order(&start_month, end_month.as_deref())?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    require_category_in_ledger(&txn, grant.ledger_id, new_plan.category_id).await?;

    let now = Utc::now();
    let created = plan::ActiveModel {
        ledger_id: Set(grant.ledger_id),
        category_id: Set(new_plan.category_id),
        name: Set(name),
        expected_amount: Set(expected_amount),
        frequency: Set(new_plan.frequency),
        expected_day: Set(expected_day),
        start_month: Set(start_month),
        end_month: Set(end_month),
        status: Set(PlanStatus::Active),
        notes: Set(optional_text(new_plan.notes)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(plan_id = created.id, ledger_id = grant.ledger_id, "Plan created");
    Ok(created)
}

/// Applies a partial update to a plan of the caller's ledger.
///
/// Only the provided fields are written. The status is not set directly: switching to
/// `one-time` completes a plan that already has entries, and switching to a recurring
/// frequency makes the plan `active` again.
#[instrument(skip(db, update))]
pub async fn update_plan(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    plan_id: i64,
    update: PlanUpdate,
) -> Result<plan::Model> {
    let name = update
        .name
        .as_deref()
        .map(|n| require_name(n, "Plan"))
        .transpose()?;
    let expected_amount = update.expected_amount.map(require_amount).transpose()?;
    let expected_day = update
        .expected_day
        .map(|day| day.map(require_day).transpose())
        .transpose()?;
    let start_month = update
        .start_month
        .as_deref()
        .map(require_month)
        .transpose()?;
    let end_month = update
        .end_month
        .map(|end| end.as_deref().map(require_month).transpose())
        .transpose()?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let existing = find_plan_in_ledger(&txn, grant.ledger_id, plan_id).await?;

    let effective_start = start_month.as_deref().unwrap_or(&existing.start_month);
    let effective_end = match &end_month {
        Some(end) => end.as_deref(),
        None => existing.end_month.as_deref(),
    };
    require_month_order(effective_start, effective_end)?;

    if let Some(category_id) = update.category_id {
        require_category_in_ledger(&txn, grant.ledger_id, category_id).await?;
    }

    let previous_status = existing.status;
    let status = reconciled_status(&txn, &existing, update.frequency).await?;

    let mut active: plan::ActiveModel = existing.into();
    if status != previous_status {
        active.status = Set(status);
    }
    if let Some(category_id) = update.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(expected_amount) = expected_amount {
        active.expected_amount = Set(expected_amount);
    }
    if let Some(frequency) = update.frequency {
        active.frequency = Set(frequency);
    }
    if let Some(expected_day) = expected_day {
        active.expected_day = Set(expected_day);
    }
    if let Some(start_month) = start_month {
        active.start_month = Set(start_month);
    }
    if let Some(end_month) = end_month {
        active.end_month = Set(end_month);
    }
    if let Some(notes) = update.notes {
        active.notes = Set(optional_text(notes));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes a plan and its entries.
#[instrument(skip(db))]
pub async fn delete_plan(db: &DatabaseConnection, caller: &Caller<'_>, plan_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let plan = find_plan_in_ledger(&txn, grant.ledger_id, plan_id).await?;

    Entry::delete_many()
        .filter(entry::Column::PlanId.eq(plan.id))
        .exec(&txn)
        .await?;
    Plan::delete_by_id(plan.id).exec(&txn).await?;

    txn.commit().await?;
    info!("Plan deleted");
    Ok(())
}

//! Monthly cashflow summary.
//!
//! Aggregates realized entries per month and carries a running balance seeded from the
//! ledger's `starting_balance` setting. Entries recorded before the first month of the
//! range still count towards the opening balance.

use crate::{
    core::{
        access::{Capability, Caller, authorize},
        setting::starting_balance,
        validation::require_month,
    },
    entities::{Category, CategoryKind, Entry, Plan, entry, plan},
    errors::{Error, Result},
};
use chrono::{Months, NaiveDate};
use sea_orm::{TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Longest range a single summary may cover.
pub const MAX_SUMMARY_MONTHS: usize = 120;

/// Realized totals for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    /// Month (`YYYY-MM`)
    pub month: String,
    /// Sum of entries in income categories
    pub income: f64,
    /// Sum of entries in expense categories
    pub expense: f64,
    /// `income - expense`
    pub net: f64,
    /// Balance at the end of the month
    pub balance: f64,
}

fn month_start(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|e| Error::invalid_input(format!("invalid month {month:?}: {e}")))
}

/// Lists every month from `from` to `to`, both inclusive.
fn months_between(from: &str, to: &str) -> Result<Vec<String>> {
    let mut current = month_start(from)?;
    let last = month_start(to)?;
    if current > last {
        return Err(Error::invalid_input(format!(
            "range start {from} is after range end {to}"
        )));
    }

    let mut months = Vec::new();
    while current <= last {
        if months.len() == MAX_SUMMARY_MONTHS {
            return Err(Error::invalid_input(format!(
                "summary range cannot exceed {MAX_SUMMARY_MONTHS} months"
            )));
        }
        months.push(current.format("%Y-%m").to_string());
        current = current
            .checked_add_months(Months::new(1))
            .ok_or_else(|| Error::invalid_input("month out of range"))?;
    }
    Ok(months)
}

/// Summarizes the caller's ledger for each month in `from..=to`.
///
/// # Errors
/// * [`Error::InvalidInput`] for malformed months, a reversed range, or a range longer
///   than [`MAX_SUMMARY_MONTHS`]
#[instrument(skip(db))]
pub async fn monthly_summary(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    from: &str,
    to: &str,
) -> Result<Vec<MonthSummary>> {
    let from = require_month(from)?;
    let to = require_month(to)?;
    let months = months_between(&from, &to)?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;
    let opening = starting_balance(&txn, grant.ledger_id).await?;

    let kinds: HashMap<i64, CategoryKind> = Plan::find()
        .filter(plan::Column::LedgerId.eq(grant.ledger_id))
        .find_also_related(Category)
        .all(&txn)
        .await?
        .into_iter()
        .filter_map(|(plan, category)| category.map(|c| (plan.id, c.kind)))
        .collect();

    let entries = Entry::find()
        .inner_join(Plan)
        .filter(plan::Column::LedgerId.eq(grant.ledger_id))
        .filter(entry::Column::Month.lte(to.as_str()))
        .all(&txn)
        .await?;
    txn.commit().await?;

    let signed = |e: &entry::Model| match kinds.get(&e.plan_id) {
        Some(CategoryKind::Income) => e.amount,
        Some(CategoryKind::Expense) => -e.amount,
        None => 0.0,
    };

    let mut balance = opening
        + entries
            .iter()
            .filter(|e| e.month < from)
            .map(signed)
            .sum::<f64>();

    let mut per_month: HashMap<&str, (f64, f64)> = HashMap::new();
    for e in entries.iter().filter(|e| e.month >= from) {
        let totals = per_month.entry(e.month.as_str()).or_default();
        match kinds.get(&e.plan_id) {
            Some(CategoryKind::Income) => totals.0 += e.amount,
            Some(CategoryKind::Expense) => totals.1 += e.amount,
            None => {}
        }
    }

    let summary = months
        .into_iter()
        .map(|month| {
            let (income, expense) = per_month.get(month.as_str()).copied().unwrap_or_default();
            let net = income - expense;
            balance += net;
            MonthSummary {
                month,
                income,
                expense,
                net,
                balance,
            }
        })
        .collect::<Vec<_>>();

    debug!(months = summary.len(), "Summary computed");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{
        entry::{NewEntry, record_entry},
        setting::upsert_setting,
    };
    use crate::config::defaults::STARTING_BALANCE_KEY;
    use crate::entities::Frequency;
    use crate::test_utils::*;

    #[test]
    fn test_months_between() -> Result<()> {
        assert_eq!(months_between("2024-11", "2025-02")?, vec![
            "2024-11", "2024-12", "2025-01", "2025-02"
        ]);
        assert_eq!(months_between("2025-05", "2025-05")?, vec!["2025-05"]);
        assert!(matches!(
            months_between("2025-05", "2025-04"),
            Err(Error::InvalidInput { .. })
        ));
        assert_eq!(months_between("2015-01", "2024-12")?.len(), MAX_SUMMARY_MONTHS);
        assert!(months_between("2015-01", "2025-01").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_summary_running_balance() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        upsert_setting(&db, &caller, STARTING_BALANCE_KEY, "1000").await?;

        let salary = create_test_plan(&db, &caller, CategoryKind::Income, "Salary", Frequency::Monthly)
            .await?;
        let rent = create_test_plan(&db, &caller, CategoryKind::Expense, "Rent", Frequency::Monthly)
            .await?;

        // Before the range: only moves the opening balance
        record_entry(&db, &caller, rent.id, NewEntry::new("2024-12", 500.0)).await?;
        record_entry(&db, &caller, salary.id, NewEntry::new("2025-01", 3000.0)).await?;
        record_entry(&db, &caller, rent.id, NewEntry::new("2025-01", 1200.0)).await?;
        record_entry(&db, &caller, rent.id, NewEntry::new("2025-03", 1200.0)).await?;
        // After the range: ignored
        record_entry(&db, &caller, salary.id, NewEntry::new("2025-04", 3000.0)).await?;

        let summary = monthly_summary(&db, &caller, "2025-01", "2025-03").await?;
        assert_eq!(summary.len(), 3);

        assert_eq!(summary[0].month, "2025-01");
        assert_eq!(summary[0].income, 3000.0);
        assert_eq!(summary[0].expense, 1200.0);
        assert_eq!(summary[0].net, 1800.0);
        assert_eq!(summary[0].balance, 2300.0);

        assert_eq!(summary[1].month, "2025-02");
        assert_eq!(summary[1].net, 0.0);
        assert_eq!(summary[1].balance, 2300.0);

        assert_eq!(summary[2].expense, 1200.0);
        assert_eq!(summary[2].balance, 1100.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_summary_rejects_reversed_range() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);

        let result = monthly_summary(&db, &caller, "2025-03", "2025-01").await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_summary_requires_membership() -> Result<()> {
        let (db, _owner, ledger) = setup_with_ledger().await?;
        let stranger = create_test_user(&db, "stranger@example.com").await?;
        let caller = Caller::member(principal_of(&stranger), ledger.id);

        let result = monthly_summary(&db, &caller, "2025-01", "2025-01").await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        Ok(())
    }
}

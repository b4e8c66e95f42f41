//! Input shape checks shared by the core operations.
//!
//! All checks run before a transaction is opened.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Trims a name and rejects it if nothing is left.
pub(crate) fn require_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(format!("{what} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Accepts finite, non-negative amounts.
pub(crate) fn require_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Accepts `YYYY-MM` with a real month.
pub(crate) fn require_month(month: &str) -> Result<String> {
    let valid = month.len() == 7
        && NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok();
    if !valid {
        return Err(Error::invalid_input(format!(
            "month must be formatted as YYYY-MM, got {month:?}"
        )));
    }
    Ok(month.to_string())
}

/// Accepts `YYYY-MM-DD` calendar dates.
pub(crate) fn require_date(date: &str) -> Result<String> {
    let valid = date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
    if !valid {
        return Err(Error::invalid_input(format!(
            "date must be formatted as YYYY-MM-DD, got {date:?}"
        )));
    }
    Ok(date.to_string())
}

/// Accepts a day of month between 1 and 31.
pub(crate) fn require_day(day: i32) -> Result<i32> {
    if !(1..=31).contains(&day) {
        return Err(Error::invalid_input(format!(
            "expected day must be between 1 and 31, got {day}"
        )));
    }
    Ok(day)
}

/// Rejects an end month that falls before the start month.
pub(crate) fn require_month_order(start: &str, end: Option<&str>) -> Result<()> {
    match end {
        // YYYY-MM compares correctly as a string
        Some(end) if end < start => Err(Error::invalid_input(format!(
            "end month {end} is before start month {start}"
        ))),
        _ => Ok(()),
    }
}

/// Maps blank optional text to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

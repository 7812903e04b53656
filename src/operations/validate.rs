use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted amount (one trillion). Keeps sums over millions of records,
/// and the percentage arithmetic on them, far from `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

pub fn parse_amount(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed).map_err(|_| LedgerError::InvalidAmount {
        input: trimmed.to_string(),
        reason: "please enter a number".to_string(),
    })?;
    check_amount(amount)?;
    Ok(amount)
}

pub fn check_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            input: amount.to_string(),
            reason: "amount must be positive".to_string(),
        });
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::InvalidAmount {
            input: amount.to_string(),
            reason: format!("amount must not exceed {MAX_AMOUNT}"),
        });
    }
    Ok(())
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| LedgerError::InvalidDate(trimmed.to_string()))
}

/// Returns the trimmed category, rejecting blank input.
pub fn check_category(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyCategory);
    }
    Ok(trimmed.to_string())
}

/// Parses `YYYY-MM` into a year and month.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), DATE_FORMAT)
        .map(|d| (d.year(), d.month()))
        .map_err(|_| LedgerError::InvalidDate(trimmed.to_string()))
}

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::db::ledger::Ledger;
use crate::error::Result;
use crate::models::expense::{Expense, ExpenseDraft};
use crate::operations::validate;

/// Validates a draft and turns it into an expense stamped with `now`.
pub fn create_expense(draft: &ExpenseDraft, today: NaiveDate, now: NaiveDateTime) -> Result<Expense> {
    let amount = validate::parse_amount(&draft.amount)?;
    let category = validate::check_category(&draft.category)?;
    let date = match draft.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => validate::parse_date(raw)?,
        _ => today,
    };
    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    Ok(Expense::new(amount, category, date, description, now))
}

/// Appends a new expense and saves the ledger. If saving fails the expense
/// stays in memory and the storage error is returned.
pub fn add_expense(ledger: &mut Ledger, draft: &ExpenseDraft) -> Result<Expense> {
    let now = Local::now().naive_local();
    let expense = create_expense(draft, now.date(), now)?;
    ledger.push(expense.clone());
    tracing::debug!(amount = %expense.amount, category = %expense.category, "expense added");
    ledger.flush()?;
    Ok(expense)
}

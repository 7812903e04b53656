use std::fs::File;
use std::path::Path;

use chrono::{Local, NaiveDateTime};

use super::add::create_expense;
use crate::db::ledger::Ledger;
use crate::error::{LedgerError, Result};
use crate::models::expense::{Expense, ExpenseDraft};

/// Appends every row of a `date,description,amount,category[,timestamp]` CSV.
/// A leading header row, as written by [`export_expenses`], is skipped.
/// Either all rows are added with a single save, or none are.
pub fn import_expenses(ledger: &mut Ledger, path: &Path) -> Result<usize> {
    let expenses = import_csv(path)?;
    let count = expenses.len();
    for expense in expenses {
        ledger.push(expense);
    }
    tracing::info!(count, path = %path.display(), "imported expenses");
    ledger.flush()?;
    Ok(count)
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn import_csv(path: &Path) -> Result<Vec<Expense>> {
    let file = File::open(path).map_err(|source| LedgerError::InputFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let now = Local::now().naive_local();
    let mut expenses = Vec::new();

    for (line_index, result) in reader.records().enumerate() {
        let line = line_index + 1;
        let record = result.map_err(|e| LedgerError::Import {
            line,
            reason: e.to_string(),
        })?;

        if line == 1 && record.get(0).is_some_and(|f| f.eq_ignore_ascii_case("date")) {
            continue;
        }
        if !(4..=5).contains(&record.len()) {
            return Err(LedgerError::Import {
                line,
                reason: format!("expected 4 or 5 columns, got {}", record.len()),
            });
        }

        let draft = ExpenseDraft {
            date: record.get(0).map(str::to_string),
            description: record.get(1).map(str::to_string),
            amount: record.get(2).unwrap_or_default().to_string(),
            category: record.get(3).unwrap_or_default().to_string(),
        };
        let timestamp = match record.get(4).filter(|raw| !raw.is_empty()) {
            Some(raw) => NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| {
                LedgerError::Import {
                    line,
                    reason: format!("Invalid timestamp '{raw}'. Please use YYYY-MM-DDTHH:MM:SS."),
                }
            })?,
            None => now,
        };
        let expense =
            create_expense(&draft, now.date(), timestamp).map_err(|e| LedgerError::Import {
                line,
                reason: e.to_string(),
            })?;
        expenses.push(expense);
    }

    Ok(expenses)
}

/// Writes the listing as CSV with a header row, in store order.
pub fn export_expenses(ledger: &Ledger, path: &Path) -> Result<usize> {
    let failure = |e: csv::Error| LedgerError::PersistenceFailure {
        path: path.to_path_buf(),
        source: e.into(),
    };

    let mut writer = csv::Writer::from_path(path).map_err(failure)?;
    writer
        .write_record(["date", "description", "amount", "category", "timestamp"])
        .map_err(failure)?;

    let mut count = 0;
    for expense in ledger.expenses() {
        writer
            .write_record([
                expense.date.format("%Y-%m-%d").to_string(),
                expense.description.clone(),
                expense.amount.to_string(),
                expense.category.clone(),
                expense.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ])
            .map_err(failure)?;
        count += 1;
    }
    writer.flush().map_err(|source| LedgerError::PersistenceFailure {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(count, path = %path.display(), "exported expenses");
    Ok(count)
}

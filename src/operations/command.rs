use std::path::PathBuf;

use chrono::{Duration, Local, NaiveDate};

use crate::db::ledger::Ledger;
use crate::error::{Field, LedgerError, Result};
use crate::models::expense::{Expense, ExpenseDraft};
use crate::models::summary::{
    CategorySummary, DailySummary, Granularity, MonthlySummary, NumberedExpense, OverallSummary,
    PeriodStats, SearchResult, StatisticsReport, WeeklySummary,
};
use crate::operations::filter::{ExpenseFilter, search_expenses};
use crate::operations::receipt::{ReceiptScanner, ReceiptSuggestion};
use crate::operations::report::{ChartRenderer, build_trend};
use crate::operations::{add, edit, import, remove, summary};

/// Every operation the front ends can request, with arguments already parsed.
/// Expense numbers are 1-based positions in the current listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(ExpenseDraft),
    Edit {
        number: usize,
        field: Field,
        value: String,
    },
    Delete {
        number: usize,
    },
    ViewAll,
    CategorySummary,
    OverallSummary,
    DailySummary {
        date: NaiveDate,
    },
    WeeklySummary {
        anchor: NaiveDate,
    },
    MonthlySummary {
        year: i32,
        month: u32,
    },
    Periods(Granularity),
    Statistics,
    Search(ExpenseFilter),
    Chart {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    ScanReceipt {
        path: PathBuf,
    },
    Import {
        path: PathBuf,
    },
    Export {
        path: PathBuf,
    },
}

/// Structured results for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Added(Expense),
    Edited {
        number: usize,
        field: Field,
        expense: Expense,
    },
    Deleted {
        number: usize,
        expense: Expense,
    },
    Listing(Vec<NumberedExpense>),
    Categories(CategorySummary),
    Overall(OverallSummary),
    Daily(DailySummary),
    Weekly(WeeklySummary),
    Monthly(MonthlySummary),
    Periods {
        granularity: Granularity,
        stats: Vec<PeriodStats>,
    },
    Statistics(StatisticsReport),
    Search(SearchResult),
    ChartShown,
    Suggestion(ReceiptSuggestion),
    Imported(usize),
    Exported {
        count: usize,
        path: PathBuf,
    },
}

/// Owns the ledger and the optional capabilities for one process run.
pub struct Session {
    ledger: Ledger,
    charts: Box<dyn ChartRenderer>,
    scanner: Box<dyn ReceiptScanner>,
}

impl Session {
    pub fn new(
        ledger: Ledger,
        charts: Box<dyn ChartRenderer>,
        scanner: Box<dyn ReceiptScanner>,
    ) -> Self {
        Self {
            ledger,
            charts,
            scanner,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(?command, "executing command");
        match command {
            Command::Add(draft) => self.handle_add(&draft),
            Command::Edit {
                number,
                field,
                value,
            } => self.handle_edit(number, field, &value),
            Command::Delete { number } => self.handle_delete(number),
            Command::ViewAll => Ok(Outcome::Listing(self.listing())),
            Command::CategorySummary => Ok(Outcome::Categories(summary::category_summary(
                self.ledger.expenses(),
            ))),
            Command::OverallSummary => Ok(Outcome::Overall(summary::overall_summary(
                self.ledger.expenses(),
            ))),
            Command::DailySummary { date } => Ok(Outcome::Daily(summary::daily_summary(
                self.ledger.expenses(),
                date,
            ))),
            Command::WeeklySummary { anchor } => Ok(Outcome::Weekly(summary::weekly_summary(
                self.ledger.expenses(),
                anchor,
            ))),
            Command::MonthlySummary { year, month } => Ok(Outcome::Monthly(
                summary::monthly_summary(self.ledger.expenses(), year, month),
            )),
            Command::Periods(granularity) => Ok(Outcome::Periods {
                granularity,
                stats: summary::period_breakdown(self.ledger.expenses(), granularity),
            }),
            Command::Statistics => Ok(Outcome::Statistics(summary::statistics(
                self.ledger.expenses(),
            ))),
            Command::Search(filter) => Ok(Outcome::Search(search_expenses(
                self.ledger.expenses(),
                &filter,
            ))),
            Command::Chart { from, to } => self.handle_chart(from, to),
            Command::ScanReceipt { path } => {
                Ok(Outcome::Suggestion(self.scanner.scan(&path)?))
            }
            Command::Import { path } => Ok(Outcome::Imported(import::import_expenses(
                &mut self.ledger,
                &path,
            )?)),
            Command::Export { path } => {
                let count = import::export_expenses(&self.ledger, &path)?;
                Ok(Outcome::Exported { count, path })
            }
        }
    }

    /// The full listing in store order, numbered from 1.
    pub fn listing(&self) -> Vec<NumberedExpense> {
        self.ledger
            .expenses()
            .enumerate()
            .map(|(index, expense)| NumberedExpense {
                number: index + 1,
                expense: expense.clone(),
            })
            .collect()
    }

    fn handle_add(&mut self, draft: &ExpenseDraft) -> Result<Outcome> {
        add::add_expense(&mut self.ledger, draft).map(Outcome::Added)
    }

    fn handle_edit(&mut self, number: usize, field: Field, value: &str) -> Result<Outcome> {
        let index = self.index_of(number)?;
        let expense = edit::edit_expense(&mut self.ledger, index, field, value)?;
        Ok(Outcome::Edited {
            number,
            field,
            expense,
        })
    }

    fn handle_delete(&mut self, number: usize) -> Result<Outcome> {
        let index = self.index_of(number)?;
        let expense = remove::delete_expense(&mut self.ledger, index)?;
        Ok(Outcome::Deleted { number, expense })
    }

    /// Defaults to the span of recorded expenses, or the last 30 days when empty.
    fn handle_chart(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Outcome> {
        let today = Local::now().date_naive();
        let earliest = self.ledger.expenses().map(|e| e.date).min();
        let latest = self.ledger.expenses().map(|e| e.date).max();

        let to = to.unwrap_or_else(|| latest.map_or(today, |l| l.max(today)));
        let from = from.unwrap_or_else(|| earliest.unwrap_or(to - Duration::days(29)));

        let report = build_trend(self.ledger.expenses(), from, to)?;
        self.charts.render(&report)?;
        Ok(Outcome::ChartShown)
    }

    /// 1-based listing number to 0-based index; 0 is never valid.
    fn index_of(&self, number: usize) -> Result<usize> {
        number
            .checked_sub(1)
            .ok_or(LedgerError::IndexOutOfRange {
                index: number,
                len: self.ledger.len(),
            })
    }
}

use std::fmt::Write;

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::expense::Expense;
use crate::models::summary::{
    CategorySummary, DailySummary, Granularity, MonthlySummary, NumberedExpense, OverallSummary,
    PeriodStats, SearchResult, StatisticsReport, WeeklySummary,
};
use crate::operations::command::Outcome;
use crate::operations::receipt::ReceiptSuggestion;

/// Text rendering of command results. `currency` prefixes every amount.
pub struct Presenter<'a> {
    currency: &'a str,
}

impl<'a> Presenter<'a> {
    pub fn new(currency: &'a str) -> Self {
        Self { currency }
    }

    /// Currency symbol and two decimals, no padding.
    fn money(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.currency, amount.round_dp(2))
    }

    /// Right-aligned for table columns.
    fn money_column(&self, amount: Decimal) -> String {
        format!("{}{:>10}", self.currency, format!("{:.2}", amount.round_dp(2)))
    }

    pub fn outcome(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Added(expense) => format!(
                "✓ Expense added: {} in {} on {}",
                self.money(expense.amount),
                expense.category,
                expense.date
            ),
            Outcome::Edited { number, field, .. } => {
                format!("✓ Expense {number}: {} updated!", field.name())
            }
            Outcome::Deleted { expense, .. } => format!(
                "✓ Deleted: {} from {} on {}",
                self.money(expense.amount),
                expense.category,
                expense.date
            ),
            Outcome::Listing(rows) => self.listing(rows),
            Outcome::Categories(summary) => self.categories("Spending by Category", summary),
            Outcome::Overall(summary) => self.overall(summary),
            Outcome::Daily(summary) => self.daily(summary),
            Outcome::Weekly(summary) => self.weekly(summary),
            Outcome::Monthly(summary) => self.monthly(summary),
            Outcome::Periods { granularity, stats } => self.periods(*granularity, stats),
            Outcome::Statistics(report) => self.statistics(report),
            Outcome::Search(result) => self.search(result),
            Outcome::ChartShown => String::new(),
            Outcome::Suggestion(suggestion) => self.suggestion(suggestion),
            Outcome::Imported(count) => format!("✓ Imported {count} expense(s)."),
            Outcome::Exported { count, path } => {
                format!("✓ Exported {count} expense(s) to {}", path.display())
            }
        }
    }

    fn row(&self, number: usize, expense: &Expense) -> String {
        format!(
            "  {:>3}. {}  {:<15} {}  {}",
            number,
            expense.date,
            expense.category,
            self.money_column(expense.amount),
            expense.description
        )
    }

    pub fn listing(&self, rows: &[NumberedExpense]) -> String {
        if rows.is_empty() {
            return "❌ No expenses recorded yet.".to_string();
        }
        let mut out = String::from("\n--- All Expenses ---\n");
        for row in rows {
            let _ = writeln!(out, "{}", self.row(row.number, &row.expense));
        }
        out
    }

    pub fn categories(&self, title: &str, summary: &CategorySummary) -> String {
        if summary.categories.is_empty() {
            return "❌ No expenses recorded yet.".to_string();
        }
        let mut out = format!("\n--- {title} ---\n");
        for category in &summary.categories {
            let _ = writeln!(
                out,
                "  {:<15} {} ({:>5.1}%)  {} txn, avg {}",
                category.category,
                self.money_column(category.total),
                category.percentage.round_dp(1),
                category.count,
                self.money(category.average())
            );
        }
        let _ = writeln!(out, "  {}", "-".repeat(40));
        let _ = writeln!(
            out,
            "  {:<15} {} ({:>5.1}%)",
            "TOTAL",
            self.money_column(summary.grand_total),
            Decimal::ONE_HUNDRED
        );
        out
    }

    pub fn overall(&self, summary: &OverallSummary) -> String {
        let optional = |value: Option<Decimal>| match value {
            Some(v) => self.money(v),
            None => "n/a".to_string(),
        };
        let mut out = String::from("\n--- Overall Spending Summary ---\n");
        let _ = writeln!(out, "  Total Spending:     {}", self.money(summary.total));
        let _ = writeln!(out, "  Number of Expenses: {}", summary.count);
        let _ = writeln!(out, "  Average Expense:    {}", optional(summary.average));
        let _ = writeln!(out, "  Highest Expense:    {}", optional(summary.highest));
        let _ = writeln!(out, "  Lowest Expense:     {}", optional(summary.lowest));
        out
    }

    pub fn daily(&self, summary: &DailySummary) -> String {
        if summary.expenses.is_empty() {
            return format!("❌ No expenses found for {}", summary.date);
        }
        let mut sorted: Vec<&Expense> = summary.expenses.iter().collect();
        sorted.sort_by(|a, b| b.amount.cmp(&a.amount));

        let mut out = format!("\n--- Expenses for {} ---\n", summary.date);
        for expense in sorted {
            let _ = writeln!(
                out,
                "  {:<15} {} - {}",
                expense.category,
                self.money_column(expense.amount),
                expense.description
            );
        }
        let _ = writeln!(out, "  {}", "-".repeat(50));
        let _ = writeln!(out, "  {:<15} {}", "DAILY TOTAL", self.money_column(summary.total));
        out
    }

    pub fn weekly(&self, summary: &WeeklySummary) -> String {
        let mut out = format!(
            "\n--- Weekly Summary ({} to {}) ---\n",
            summary.start, summary.end
        );
        for day in &summary.days {
            let _ = writeln!(
                out,
                "  {} {}: {}",
                day.date.format("%a"),
                day.date,
                self.money_column(day.total)
            );
        }
        let _ = writeln!(out, "  {}", "-".repeat(30));
        let _ = writeln!(out, "  {:<15} {}", "WEEKLY TOTAL", self.money_column(summary.total));
        out
    }

    pub fn monthly(&self, summary: &MonthlySummary) -> String {
        let label = format!("{}-{:02}", summary.year, summary.month);
        if summary.count == 0 {
            return format!("❌ No expenses found for {label}");
        }
        let mut out = format!("\n--- Monthly Summary ({label}) ---\n");
        let _ = writeln!(out, "  Total Expenses: {}", summary.count);
        out.push_str(&self.categories("By Category", &summary.categories));
        out
    }

    pub fn periods(&self, granularity: Granularity, stats: &[PeriodStats]) -> String {
        if stats.is_empty() {
            return "❌ No expenses recorded yet.".to_string();
        }
        let name = match granularity {
            Granularity::Daily => "Date",
            Granularity::Weekly => "Week",
            Granularity::Monthly => "Month",
            Granularity::Quarterly => "Quarter",
            Granularity::Yearly => "Year",
        };
        let mut out = format!(
            "\n  {:<12} {:>12} {:>6} {:>12} {:>12} {:>12}\n",
            name, "Total", "Count", "Average", "Min", "Max"
        );
        for period in stats {
            let _ = writeln!(
                out,
                "  {:<12} {:>12} {:>6} {:>12} {:>12} {:>12}",
                period.label,
                self.money(period.total),
                period.count,
                self.money(period.average),
                self.money(period.min),
                self.money(period.max)
            );
        }
        out
    }

    pub fn statistics(&self, report: &StatisticsReport) -> String {
        if report.categories.is_empty() {
            return "❌ No data available for statistics.".to_string();
        }
        let mut out = String::from("\n--- Top Spending Categories ---\n");
        for (rank, (category, total)) in report.top_categories.iter().enumerate() {
            let _ = writeln!(out, "  {}. {:<15} {}", rank + 1, category, self.money_column(*total));
        }

        out.push_str("\n--- Spending Distribution ---\n");
        for band in &report.distribution {
            let upper = match band.upper {
                Some(upper) => format!("up to {}", self.money(upper)),
                None => "above".to_string(),
            };
            let _ = writeln!(out, "  {:<7} {:<22} {:>5} expense(s)", band.label, upper, band.count);
        }

        out.push_str("\n--- Category Analysis ---\n");
        let _ = writeln!(
            out,
            "  {:<15} {:>12} {:>6} {:>12} {:>12} {:>12} {:>12}",
            "Category", "Total", "Txns", "Mean", "Min", "Max", "Std Dev"
        );
        for stats in &report.categories {
            let std_dev = stats
                .std_dev
                .map_or_else(|| "-".to_string(), |d| self.money(d));
            let _ = writeln!(
                out,
                "  {:<15} {:>12} {:>6} {:>12} {:>12} {:>12} {:>12}",
                stats.category,
                self.money(stats.total),
                stats.count,
                self.money(stats.mean),
                self.money(stats.min),
                self.money(stats.max),
                std_dev
            );
        }
        out
    }

    pub fn search(&self, result: &SearchResult) -> String {
        if result.matches.is_empty() {
            return "❌ No expenses match the filter.".to_string();
        }
        let mut out = String::from("\n--- Matching Expenses ---\n");
        for row in &result.matches {
            let _ = writeln!(out, "{}", self.row(row.number, &row.expense));
        }
        let _ = writeln!(out, "  {}", "-".repeat(50));
        let _ = writeln!(out, "  Total:   {}", self.money(result.total));
        let _ = writeln!(out, "  Count:   {}", result.matches.len());
        if let Some(average) = result.average {
            let _ = writeln!(out, "  Average: {}", self.money(average));
        }
        out
    }

    pub fn suggestion(&self, suggestion: &ReceiptSuggestion) -> String {
        let or_blank = |value: Option<String>| value.unwrap_or_else(|| "(not found)".to_string());
        let mut out = String::from("\n--- Receipt Suggestions ---\n");
        let _ = writeln!(out, "  Amount:      {}", or_blank(suggestion.amount.map(|a| a.to_string())));
        let _ = writeln!(out, "  Date:        {}", or_blank(suggestion.date.map(|d| d.to_string())));
        let _ = writeln!(out, "  Category:    {}", or_blank(suggestion.category.clone()));
        let _ = writeln!(out, "  Description: {}", or_blank(suggestion.description.clone()));
        out
    }

    /// Separates "re-enter" problems from storage and environment problems.
    pub fn error(&self, err: &LedgerError) -> String {
        if err.is_input_error() {
            match err.field() {
                Some(field) => format!("❌ {err} Please re-enter the {}.", field.name()),
                None => format!("❌ {err}"),
            }
        } else {
            match err {
                LedgerError::PersistenceFailure { .. } | LedgerError::CorruptData { .. } => {
                    format!("❌ Storage problem: {err}")
                }
                _ => format!("❌ {err}"),
            }
        }
    }
}

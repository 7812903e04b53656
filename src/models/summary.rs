use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::expense::Expense;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    /// Unrounded share of the grand total, 0..=100.
    pub percentage: Decimal,
}

impl CategoryTotal {
    pub fn average(&self) -> Decimal {
        if self.count == 0 {
            Decimal::ZERO
        } else {
            self.total / Decimal::from(self.count)
        }
    }
}

/// Category totals ordered by category name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategorySummary {
    pub categories: Vec<CategoryTotal>,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallSummary {
    pub total: Decimal,
    pub count: usize,
    pub average: Option<Decimal>,
    pub highest: Option<Decimal>,
    pub lowest: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub expenses: Vec<Expense>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Monday to Sunday, always seven days.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayTotal>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub count: usize,
    pub categories: CategorySummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodStats {
    pub label: String,
    pub total: Decimal,
    pub count: usize,
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

/// Per-category descriptive statistics. `std_dev` is the sample standard
/// deviation and is absent for single-expense categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    pub mean: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub std_dev: Option<Decimal>,
}

/// How many expenses fall into one amount quantile band.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountBand {
    pub label: &'static str,
    pub upper: Option<Decimal>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatisticsReport {
    /// At most five categories, largest total first.
    pub top_categories: Vec<(String, Decimal)>,
    pub distribution: Vec<AmountBand>,
    /// Ordered by category name.
    pub categories: Vec<CategoryStats>,
}

/// A listing row: the expense plus its 1-based position in the full listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedExpense {
    pub number: usize,
    pub expense: Expense,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub matches: Vec<NumberedExpense>,
    pub total: Decimal,
    pub average: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Per-category totals, largest first.
    pub totals: Vec<(String, Decimal)>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bucket_days: i64,
    pub buckets: Vec<TrendBucket>,
    /// Totals over the whole range, largest first.
    pub category_totals: Vec<(String, Decimal)>,
    pub total: Decimal,
}

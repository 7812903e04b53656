use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::models::expense::Expense;
use crate::models::summary::{
    AmountBand, CategoryStats, CategorySummary, CategoryTotal, DailySummary, DayTotal,
    Granularity, MonthlySummary, OverallSummary, PeriodStats, StatisticsReport, WeeklySummary,
};

const TOP_CATEGORIES: usize = 5;

/// Share of `part` in `whole` as a percentage; 0 when `whole` is 0.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part * Decimal::ONE_HUNDRED / whole
    }
}

/// Totals per category, ordered by category name.
pub fn category_summary<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> CategorySummary {
    let mut groups: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for expense in expenses {
        let entry = groups
            .entry(expense.category.as_str())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let grand_total = groups.values().fold(Decimal::ZERO, |acc, (total, _)| acc + *total);
    let categories = groups
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
            percentage: percentage(total, grand_total),
        })
        .collect();

    CategorySummary {
        categories,
        grand_total,
    }
}

pub fn overall_summary<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> OverallSummary {
    let mut summary = OverallSummary::default();
    for expense in expenses {
        summary.total += expense.amount;
        summary.count += 1;
        summary.highest = Some(summary.highest.map_or(expense.amount, |h| h.max(expense.amount)));
        summary.lowest = Some(summary.lowest.map_or(expense.amount, |l| l.min(expense.amount)));
    }
    if summary.count > 0 {
        summary.average = Some(summary.total / Decimal::from(summary.count));
    }
    summary
}

pub fn daily_summary<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    date: NaiveDate,
) -> DailySummary {
    let expenses: Vec<Expense> = expenses
        .into_iter()
        .filter(|e| e.date == date)
        .cloned()
        .collect();
    let total = expenses.iter().map(|e| e.amount).sum();
    DailySummary {
        date,
        expenses,
        total,
    }
}

/// The Monday that starts the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Per-day totals for the Monday-to-Sunday week containing `anchor`.
pub fn weekly_summary<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    anchor: NaiveDate,
) -> WeeklySummary {
    let start = week_start(anchor);
    let end = start + Duration::days(6);

    let mut days: Vec<DayTotal> = (0..7)
        .map(|offset| DayTotal {
            date: start + Duration::days(offset),
            total: Decimal::ZERO,
        })
        .collect();

    for expense in expenses {
        if expense.date < start || expense.date > end {
            continue;
        }
        let offset = (expense.date - start).num_days() as usize;
        days[offset].total += expense.amount;
    }

    let total = days.iter().map(|d| d.total).sum();
    WeeklySummary {
        start,
        end,
        days,
        total,
    }
}

pub fn monthly_summary<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    year: i32,
    month: u32,
) -> MonthlySummary {
    let in_month: Vec<&Expense> = expenses
        .into_iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .collect();
    MonthlySummary {
        year,
        month,
        count: in_month.len(),
        categories: category_summary(in_month),
    }
}

fn period_key(date: NaiveDate, granularity: Granularity) -> ((i32, u32), String) {
    match granularity {
        Granularity::Daily => (
            (date.year(), date.ordinal()),
            date.format("%Y-%m-%d").to_string(),
        ),
        Granularity::Weekly => {
            let week = date.iso_week();
            (
                (week.year(), week.week()),
                format!("{}-W{:02}", week.year(), week.week()),
            )
        }
        Granularity::Monthly => (
            (date.year(), date.month()),
            format!("{}-{:02}", date.year(), date.month()),
        ),
        Granularity::Quarterly => {
            let quarter = (date.month() - 1) / 3 + 1;
            ((date.year(), quarter), format!("{}-Q{}", date.year(), quarter))
        }
        Granularity::Yearly => ((date.year(), 0), date.year().to_string()),
    }
}

/// Total, count, average, min and max per period, in chronological order.
pub fn period_breakdown<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    granularity: Granularity,
) -> Vec<PeriodStats> {
    let mut periods: BTreeMap<(i32, u32), PeriodStats> = BTreeMap::new();
    for expense in expenses {
        let (key, label) = period_key(expense.date, granularity);
        let stats = periods.entry(key).or_insert_with(|| PeriodStats {
            label,
            total: Decimal::ZERO,
            count: 0,
            average: Decimal::ZERO,
            min: expense.amount,
            max: expense.amount,
        });
        stats.total += expense.amount;
        stats.count += 1;
        stats.min = stats.min.min(expense.amount);
        stats.max = stats.max.max(expense.amount);
    }

    periods
        .into_values()
        .map(|mut stats| {
            stats.average = stats.total / Decimal::from(stats.count);
            stats
        })
        .collect()
}

/// Top categories, the amount distribution over quantile bands and
/// per-category descriptive statistics.
pub fn statistics<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> StatisticsReport {
    let mut groups: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
    let mut amounts = Vec::new();
    for expense in expenses {
        groups
            .entry(expense.category.as_str())
            .or_default()
            .push(expense.amount);
        amounts.push(expense.amount);
    }
    if amounts.is_empty() {
        return StatisticsReport::default();
    }
    amounts.sort();

    let categories: Vec<CategoryStats> = groups
        .into_iter()
        .map(|(category, values)| category_stats(category, &values))
        .collect();

    let mut top_categories: Vec<(String, Decimal)> = categories
        .iter()
        .map(|c| (c.category.clone(), c.total))
        .collect();
    top_categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_categories.truncate(TOP_CATEGORIES);

    StatisticsReport {
        top_categories,
        distribution: amount_distribution(&amounts),
        categories,
    }
}

fn category_stats(category: &str, values: &[Decimal]) -> CategoryStats {
    let total: Decimal = values.iter().sum();
    let count = values.len();
    let mean = total / Decimal::from(count);

    // Sample deviation in f64: squares of large amounts do not fit a Decimal.
    let std_dev = (count > 1).then(|| {
        let mean = mean.to_f64().unwrap_or(0.0);
        let squares: f64 = values
            .iter()
            .map(|v| (v.to_f64().unwrap_or(0.0) - mean).powi(2))
            .sum();
        Decimal::from_f64((squares / (count - 1) as f64).sqrt()).unwrap_or_default()
    });

    CategoryStats {
        category: category.to_string(),
        total,
        count,
        mean,
        min: values.iter().min().copied().unwrap_or_default(),
        max: values.iter().max().copied().unwrap_or_default(),
        std_dev,
    }
}

/// Quantile of non-empty sorted amounts, interpolating linearly between ranks.
fn quantile(sorted: &[Decimal], q: Decimal) -> Decimal {
    let position = Decimal::from(sorted.len() - 1) * q;
    let lower = position.floor();
    let index = lower.to_usize().unwrap_or(0);
    match sorted.get(index + 1) {
        Some(next) => sorted[index] + (*next - sorted[index]) * (position - lower),
        None => sorted[index],
    }
}

/// Counts per band: up to the 25th percentile, 25-50, 50-75, 75-90 and above 90.
fn amount_distribution(sorted: &[Decimal]) -> Vec<AmountBand> {
    let bands = [
        ("0-25%", Some(quantile(sorted, Decimal::new(25, 2)))),
        ("25-50%", Some(quantile(sorted, Decimal::new(50, 2)))),
        ("50-75%", Some(quantile(sorted, Decimal::new(75, 2)))),
        ("75-90%", Some(quantile(sorted, Decimal::new(90, 2)))),
        ("90%+", None),
    ];

    let mut lower: Option<Decimal> = None;
    bands
        .into_iter()
        .map(|(label, upper)| {
            let count = sorted
                .iter()
                .filter(|a| lower.is_none_or(|l| **a > l) && upper.is_none_or(|u| **a <= u))
                .count();
            lower = upper;
            AmountBand {
                label,
                upper,
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ledger::tests::create_test_expense;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_category_summary_food_and_transport() {
        let expenses = vec![
            create_test_expense(100, "Food", "2024-11-26"),
            create_test_expense(50, "Transport", "2024-11-26"),
        ];

        let summary = category_summary(&expenses);

        assert_eq!(summary.grand_total, Decimal::new(150, 0));
        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.categories[0].category, "Food");
        assert_eq!(summary.categories[0].total, Decimal::new(100, 0));
        assert_eq!(summary.categories[0].percentage.round_dp(1), Decimal::new(667, 1));
        assert_eq!(summary.categories[1].category, "Transport");
        assert_eq!(summary.categories[1].total, Decimal::new(50, 0));
        assert_eq!(summary.categories[1].percentage.round_dp(1), Decimal::new(333, 1));
    }

    #[test]
    fn test_category_summary_is_ordered_by_name() {
        let expenses = vec![
            create_test_expense(1, "Transport", "2024-11-26"),
            create_test_expense(900, "Bills", "2024-11-26"),
            create_test_expense(30, "Food", "2024-11-26"),
            create_test_expense(5, "Bills", "2024-11-27"),
        ];

        let summary = category_summary(&expenses);
        let names: Vec<&str> = summary.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Food", "Transport"]);
        assert_eq!(summary.categories[0].count, 2);
        assert_eq!(summary.categories[0].total, Decimal::new(905, 0));
    }

    #[test]
    fn test_category_percentages_sum_to_one_hundred() {
        let expenses = vec![
            create_test_expense(10, "A", "2024-11-26"),
            create_test_expense(10, "B", "2024-11-26"),
            create_test_expense(10, "C", "2024-11-26"),
            create_test_expense(7, "D", "2024-11-26"),
        ];

        let summary = category_summary(&expenses);
        let sum: Decimal = summary.categories.iter().map(|c| c.percentage).sum();
        let epsilon = Decimal::from_str("0.000001").unwrap();
        assert!((sum - Decimal::ONE_HUNDRED).abs() < epsilon);
    }

    #[test]
    fn test_category_summary_empty() {
        let summary = category_summary(&Vec::<Expense>::new());
        assert!(summary.categories.is_empty());
        assert_eq!(summary.grand_total, Decimal::ZERO);
        assert_eq!(percentage(Decimal::TEN, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_overall_summary() {
        let expenses = vec![
            create_test_expense(10, "Food", "2024-11-01"),
            create_test_expense(25, "Bills", "2024-11-02"),
            create_test_expense(4, "Food", "2024-11-03"),
        ];

        let summary = overall_summary(&expenses);
        assert_eq!(summary.total, Decimal::new(39, 0));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(Decimal::new(13, 0)));
        assert_eq!(summary.highest, Some(Decimal::new(25, 0)));
        assert_eq!(summary.lowest, Some(Decimal::new(4, 0)));
    }

    #[test]
    fn test_overall_summary_empty_store() {
        let summary = overall_summary(&Vec::<Expense>::new());
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, None);
        assert_eq!(summary.highest, None);
        assert_eq!(summary.lowest, None);
    }

    #[test]
    fn test_decimal_sums_do_not_drift() {
        let cent = Expense {
            amount: Decimal::from_str("0.10").unwrap(),
            ..create_test_expense(1, "Food", "2024-11-01")
        };
        let expenses = vec![cent; 1000];
        assert_eq!(overall_summary(&expenses).total, Decimal::new(100, 0));
    }

    #[test]
    fn test_daily_summary_filters_by_date() {
        let expenses = vec![
            create_test_expense(10, "Food", "2024-11-26"),
            create_test_expense(5, "Transport", "2024-11-25"),
            create_test_expense(7, "Food", "2024-11-26"),
        ];

        let summary = daily_summary(&expenses, date("2024-11-26"));
        assert_eq!(summary.expenses.len(), 2);
        assert_eq!(summary.total, Decimal::new(17, 0));

        let empty = daily_summary(&expenses, date("2024-01-01"));
        assert!(empty.expenses.is_empty());
        assert_eq!(empty.total, Decimal::ZERO);
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2024-11-28 is a Thursday.
        assert_eq!(week_start(date("2024-11-28")), date("2024-11-25"));
        assert_eq!(week_start(date("2024-11-25")), date("2024-11-25"));
        assert_eq!(week_start(date("2024-12-01")), date("2024-11-25"));
    }

    #[test]
    fn test_weekly_summary_reports_all_seven_days() {
        let expenses = vec![
            create_test_expense(10, "Food", "2024-11-25"),
            create_test_expense(5, "Food", "2024-11-25"),
            create_test_expense(20, "Bills", "2024-12-01"),
            create_test_expense(99, "Bills", "2024-11-24"),
            create_test_expense(99, "Bills", "2024-12-02"),
        ];

        let summary = weekly_summary(&expenses, date("2024-11-28"));
        assert_eq!(summary.start, date("2024-11-25"));
        assert_eq!(summary.end, date("2024-12-01"));
        assert_eq!(summary.days.len(), 7);
        assert_eq!(summary.days[0].total, Decimal::new(15, 0));
        assert_eq!(summary.days[1].total, Decimal::ZERO);
        assert_eq!(summary.days[6].total, Decimal::new(20, 0));
        assert_eq!(summary.total, Decimal::new(35, 0));
    }

    #[test]
    fn test_monthly_summary_groups_by_category() {
        let expenses = vec![
            create_test_expense(10, "Food", "2024-11-01"),
            create_test_expense(30, "Food", "2024-11-30"),
            create_test_expense(60, "Bills", "2024-11-15"),
            create_test_expense(500, "Bills", "2024-12-01"),
            create_test_expense(500, "Bills", "2023-11-15"),
        ];

        let summary = monthly_summary(&expenses, 2024, 11);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.categories.grand_total, Decimal::new(100, 0));
        assert_eq!(summary.categories.categories[0].category, "Bills");
        assert_eq!(summary.categories.categories[0].percentage, Decimal::new(60, 0));
        assert_eq!(summary.categories.categories[1].percentage, Decimal::new(40, 0));
    }

    #[test]
    fn test_period_breakdown_monthly_and_quarterly() {
        let expenses = vec![
            create_test_expense(10, "Food", "2024-12-05"),
            create_test_expense(30, "Food", "2024-11-30"),
            create_test_expense(20, "Bills", "2024-11-01"),
            create_test_expense(8, "Bills", "2024-01-15"),
        ];

        let monthly = period_breakdown(&expenses, Granularity::Monthly);
        let labels: Vec<&str> = monthly.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-11", "2024-12"]);
        assert_eq!(monthly[1].total, Decimal::new(50, 0));
        assert_eq!(monthly[1].count, 2);
        assert_eq!(monthly[1].average, Decimal::new(25, 0));
        assert_eq!(monthly[1].min, Decimal::new(20, 0));
        assert_eq!(monthly[1].max, Decimal::new(30, 0));

        let quarterly = period_breakdown(&expenses, Granularity::Quarterly);
        let labels: Vec<&str> = quarterly.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-Q1", "2024-Q4"]);
    }

    #[test]
    fn test_period_breakdown_uses_iso_weeks() {
        let expenses = vec![
            create_test_expense(1, "Food", "2024-12-30"),
            create_test_expense(2, "Food", "2025-01-05"),
            create_test_expense(4, "Food", "2024-11-26"),
        ];

        let weekly = period_breakdown(&expenses, Granularity::Weekly);
        let labels: Vec<&str> = weekly.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-W48", "2025-W01"]);
        assert_eq!(weekly[1].total, Decimal::new(3, 0));
    }

    #[test]
    fn test_statistics_distribution_and_category_table() {
        let expenses = vec![
            create_test_expense(10, "Food", "2024-11-01"),
            create_test_expense(20, "Food", "2024-11-02"),
            create_test_expense(30, "Food", "2024-11-03"),
            create_test_expense(100, "Bills", "2024-11-04"),
            create_test_expense(5, "Transport", "2024-11-05"),
        ];

        let report = statistics(&expenses);

        let top: Vec<&str> = report.top_categories.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(top, vec!["Bills", "Food", "Transport"]);

        // Sorted 5, 10, 20, 30, 100: quartiles 10, 20, 30 and a 90th percentile of 72.
        let uppers: Vec<Option<Decimal>> = report.distribution.iter().map(|b| b.upper).collect();
        assert_eq!(
            uppers,
            vec![
                Some(Decimal::new(10, 0)),
                Some(Decimal::new(20, 0)),
                Some(Decimal::new(30, 0)),
                Some(Decimal::new(72, 0)),
                None
            ]
        );
        let counts: Vec<usize> = report.distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1, 0, 1]);

        let names: Vec<&str> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Food", "Transport"]);
        let food = &report.categories[1];
        assert_eq!(food.total, Decimal::new(60, 0));
        assert_eq!(food.count, 3);
        assert_eq!(food.mean, Decimal::new(20, 0));
        assert_eq!(food.min, Decimal::new(10, 0));
        assert_eq!(food.max, Decimal::new(30, 0));
        assert_eq!(food.std_dev.map(|d| d.round_dp(2)), Some(Decimal::new(10, 0)));
        assert_eq!(report.categories[0].std_dev, None);
    }

    #[test]
    fn test_statistics_keeps_five_largest_categories() {
        let expenses: Vec<Expense> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .zip(1..)
            .map(|(category, amount)| create_test_expense(amount, category, "2024-11-01"))
            .collect();

        let report = statistics(&expenses);
        let top: Vec<&str> = report.top_categories.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(top, vec!["F", "E", "D", "C", "B"]);
        assert_eq!(report.categories.len(), 6);
        assert_eq!(report.distribution.iter().map(|b| b.count).sum::<usize>(), 6);
    }

    #[test]
    fn test_statistics_empty_and_single_expense() {
        assert_eq!(statistics(&Vec::<Expense>::new()), StatisticsReport::default());

        let single = statistics(&vec![create_test_expense(42, "Food", "2024-11-01")]);
        let counts: Vec<usize> = single.distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0]);
        assert_eq!(single.categories[0].std_dev, None);
    }
}

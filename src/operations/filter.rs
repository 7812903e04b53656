use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::expense::Expense;
use crate::models::summary::{NumberedExpense, SearchResult};

/// Criteria for narrowing the expense listing. Empty criteria match everything;
/// all bounds are inclusive and categories compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub categories: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if !self.categories.is_empty()
            && !self
                .categories
                .iter()
                .any(|c| c.trim().eq_ignore_ascii_case(&expense.category))
        {
            return false;
        }

        if let Some(from) = self.from {
            if expense.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if expense.date > to {
                return false;
            }
        }

        if let Some(min) = self.min_amount {
            if expense.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if expense.amount > max {
                return false;
            }
        }

        true
    }
}

/// Matching expenses with their listing numbers, plus total and average.
pub fn search_expenses<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    filter: &ExpenseFilter,
) -> SearchResult {
    let matches: Vec<NumberedExpense> = expenses
        .into_iter()
        .enumerate()
        .filter(|(_, expense)| filter.matches(expense))
        .map(|(index, expense)| NumberedExpense {
            number: index + 1,
            expense: expense.clone(),
        })
        .collect();

    let total: Decimal = matches.iter().map(|m| m.expense.amount).sum();
    let average = if matches.is_empty() {
        None
    } else {
        Some(total / Decimal::from(matches.len()))
    };

    SearchResult {
        matches,
        total,
        average,
    }
}

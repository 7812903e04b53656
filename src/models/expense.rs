use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// In-memory surrogate identity of a stored expense. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub timestamp: NaiveDateTime,
}

impl Expense {
    pub fn new(
        amount: Decimal,
        category: String,
        date: NaiveDate,
        description: String,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            amount,
            category,
            date,
            description,
            timestamp,
        }
    }
}

/// An expense together with its surrogate id, as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredExpense {
    pub id: ExpenseId,
    pub expense: Expense,
}

/// Unvalidated input for a new expense. `date` falls back to today when absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpenseDraft {
    pub amount: String,
    pub category: String,
    pub date: Option<String>,
    pub description: Option<String>,
}

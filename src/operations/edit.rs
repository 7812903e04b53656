use crate::db::ledger::Ledger;
use crate::error::{Field, LedgerError, Result};
use crate::models::expense::Expense;
use crate::operations::validate;

/// Replaces one field of the expense at `index` (0-based) and saves the ledger.
/// The creation timestamp is never touched.
pub fn edit_expense(ledger: &mut Ledger, index: usize, field: Field, value: &str) -> Result<Expense> {
    let id = ledger.id_at(index)?;
    let len = ledger.len();
    let expense = ledger
        .get_mut(id)
        .ok_or(LedgerError::IndexOutOfRange { index: index + 1, len })?;

    match field {
        Field::Amount => expense.amount = validate::parse_amount(value)?,
        Field::Category => expense.category = validate::check_category(value)?,
        Field::Date => expense.date = validate::parse_date(value)?,
        Field::Description => expense.description = value.trim().to_string(),
    }

    let updated = expense.clone();
    tracing::debug!(number = index + 1, field = field.name(), "expense edited");
    ledger.flush()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ledger::tests::{create_test_expense, ledger_with, unwritable_ledger};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_edit_amount_changes_only_amount() {
        let (mut ledger, _dir) = ledger_with(vec![
            create_test_expense(10, "Food", "2024-11-01"),
            create_test_expense(20, "Bills", "2024-11-02"),
        ]);
        let before: Vec<Expense> = ledger.expenses().cloned().collect();

        let updated = edit_expense(&mut ledger, 0, Field::Amount, "42.10").unwrap();

        assert_eq!(updated.amount, Decimal::new(4210, 2));
        assert_eq!(updated.category, before[0].category);
        assert_eq!(updated.date, before[0].date);
        assert_eq!(updated.description, before[0].description);
        assert_eq!(updated.timestamp, before[0].timestamp);

        let after: Vec<Expense> = ledger.expenses().cloned().collect();
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn test_edit_date_and_category() {
        let (mut ledger, _dir) = ledger_with(vec![create_test_expense(10, "Food", "2024-11-01")]);

        edit_expense(&mut ledger, 0, Field::Date, "2024-12-24").unwrap();
        let updated = edit_expense(&mut ledger, 0, Field::Category, " Gifts ").unwrap();

        assert_eq!(updated.date, NaiveDate::from_ymd_opt(2024, 12, 24).unwrap());
        assert_eq!(updated.category, "Gifts");
    }

    #[test]
    fn test_edit_rejects_invalid_value_without_change() {
        let (mut ledger, _dir) = ledger_with(vec![create_test_expense(10, "Food", "2024-11-01")]);
        let before: Vec<Expense> = ledger.expenses().cloned().collect();

        assert!(matches!(
            edit_expense(&mut ledger, 0, Field::Amount, "-1"),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(matches!(
            edit_expense(&mut ledger, 0, Field::Category, ""),
            Err(LedgerError::EmptyCategory)
        ));
        assert!(matches!(
            edit_expense(&mut ledger, 0, Field::Date, "yesterday"),
            Err(LedgerError::InvalidDate(_))
        ));

        let after: Vec<Expense> = ledger.expenses().cloned().collect();
        assert_eq!(after, before);
    }

    #[test]
    fn test_edit_out_of_range() {
        let (mut ledger, _dir) = ledger_with(vec![create_test_expense(10, "Food", "2024-11-01")]);
        assert!(matches!(
            edit_expense(&mut ledger, 1, Field::Description, "x"),
            Err(LedgerError::IndexOutOfRange { index: 2, len: 1 })
        ));
    }

    #[test]
    fn test_edit_save_failure_is_reported_and_kept_in_memory() {
        let (mut ledger, _dir) = unwritable_ledger(vec![create_test_expense(10, "Food", "2024-11-01")]);

        let result = edit_expense(&mut ledger, 0, Field::Amount, "15");

        assert!(matches!(result, Err(LedgerError::PersistenceFailure { .. })));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.expenses().next().unwrap().amount, Decimal::new(15, 0));
    }

    #[test]
    fn test_edit_description_may_be_cleared() {
        let (mut ledger, _dir) = ledger_with(vec![create_test_expense(10, "Food", "2024-11-01")]);
        edit_expense(&mut ledger, 0, Field::Description, "dinner").unwrap();
        let updated = edit_expense(&mut ledger, 0, Field::Description, "").unwrap();
        assert_eq!(updated.description, "");
    }
}

use crate::db::ledger::Ledger;
use crate::error::{LedgerError, Result};
use crate::models::expense::Expense;

/// Removes the expense at `index` (0-based) and saves the ledger. Later
/// expenses move up by one, so callers must re-read the listing afterwards.
pub fn delete_expense(ledger: &mut Ledger, index: usize) -> Result<Expense> {
    let id = ledger.id_at(index)?;
    let len = ledger.len();
    let removed = ledger
        .take(id)
        .ok_or(LedgerError::IndexOutOfRange { index: index + 1, len })?;
    tracing::debug!(number = index + 1, "expense deleted");
    ledger.flush()?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ledger::tests::{create_test_expense, ledger_with, unwritable_ledger};

    #[test]
    fn test_delete_keeps_relative_order_of_the_rest() {
        let original = vec![
            create_test_expense(1, "Food", "2024-11-01"),
            create_test_expense(2, "Transport", "2024-11-02"),
            create_test_expense(3, "Bills", "2024-11-03"),
            create_test_expense(4, "Health", "2024-11-04"),
        ];
        let (mut ledger, _dir) = ledger_with(original.clone());

        let removed = delete_expense(&mut ledger, 1).unwrap();
        assert_eq!(removed, original[1]);

        let mut expected = original.clone();
        expected.remove(1);
        let remaining: Vec<Expense> = ledger.expenses().cloned().collect();
        assert_eq!(remaining, expected);
    }

    #[test]
    fn test_delete_out_of_range_leaves_store_unchanged() {
        let (mut ledger, _dir) = ledger_with(vec![create_test_expense(1, "Food", "2024-11-01")]);

        let result = delete_expense(&mut ledger, 5);
        assert!(matches!(result, Err(LedgerError::IndexOutOfRange { .. })));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_delete_save_failure_is_reported_and_kept_in_memory() {
        let (mut ledger, _dir) = unwritable_ledger(vec![
            create_test_expense(1, "Food", "2024-11-01"),
            create_test_expense(2, "Bills", "2024-11-02"),
        ]);

        let result = delete_expense(&mut ledger, 0);

        assert!(matches!(result, Err(LedgerError::PersistenceFailure { .. })));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.expenses().next().unwrap().category, "Bills");
    }

    #[test]
    fn test_delete_last_record_persists_empty_file() {
        let (mut ledger, dir) = ledger_with(vec![create_test_expense(1, "Food", "2024-11-01")]);
        ledger.flush().unwrap();

        delete_expense(&mut ledger, 0).unwrap();

        let reloaded =
            crate::db::repository::JsonFileRepository::new(dir.path().join("expenses.json")).load();
        assert!(reloaded.warning.is_none());
        assert!(reloaded.expenses.is_empty());
    }
}

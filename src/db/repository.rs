use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::error::{LedgerError, Result};
use crate::models::expense::Expense;
use crate::operations::validate;

/// Result of reading the expense file. A warning means the file was present but
/// unusable and the store started empty.
#[derive(Debug)]
pub struct Loaded {
    pub expenses: Vec<Expense>,
    pub warning: Option<LedgerError>,
}

/// Flat JSON file holding the whole expense list.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing file is an empty list, an unreadable or corrupt one
    /// is an empty list plus a warning.
    pub fn load(&self) -> Loaded {
        match self.try_load() {
            Ok(expenses) => {
                tracing::info!(path = %self.path.display(), count = expenses.len(), "loaded expenses");
                Loaded {
                    expenses,
                    warning: None,
                }
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "starting with an empty expense list: {err}");
                Loaded {
                    expenses: Vec::new(),
                    warning: Some(err),
                }
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Expense>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LedgerError::PersistenceFailure {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let expenses: Vec<Expense> =
            serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))?;

        for (index, expense) in expenses.iter().enumerate() {
            validate::check_amount(expense.amount)
                .and_then(|_| validate::check_category(&expense.category))
                .map_err(|e| self.corrupt(format!("record {}: {}", index + 1, e)))?;
        }
        Ok(expenses)
    }

    /// Writes the full list to a temporary file next to the target and renames it into place.
    pub fn save(&self, expenses: &[Expense]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.failure(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.failure(e))?;
        tmp.write_all(&self.to_json(expenses)?)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| self.failure(e))?;
        tmp.persist(&self.path).map_err(|e| self.failure(e.error))?;

        tracing::info!(path = %self.path.display(), count = expenses.len(), "saved expenses");
        Ok(())
    }

    fn to_json(&self, expenses: &[Expense]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut buffer,
            PrettyFormatter::with_indent(b"    "),
        );
        expenses
            .serialize(&mut serializer)
            .map_err(|e| self.failure(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        Ok(buffer)
    }

    fn failure(&self, source: std::io::Error) -> LedgerError {
        LedgerError::PersistenceFailure {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: String) -> LedgerError {
        LedgerError::CorruptData {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn create_test_expense(amount: Decimal, category: &str) -> Expense {
        Expense::new(
            amount,
            category.to_string(),
            NaiveDate::from_ymd_opt(2024, 11, 26).unwrap(),
            "lunch".to_string(),
            NaiveDate::from_ymd_opt(2024, 11, 26)
                .unwrap()
                .and_hms_micro_opt(12, 30, 5, 123456)
                .unwrap(),
        )
    }

    #[test]
    fn test_load_missing_file_is_empty_without_warning() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("expenses.json"));

        let loaded = repo.load();
        assert!(loaded.expenses.is_empty());
        assert!(loaded.warning.is_none());
    }

    #[test]
    fn test_load_malformed_file_degrades_with_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.json");
        fs::write(&path, "[{\"amount\": 10, \"category\": ").unwrap();

        let loaded = JsonFileRepository::new(&path).load();
        assert!(loaded.expenses.is_empty());
        assert!(matches!(loaded.warning, Some(LedgerError::CorruptData { .. })));
    }

    #[test]
    fn test_load_rejects_records_breaking_invariants() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.json");
        fs::write(
            &path,
            r#"[{"amount": -5, "category": "Food", "date": "2024-11-26", "description": "", "timestamp": "2024-11-26T10:00:00"}]"#,
        )
        .unwrap();

        let loaded = JsonFileRepository::new(&path).load();
        assert!(loaded.expenses.is_empty());
        let warning = loaded.warning.unwrap();
        assert!(warning.to_string().contains("record 1"));
    }

    #[test]
    fn test_load_reads_python_style_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.json");
        fs::write(
            &path,
            r#"[
    {
        "amount": 250.0,
        "category": "Bills",
        "date": "2024-11-20",
        "description": "No description",
        "timestamp": "2024-11-20T18:02:11.532140"
    }
]"#,
        )
        .unwrap();

        let loaded = JsonFileRepository::new(&path).load();
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.expenses.len(), 1);
        assert_eq!(loaded.expenses[0].amount, Decimal::new(250, 0));
        assert_eq!(loaded.expenses[0].category, "Bills");
    }

    #[test]
    fn test_save_then_load_round_trip_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.json");
        let repo = JsonFileRepository::new(&path);
        let expenses = vec![
            create_test_expense(Decimal::new(100, 0), "Food"),
            create_test_expense(Decimal::new(1275, 2), "Transport"),
        ];

        repo.save(&expenses).unwrap();
        let first = fs::read(&path).unwrap();

        let loaded = repo.load();
        assert_eq!(loaded.expenses, expenses);
        repo.save(&loaded.expenses).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_save_writes_json_numbers_and_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("expenses.json");
        let repo = JsonFileRepository::new(&path);

        repo.save(&[create_test_expense(Decimal::new(50, 0), "Transport")])
            .unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw[0]["amount"].is_number());
        assert_eq!(raw[0]["date"], "2024-11-26");
        assert_eq!(raw[0]["category"], "Transport");
    }

    #[test]
    fn test_amounts_round_trip_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.json");
        let repo = JsonFileRepository::new(&path);
        let precise = Decimal::from_str("987654321098.7654321").unwrap();
        let largest = Decimal::new(1_000_000_000_000, 0);

        repo.save(&[
            create_test_expense(precise, "Bills"),
            create_test_expense(largest, "Shopping"),
        ])
        .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"amount\": 987654321098.7654321,"));
        assert!(raw.contains("\"amount\": 1000000000000,"));

        let loaded = repo.load();
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.expenses[0].amount, precise);
        assert_eq!(loaded.expenses[0].amount.to_string(), "987654321098.7654321");
        assert_eq!(loaded.expenses[1].amount, largest);
    }

    #[test]
    fn test_load_rejects_amount_above_bound_without_touching_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.json");
        let contents = r#"[{"amount": 79228162514264337593543950335, "category": "Food", "date": "2024-11-26", "description": "", "timestamp": "2024-11-26T10:00:00"}]"#;
        fs::write(&path, contents).unwrap();

        let loaded = JsonFileRepository::new(&path).load();
        assert!(loaded.expenses.is_empty());
        assert!(matches!(loaded.warning, Some(LedgerError::CorruptData { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let repo = JsonFileRepository::new(blocker.join("expenses.json"));

        let result = repo.save(&[]);
        assert!(matches!(result, Err(LedgerError::PersistenceFailure { .. })));
    }
}

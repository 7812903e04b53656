use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The editable fields of an expense, used to tell the caller what to re-enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Category,
    Date,
    Description,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::Category => "category",
            Field::Date => "date",
            Field::Description => "description",
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },
    #[error("Invalid date '{0}'. Please use YYYY-MM-DD.")]
    InvalidDate(String),
    #[error("Category cannot be empty.")]
    EmptyCategory,
    #[error("Expense number {index} does not exist (there are {len} expenses).")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Could not access '{}': {source}. Check permissions and free disk space.", path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Expense file '{}' is corrupt: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },
    #[error("Cannot read '{}': {source}. Check the file path.", path.display())]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Import failed on line {line}: {reason}")]
    Import { line: usize, reason: String },
    #[error("{0}")]
    Capability(String),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("terminal error: {0}")]
    Terminal(String),
}

impl LedgerError {
    /// The field the user has to re-enter, if this is a validation failure.
    pub fn field(&self) -> Option<Field> {
        match self {
            LedgerError::InvalidAmount { .. } => Some(Field::Amount),
            LedgerError::InvalidDate(_) => Some(Field::Date),
            LedgerError::EmptyCategory => Some(Field::Category),
            _ => None,
        }
    }

    /// True for "bad input, re-enter" failures, false for storage and environment problems.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InvalidDate(_)
                | LedgerError::EmptyCategory
                | LedgerError::IndexOutOfRange { .. }
                | LedgerError::Import { .. }
                | LedgerError::InputFile { .. }
        )
    }
}

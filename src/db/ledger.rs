use crate::db::repository::{JsonFileRepository, Loaded};
use crate::error::{LedgerError, Result};
use crate::models::expense::{Expense, ExpenseId, StoredExpense};

/// The in-memory expense list and the file it is flushed to.
///
/// Order is insertion order and defines the 1-based numbers shown to the user.
/// Mutations go through [`ExpenseId`]s; positional indices are only resolved here.
#[derive(Debug)]
pub struct Ledger {
    entries: Vec<StoredExpense>,
    next_id: u64,
    repository: JsonFileRepository,
}

impl Ledger {
    /// Loads the file behind `repository`. The returned warning is set when the
    /// file existed but could not be used.
    pub fn open(repository: JsonFileRepository) -> (Self, Option<LedgerError>) {
        let Loaded { expenses, warning } = repository.load();
        let mut ledger = Self {
            entries: Vec::with_capacity(expenses.len()),
            next_id: 1,
            repository,
        };
        for expense in expenses {
            ledger.push(expense);
        }
        (ledger, warning)
    }

    pub fn repository(&self) -> &JsonFileRepository {
        &self.repository
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expenses(&self) -> impl Iterator<Item = &Expense> {
        self.entries.iter().map(|e| &e.expense)
    }

    /// Translates a 0-based listing index into the stable id of that record.
    pub fn id_at(&self, index: usize) -> Result<ExpenseId> {
        self.entries
            .get(index)
            .map(|e| e.id)
            .ok_or(LedgerError::IndexOutOfRange {
                index: index + 1,
                len: self.entries.len(),
            })
    }

    /// Appends without persisting. Callers flush once per logical mutation.
    pub(crate) fn push(&mut self, expense: Expense) -> ExpenseId {
        let id = ExpenseId(self.next_id);
        self.next_id += 1;
        self.entries.push(StoredExpense { id, expense });
        id
    }

    pub(crate) fn get_mut(&mut self, id: ExpenseId) -> Option<&mut Expense> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| &mut e.expense)
    }

    pub(crate) fn take(&mut self, id: ExpenseId) -> Option<Expense> {
        let pos = self.position(id)?;
        Some(self.entries.remove(pos).expense)
    }

    /// Writes the whole list. On failure the in-memory state is kept as is.
    pub fn flush(&self) -> Result<()> {
        let snapshot: Vec<Expense> = self.expenses().cloned().collect();
        self.repository.save(&snapshot).inspect_err(|err| {
            tracing::warn!("changes kept in memory but not saved: {err}");
        })
    }

    fn position(&self, id: ExpenseId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

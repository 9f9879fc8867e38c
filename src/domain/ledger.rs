use super::{AccountId, Transaction};

/// Append-only record of account movements, kept in insertion order.
///
/// The single exception to append-only is the closure cascade: when an
/// account is removed, every entry referencing it goes with it.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, transaction: Transaction) {
        self.entries.push(transaction);
    }

    /// All entries in insertion order.
    pub fn all(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries referencing the account on either side, in insertion order.
    pub fn for_account(&self, account_id: AccountId) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().filter(move |t| t.touches(account_id))
    }

    /// Drop every entry matching the predicate; returns how many were
    /// removed. Used only by the account-closure cascade.
    pub fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&Transaction) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|t| !predicate(t));
        before - self.entries.len()
    }
}

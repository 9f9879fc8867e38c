use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Amount};

pub type TransactionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEPOSIT" => Some(TransactionKind::Deposit),
            "WITHDRAWAL" => Some(TransactionKind::Withdrawal),
            "TRANSFER" => Some(TransactionKind::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movement of money recorded in the ledger. Immutable once created;
/// accounts are referenced by id only. Deposits and withdrawals record the
/// account on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub source_account: AccountId,
    pub dest_account: AccountId,
    /// Always positive, denominated in the source account's currency at the
    /// time of the transaction.
    pub amount: Amount,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        source_account: AccountId,
        dest_account: AccountId,
        amount: Amount,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            source_account,
            dest_account,
            amount,
            kind,
            timestamp,
        }
    }

    /// True when this entry references the given account on either side.
    pub fn touches(&self, account_id: AccountId) -> bool {
        self.source_account == account_id || self.dest_account == account_id
    }
}

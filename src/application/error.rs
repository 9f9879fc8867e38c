use thiserror::Error;

use crate::domain::{AccountError, AccountId, Amount, ClientId, Currency};

/// Closed set of failures a Bank operation can report. Business-rule
/// violations never leave partial state behind; persistence failures are not
/// represented here because the store is best-effort by design.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password must be at least 4 characters")]
    PasswordTooShort,

    #[error("amount must be positive: {0}")]
    InvalidAmount(Amount),

    #[error("a client is already registered with email {0}")]
    DuplicateEmail(String),

    #[error("client not found: {0}")]
    ClientNotFound(ClientId),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("account {account} does not belong to client {client}")]
    UnauthorizedAccount {
        account: AccountId,
        client: ClientId,
    },

    #[error("account {account} still holds {balance:.2}; settle it before closing")]
    NonZeroBalance {
        account: AccountId,
        balance: Amount,
    },

    /// Transfers refuse to cross a currency pair with no configured rate;
    /// passing the amount through unconverted would credit the wrong value.
    #[error("no conversion rate configured from {from} to {to}")]
    MissingConversionRate { from: Currency, to: Currency },

    #[error(transparent)]
    Account(#[from] AccountError),
}

impl BankError {
    /// True for the recoverable bonus-lock case: the caller may confirm and
    /// retry through the forced withdrawal path.
    pub fn is_early_withdrawal_lock(&self) -> bool {
        matches!(
            self,
            BankError::Account(AccountError::EarlyWithdrawalLock { .. })
        )
    }
}

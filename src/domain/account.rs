use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Amount, ClientId, Conversion, Currency, RateTable};

pub type AccountId = u32;

/// Credit accounts may run negative down to this limit, denominated in RON.
pub const CREDIT_LIMIT_RON: Amount = -5000.0;
/// Rate applied when querying the interest owed on a negative credit balance.
pub const DEBT_INTEREST_RATE: f64 = 0.10;
/// Monthly interest for standard savings accounts.
pub const STANDARD_INTEREST_RATE: f64 = 0.02;
/// Monthly interest for bonus savings accounts once unlocked.
pub const BONUS_INTEREST_RATE: f64 = 0.05;
/// Months a bonus savings account stays locked after opening.
pub const BONUS_LOCK_MONTHS: i64 = 4;
/// A single savings withdrawal may take at most this share of the balance.
pub const SAVINGS_WITHDRAWAL_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SavingsSubtype {
    Standard,
    Bonus,
}

impl SavingsSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsSubtype::Standard => "STANDARD",
            SavingsSubtype::Bonus => "BONUS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STANDARD" => Some(SavingsSubtype::Standard),
            "BONUS" => Some(SavingsSubtype::Bonus),
            _ => None,
        }
    }
}

/// Per-variant payload of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum AccountKind {
    Checking,
    Credit,
    Savings {
        subtype: SavingsSubtype,
        /// Snapshot of the most recent accrual, not a running total. Each
        /// monthly accrual overwrites it; a forced early withdrawal zeroes it.
        accrued_interest: Amount,
    },
}

impl AccountKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccountKind::Checking => "CHECKING",
            AccountKind::Credit => "CREDIT",
            AccountKind::Savings { .. } => "SAVINGS",
        }
    }
}

/// Rule violations raised by account operations. Every rejection leaves the
/// account exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("insufficient funds: balance {balance:.2}, requested {requested:.2}")]
    InsufficientFunds { balance: Amount, requested: Amount },

    #[error("credit limit exceeded: limit {limit:.2}, balance {balance:.2}, requested {requested:.2}")]
    CreditLimitExceeded {
        limit: Amount,
        balance: Amount,
        requested: Amount,
    },

    #[error("withdrawal of {requested:.2} exceeds 50% of balance (max {max:.2})")]
    ExcessiveWithdrawal { max: Amount, requested: Amount },

    /// Recoverable: the caller may confirm and retry via the forced path,
    /// forfeiting the accrued interest.
    #[error("bonus savings locked: {elapsed_months} of {BONUS_LOCK_MONTHS} months elapsed")]
    EarlyWithdrawalLock { elapsed_months: i64 },

    #[error("account is already denominated in {0}")]
    SameCurrency(Currency),
}

/// A bank account: shared base record plus a per-variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Owning client; immutable after creation.
    pub client_id: ClientId,
    pub balance: Amount,
    pub currency: Currency,
    pub opened_at: DateTime<Utc>,
    pub kind: AccountKind,
}

impl Account {
    pub fn new(
        id: AccountId,
        client_id: ClientId,
        balance: Amount,
        currency: Currency,
        opened_at: DateTime<Utc>,
        kind: AccountKind,
    ) -> Self {
        Self {
            id,
            client_id,
            balance,
            currency,
            opened_at,
            kind,
        }
    }

    pub fn savings(
        id: AccountId,
        client_id: ClientId,
        balance: Amount,
        currency: Currency,
        opened_at: DateTime<Utc>,
        subtype: SavingsSubtype,
    ) -> Self {
        Self::new(
            id,
            client_id,
            balance,
            currency,
            opened_at,
            AccountKind::Savings {
                subtype,
                accrued_interest: 0.0,
            },
        )
    }

    pub fn is_savings(&self) -> bool {
        matches!(self.kind, AccountKind::Savings { .. })
    }

    pub fn accrued_interest(&self) -> Amount {
        match self.kind {
            AccountKind::Savings {
                accrued_interest, ..
            } => accrued_interest,
            _ => 0.0,
        }
    }

    /// Whole elapsed months since opening, approximated as days / 30.
    pub fn months_since_opening(&self, now: DateTime<Utc>) -> i64 {
        (now - self.opened_at).num_days() / 30
    }

    /// Unconditional credit for non-negative amounts; amount validation is the
    /// orchestrator's job.
    pub fn deposit(&mut self, amount: Amount) {
        self.balance += amount;
    }

    /// Debit the account under the variant's withdrawal rule.
    pub fn withdraw(
        &mut self,
        amount: Amount,
        rates: &RateTable,
        now: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        match self.kind {
            AccountKind::Checking => {
                if self.balance - amount < 0.0 {
                    return Err(AccountError::InsufficientFunds {
                        balance: self.balance,
                        requested: amount,
                    });
                }
            }
            AccountKind::Credit => {
                let limit = self.credit_limit(rates);
                if self.balance - amount < limit {
                    return Err(AccountError::CreditLimitExceeded {
                        limit,
                        balance: self.balance,
                        requested: amount,
                    });
                }
            }
            AccountKind::Savings { subtype, .. } => {
                self.check_savings_cap(amount)?;
                if subtype == SavingsSubtype::Bonus {
                    let elapsed_months = self.months_since_opening(now);
                    if elapsed_months < BONUS_LOCK_MONTHS {
                        return Err(AccountError::EarlyWithdrawalLock { elapsed_months });
                    }
                }
            }
        }
        self.balance -= amount;
        Ok(())
    }

    /// Withdrawal that overrides the bonus lock, forfeiting the accrued
    /// interest as a penalty. The 50% cap still applies. Non-savings accounts
    /// follow their ordinary withdrawal rule.
    pub fn withdraw_forced(
        &mut self,
        amount: Amount,
        rates: &RateTable,
        now: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        match self.kind {
            AccountKind::Savings {
                ref mut accrued_interest,
                ..
            } => {
                if amount > self.balance * SAVINGS_WITHDRAWAL_SHARE {
                    return Err(AccountError::ExcessiveWithdrawal {
                        max: self.balance * SAVINGS_WITHDRAWAL_SHARE,
                        requested: amount,
                    });
                }
                *accrued_interest = 0.0;
                self.balance -= amount;
                Ok(())
            }
            _ => self.withdraw(amount, rates, now),
        }
    }

    /// Monthly interest accrual; returns the interest credited (0.0 for
    /// non-savings accounts and locked bonus accounts).
    ///
    /// The accrued-interest field is overwritten with this accrual rather
    /// than summed: it records the latest accrual only.
    pub fn accrue_monthly_interest(&mut self, now: DateTime<Utc>) -> Amount {
        let elapsed = self.months_since_opening(now);
        match self.kind {
            AccountKind::Savings {
                subtype,
                ref mut accrued_interest,
            } => {
                let percent = match subtype {
                    SavingsSubtype::Standard => STANDARD_INTEREST_RATE,
                    SavingsSubtype::Bonus if elapsed >= BONUS_LOCK_MONTHS => BONUS_INTEREST_RATE,
                    SavingsSubtype::Bonus => 0.0,
                };
                if percent > 0.0 {
                    let interest = self.balance * percent;
                    self.balance += interest;
                    *accrued_interest = interest;
                    interest
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Interest owed on a negative credit balance. Read-only query; other
    /// variants always owe 0.
    pub fn debt_interest(&self) -> Amount {
        match self.kind {
            AccountKind::Credit if self.balance < 0.0 => -self.balance * DEBT_INTEREST_RATE,
            _ => 0.0,
        }
    }

    /// Re-denominate the account. Converts the balance (and, for savings, the
    /// accrued interest) through the rate table, then swaps the stored
    /// currency. An unset rate degrades gracefully: the amounts pass through
    /// unconverted, and the returned [`Conversion`] lets the caller tell.
    pub fn change_currency(
        &mut self,
        new_currency: Currency,
        rates: &RateTable,
    ) -> Result<Conversion, AccountError> {
        if self.currency == new_currency {
            return Err(AccountError::SameCurrency(new_currency));
        }
        let converted = rates.convert(self.balance, self.currency, new_currency);
        self.balance = converted.amount();
        if let AccountKind::Savings {
            ref mut accrued_interest,
            ..
        } = self.kind
        {
            *accrued_interest = rates
                .convert(*accrued_interest, self.currency, new_currency)
                .amount();
        }
        self.currency = new_currency;
        Ok(converted)
    }

    fn credit_limit(&self, rates: &RateTable) -> Amount {
        credit_limit_in(self.currency, rates)
    }

    fn check_savings_cap(&self, amount: Amount) -> Result<(), AccountError> {
        let max = self.balance * SAVINGS_WITHDRAWAL_SHARE;
        if amount > max {
            return Err(AccountError::ExcessiveWithdrawal {
                max,
                requested: amount,
            });
        }
        Ok(())
    }
}

/// The credit floor denominated in `currency`. -5000 RON, converted through
/// the rate table for other currencies.
pub fn credit_limit_in(currency: Currency, rates: &RateTable) -> Amount {
    if currency == Currency::Ron {
        CREDIT_LIMIT_RON
    } else {
        rates
            .convert(CREDIT_LIMIT_RON, Currency::Ron, currency)
            .amount()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn checking(balance: Amount) -> Account {
        Account::new(1, 1, balance, Currency::Ron, now(), AccountKind::Checking)
    }

    fn credit(balance: Amount, currency: Currency) -> Account {
        Account::new(2, 1, balance, currency, now(), AccountKind::Credit)
    }

    fn savings(balance: Amount, subtype: SavingsSubtype, age_days: i64) -> Account {
        Account::savings(
            3,
            1,
            balance,
            Currency::Eur,
            now() - Duration::days(age_days),
            subtype,
        )
    }

    #[test]
    fn test_checking_withdraw_succeeds_within_balance() {
        let rates = RateTable::new();
        let mut account = checking(1500.0);
        account.withdraw(200.0, &rates, now()).unwrap();
        assert_eq!(account.balance, 1300.0);
    }

    #[test]
    fn test_checking_withdraw_rejects_overdraft() {
        let rates = RateTable::new();
        let mut account = checking(100.0);
        let err = account.withdraw(100.01, &rates, now()).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
        assert_eq!(account.balance, 100.0);
    }

    #[test]
    fn test_checking_can_drain_to_zero() {
        let rates = RateTable::new();
        let mut account = checking(100.0);
        account.withdraw(100.0, &rates, now()).unwrap();
        assert_eq!(account.balance, 0.0);
    }

    #[test]
    fn test_credit_withdraw_down_to_limit() {
        let rates = RateTable::new();
        let mut account = credit(-1200.0, Currency::Ron);
        account.withdraw(1000.0, &rates, now()).unwrap();
        assert_eq!(account.balance, -2200.0);

        // -2200 - 2801 = -5001 < -5000
        let err = account.withdraw(2801.0, &rates, now()).unwrap_err();
        assert!(matches!(err, AccountError::CreditLimitExceeded { .. }));
        assert_eq!(account.balance, -2200.0);

        // exactly at the floor is allowed
        account.withdraw(2800.0, &rates, now()).unwrap();
        assert_eq!(account.balance, -5000.0);
    }

    #[test]
    fn test_credit_limit_converted_for_foreign_currency() {
        let mut rates = RateTable::new();
        rates.set_rate(Currency::Ron, Currency::Eur, 0.2);
        // limit becomes -1000 EUR
        let mut account = credit(0.0, Currency::Eur);
        account.withdraw(1000.0, &rates, now()).unwrap();
        assert_eq!(account.balance, -1000.0);
        let err = account.withdraw(0.5, &rates, now()).unwrap_err();
        assert!(matches!(err, AccountError::CreditLimitExceeded { .. }));
    }

    #[test]
    fn test_debt_interest_query() {
        let account = credit(-1200.0, Currency::Ron);
        assert_eq!(account.debt_interest(), 120.0);
        let account = credit(500.0, Currency::Ron);
        assert_eq!(account.debt_interest(), 0.0);
        // query must not mutate
        let before = credit(-1200.0, Currency::Ron);
        let _ = before.debt_interest();
        assert_eq!(before.balance, -1200.0);
    }

    #[test]
    fn test_savings_half_balance_cap() {
        let rates = RateTable::new();
        for subtype in [SavingsSubtype::Standard, SavingsSubtype::Bonus] {
            let mut account = savings(2000.0, subtype, 365);
            let err = account.withdraw(1000.01, &rates, now()).unwrap_err();
            assert!(matches!(err, AccountError::ExcessiveWithdrawal { .. }));
            assert_eq!(account.balance, 2000.0);
        }
    }

    #[test]
    fn test_bonus_locked_before_four_months() {
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Bonus, 30);
        let err = account.withdraw(500.0, &rates, now()).unwrap_err();
        assert_eq!(err, AccountError::EarlyWithdrawalLock { elapsed_months: 1 });
        assert_eq!(account.balance, 2000.0);
    }

    #[test]
    fn test_bonus_unlocked_from_four_months() {
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Bonus, 120);
        account.withdraw(500.0, &rates, now()).unwrap();
        assert_eq!(account.balance, 1500.0);
    }

    #[test]
    fn test_standard_savings_never_locked() {
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Standard, 0);
        account.withdraw(500.0, &rates, now()).unwrap();
        assert_eq!(account.balance, 1500.0);
    }

    #[test]
    fn test_cap_checked_before_lock() {
        // an excessive amount on a locked bonus account reports the cap,
        // not the lock
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Bonus, 30);
        let err = account.withdraw(1500.0, &rates, now()).unwrap_err();
        assert!(matches!(err, AccountError::ExcessiveWithdrawal { .. }));
    }

    #[test]
    fn test_forced_withdrawal_forfeits_interest() {
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Bonus, 30);
        if let AccountKind::Savings {
            ref mut accrued_interest,
            ..
        } = account.kind
        {
            *accrued_interest = 55.0;
        }
        account.withdraw_forced(500.0, &rates, now()).unwrap();
        assert_eq!(account.balance, 1500.0);
        assert_eq!(account.accrued_interest(), 0.0);
    }

    #[test]
    fn test_forced_withdrawal_still_capped() {
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Bonus, 30);
        let err = account.withdraw_forced(1500.0, &rates, now()).unwrap_err();
        assert!(matches!(err, AccountError::ExcessiveWithdrawal { .. }));
        assert_eq!(account.balance, 2000.0);
    }

    #[test]
    fn test_non_forced_withdrawal_keeps_interest() {
        let rates = RateTable::new();
        let mut account = savings(2000.0, SavingsSubtype::Standard, 0);
        account.accrue_monthly_interest(now());
        let accrued = account.accrued_interest();
        assert!(accrued > 0.0);
        account.withdraw(100.0, &rates, now()).unwrap();
        assert_eq!(account.accrued_interest(), accrued);
    }

    #[test]
    fn test_standard_accrual_two_percent() {
        let mut account = savings(1000.0, SavingsSubtype::Standard, 0);
        let interest = account.accrue_monthly_interest(now());
        assert_eq!(interest, 20.0);
        assert_eq!(account.balance, 1020.0);
        assert_eq!(account.accrued_interest(), 20.0);
    }

    #[test]
    fn test_bonus_accrual_gated_by_age() {
        let mut young = savings(1000.0, SavingsSubtype::Bonus, 60);
        assert_eq!(young.accrue_monthly_interest(now()), 0.0);
        assert_eq!(young.balance, 1000.0);

        let mut mature = savings(1000.0, SavingsSubtype::Bonus, 130);
        assert_eq!(mature.accrue_monthly_interest(now()), 50.0);
        assert_eq!(mature.balance, 1050.0);
    }

    #[test]
    fn test_accrual_overwrites_previous_snapshot() {
        let mut account = savings(1000.0, SavingsSubtype::Standard, 0);
        account.accrue_monthly_interest(now());
        assert_eq!(account.accrued_interest(), 20.0);
        // second accrual: the field holds only the latest amount
        let second = account.accrue_monthly_interest(now());
        assert!((second - 20.4).abs() < 1e-9);
        assert!((account.accrued_interest() - 20.4).abs() < 1e-9);
    }

    #[test]
    fn test_change_currency_rejects_same() {
        let rates = RateTable::new();
        let mut account = checking(100.0);
        let err = account.change_currency(Currency::Ron, &rates).unwrap_err();
        assert_eq!(err, AccountError::SameCurrency(Currency::Ron));
    }

    #[test]
    fn test_change_currency_converts_balance_and_interest() {
        let mut rates = RateTable::new();
        rates.set_rate(Currency::Eur, Currency::Ron, 5.0);
        let mut account = savings(1000.0, SavingsSubtype::Standard, 0);
        account.accrue_monthly_interest(now());

        let outcome = account.change_currency(Currency::Ron, &rates).unwrap();
        assert!(!outcome.is_missing_rate());
        assert_eq!(account.currency, Currency::Ron);
        assert_eq!(account.balance, 5100.0);
        assert_eq!(account.accrued_interest(), 100.0);
    }

    #[test]
    fn test_change_currency_without_rate_degrades() {
        let rates = RateTable::new();
        let mut account = checking(100.0);
        let outcome = account.change_currency(Currency::Eur, &rates).unwrap();
        assert!(outcome.is_missing_rate());
        // amount passes through unconverted, currency still swaps
        assert_eq!(account.balance, 100.0);
        assert_eq!(account.currency, Currency::Eur);
    }
}

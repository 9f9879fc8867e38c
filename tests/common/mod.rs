// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use argentaria::application::{AccountRequest, Bank};
use argentaria::domain::{
    Account, AccountId, Client, ClientId, Currency, RateTable, SavingsSubtype,
};
use argentaria::storage::{AuditLog, FileStore};
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// An empty bank over a temporary data directory, identity rate table.
pub fn test_bank() -> (Bank, TempDir) {
    test_bank_with_rates(RateTable::new())
}

/// Empty bank with RON<->EUR rates configured both ways.
pub fn test_bank_with_eur() -> (Bank, TempDir) {
    let mut rates = RateTable::new();
    rates.set_rate(Currency::Ron, Currency::Eur, 0.2);
    rates.set_rate(Currency::Eur, Currency::Ron, 5.0);
    test_bank_with_rates(rates)
}

pub fn test_bank_with_rates(rates: RateTable) -> (Bank, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let audit = AuditLog::new(store.audit_path());
    let bank = Bank::from_parts(vec![], vec![], vec![], rates, store, audit);
    (bank, dir)
}

/// Bank preloaded with one client and one account opened `age_days` ago.
/// Lets tests exercise the time-gated savings rules without waiting.
pub fn bank_with_aged_account(
    account: AgedAccount,
    rates: RateTable,
) -> (Bank, TempDir, ClientId, AccountId) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let audit = AuditLog::new(store.audit_path());

    let client = Client::new(1, "Ana".into(), "ana@example.com".into(), "parola".into());
    let opened_at = Utc::now() - Duration::days(account.age_days);
    let acct = match account.request {
        AccountRequest::Savings(subtype) => Account::savings(
            1000,
            client.id,
            account.balance,
            account.currency,
            opened_at,
            subtype,
        ),
        other => Account::new(
            1000,
            client.id,
            account.balance,
            account.currency,
            opened_at,
            match other {
                AccountRequest::Checking => argentaria::domain::AccountKind::Checking,
                AccountRequest::Credit => argentaria::domain::AccountKind::Credit,
                AccountRequest::Savings(_) => unreachable!(),
            },
        ),
    };

    let bank = Bank::from_parts(vec![client], vec![acct], vec![], rates, store, audit);
    (bank, dir, 1, 1000)
}

pub struct AgedAccount {
    pub request: AccountRequest,
    pub balance: f64,
    pub currency: Currency,
    pub age_days: i64,
}

impl AgedAccount {
    pub fn bonus_savings(balance: f64, currency: Currency, age_days: i64) -> Self {
        Self {
            request: AccountRequest::Savings(SavingsSubtype::Bonus),
            balance,
            currency,
            age_days,
        }
    }

    pub fn standard_savings(balance: f64, currency: Currency, age_days: i64) -> Self {
        Self {
            request: AccountRequest::Savings(SavingsSubtype::Standard),
            balance,
            currency,
            age_days,
        }
    }
}

mod common;

use argentaria::domain::{Currency, RateTable};
use argentaria::storage::FileStore;
use chrono::{Datelike, Local, NaiveDate};
use common::{AgedAccount, bank_with_aged_account};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[test]
fn test_batch_accrues_standard_savings() {
    let (mut bank, _dir, _, account) = bank_with_aged_account(
        AgedAccount::standard_savings(1000.0, Currency::Ron, 0),
        RateTable::new(),
    );

    let accrued = bank.run_monthly_interest_batch(today());
    assert_eq!(accrued, 1);
    let acct = bank.account(account).unwrap();
    assert_eq!(acct.balance, 1020.0);
    assert_eq!(acct.accrued_interest(), 20.0);
}

#[test]
fn test_batch_skips_locked_bonus_accounts() {
    let (mut bank, _dir, _, account) = bank_with_aged_account(
        AgedAccount::bonus_savings(1000.0, Currency::Eur, 60),
        RateTable::new(),
    );

    let accrued = bank.run_monthly_interest_batch(today());
    assert_eq!(accrued, 0);
    assert_eq!(bank.account(account).unwrap().balance, 1000.0);
}

#[test]
fn test_batch_applies_bonus_rate_after_lock() {
    let (mut bank, _dir, _, account) = bank_with_aged_account(
        AgedAccount::bonus_savings(1000.0, Currency::Eur, 130),
        RateTable::new(),
    );

    let accrued = bank.run_monthly_interest_batch(today());
    assert_eq!(accrued, 1);
    let acct = bank.account(account).unwrap();
    assert_eq!(acct.balance, 1050.0);
    assert_eq!(acct.accrued_interest(), 50.0);
}

#[test]
fn test_batch_runs_at_most_once_per_month() {
    let (mut bank, _dir, _, account) = bank_with_aged_account(
        AgedAccount::standard_savings(1000.0, Currency::Ron, 0),
        RateTable::new(),
    );

    assert_eq!(bank.run_monthly_interest_batch(today()), 1);
    // second run in the same month is gated off
    assert_eq!(bank.run_monthly_interest_batch(today()), 0);
    assert_eq!(bank.account(account).unwrap().balance, 1020.0);
}

#[test]
fn test_gate_respects_persisted_date_from_previous_month() {
    let (mut bank, dir, _, account) = bank_with_aged_account(
        AgedAccount::standard_savings(1000.0, Currency::Ron, 0),
        RateTable::new(),
    );

    // a run recorded last month does not block this month's batch
    let store = FileStore::new(dir.path());
    let last_month = today()
        .with_day(1)
        .unwrap()
        .pred_opt()
        .unwrap();
    store.save_last_interest_run(last_month).unwrap();

    assert_eq!(bank.run_monthly_interest_batch(today()), 1);
    assert_eq!(bank.account(account).unwrap().balance, 1020.0);

    // and the gate date has been advanced to today
    assert_eq!(store.last_interest_run(), Some(today()));
}

#[test]
fn test_gate_blocks_when_already_run_this_month() {
    let (mut bank, dir, _, account) = bank_with_aged_account(
        AgedAccount::standard_savings(1000.0, Currency::Ron, 0),
        RateTable::new(),
    );

    let store = FileStore::new(dir.path());
    store
        .save_last_interest_run(today().with_day(1).unwrap())
        .unwrap();

    assert_eq!(bank.run_monthly_interest_batch(today()), 0);
    assert_eq!(bank.account(account).unwrap().balance, 1000.0);
}

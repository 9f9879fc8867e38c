use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use tracing::warn;

use crate::domain::{
    Account, AccountId, AccountKind, Amount, Client, ClientId, Conversion, Currency, Ledger,
    RateTable, SavingsSubtype, Transaction, TransactionId, TransactionKind, credit_limit_in,
    is_settled,
};
use crate::storage::{AuditLog, FileStore};

use super::{BankError, validate};

/// Account ids start here so they are visually distinct from client ids.
const FIRST_ACCOUNT_ID: AccountId = 1000;

/// Kind of account a caller asks to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRequest {
    Checking,
    Credit,
    Savings(SavingsSubtype),
}

impl AccountRequest {
    fn into_kind(self) -> AccountKind {
        match self {
            AccountRequest::Checking => AccountKind::Checking,
            AccountRequest::Credit => AccountKind::Credit,
            AccountRequest::Savings(subtype) => AccountKind::Savings {
                subtype,
                accrued_interest: 0.0,
            },
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind.to_uppercase().as_str() {
            "CHECKING" => Some(AccountRequest::Checking),
            "CREDIT" => Some(AccountRequest::Credit),
            "SAVINGS" | "SAVINGS-STANDARD" => {
                Some(AccountRequest::Savings(SavingsSubtype::Standard))
            }
            "SAVINGS-BONUS" | "BONUS" => Some(AccountRequest::Savings(SavingsSubtype::Bonus)),
            _ => None,
        }
    }
}

/// The orchestrator: owns the clients, accounts and ledger, enforces the
/// cross-entity rules, and drives persistence and the audit trail.
///
/// Business failures are typed and leave state untouched. Persistence and
/// audit are best-effort side effects of successful mutations: an I/O error
/// is logged, never surfaced as a failure of the in-memory operation.
///
/// Single logical actor assumed; wrap a `Bank` in a mutex before exposing it
/// to concurrent callers.
pub struct Bank {
    clients: Vec<Client>,
    accounts: BTreeMap<AccountId, Account>,
    ledger: Ledger,
    rates: RateTable,
    store: FileStore,
    audit: AuditLog,
    next_client_id: ClientId,
    next_account_id: AccountId,
    next_transaction_id: TransactionId,
}

impl Bank {
    /// Load all stores from the data directory. Missing files start empty;
    /// id counters are seeded from the highest id present.
    pub fn load(store: FileStore) -> Result<Self> {
        store.ensure_dir()?;
        let audit = AuditLog::new(store.audit_path());
        let clients = store.load_clients()?;
        let accounts = store.load_accounts()?;
        let transactions = store.load_transactions()?;
        let rates = store.load_rates()?;
        Ok(Self::from_parts(
            clients,
            accounts,
            transactions,
            rates,
            store,
            audit,
        ))
    }

    /// Assemble a bank from already-loaded state. Used by [`Bank::load`] and
    /// by tests that need preconstructed accounts.
    pub fn from_parts(
        clients: Vec<Client>,
        accounts: Vec<Account>,
        transactions: Vec<Transaction>,
        rates: RateTable,
        store: FileStore,
        audit: AuditLog,
    ) -> Self {
        let next_client_id = clients.iter().map(|c| c.id + 1).max().unwrap_or(1);
        let next_account_id = accounts
            .iter()
            .map(|a| a.id + 1)
            .max()
            .unwrap_or(FIRST_ACCOUNT_ID)
            .max(FIRST_ACCOUNT_ID);
        let next_transaction_id = transactions.iter().map(|t| t.id + 1).max().unwrap_or(1);
        Self {
            clients,
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
            ledger: Ledger::from_entries(transactions),
            rates,
            store,
            audit,
            next_client_id,
            next_account_id,
            next_transaction_id,
        }
    }

    // ========================
    // Read views
    // ========================

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn accounts_of(&self, client_id: ClientId) -> impl Iterator<Item = &Account> {
        self.accounts
            .values()
            .filter(move |a| a.client_id == client_id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.all()
    }

    pub fn transactions_of(&self, account_id: AccountId) -> impl Iterator<Item = &Transaction> {
        self.ledger.for_account(account_id)
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    // ========================
    // Authentication & registration
    // ========================

    /// Match a client by email (case-insensitive) and exact password.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&Client> {
        let found = self
            .clients
            .iter()
            .find(|c| c.has_email(email) && c.password == password);
        match found {
            Some(client) => {
                self.audit.log(&format!("login succeeded for {}", email));
                Some(client)
            }
            None => {
                self.audit.log(&format!("login failed for {}", email));
                None
            }
        }
    }

    /// Register a new client together with their first account. Unlike
    /// [`Bank::open_account`], this persists immediately.
    pub fn register_client_and_account(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        request: AccountRequest,
        currency: Currency,
        opening_balance: Amount,
    ) -> Result<ClientId, BankError> {
        validate::validate_email(email)?;
        validate::validate_password(password)?;
        validate::validate_opening_balance(opening_balance, self.opening_floor(request, currency))?;
        if self.clients.iter().any(|c| c.has_email(email)) {
            return Err(BankError::DuplicateEmail(email.to_string()));
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;
        self.clients.push(Client::new(
            client_id,
            name.to_string(),
            email.to_string(),
            password.to_string(),
        ));

        let account_id = self.allocate_account(client_id, request, opening_balance, currency);
        self.save();
        self.audit.log(&format!(
            "registered client {} ({}) with {} account {}",
            client_id,
            email,
            request.into_kind().name(),
            account_id
        ));
        Ok(client_id)
    }

    /// Open an additional account for an existing client. Does not persist;
    /// the caller decides when to flush.
    pub fn open_account(
        &mut self,
        client_id: ClientId,
        request: AccountRequest,
        opening_balance: Amount,
        currency: Currency,
    ) -> Result<AccountId, BankError> {
        validate::validate_opening_balance(opening_balance, self.opening_floor(request, currency))?;
        if self.client(client_id).is_none() {
            return Err(BankError::ClientNotFound(client_id));
        }
        Ok(self.allocate_account(client_id, request, opening_balance, currency))
    }

    /// Credit accounts may open in debt, down to the credit floor in the
    /// account's currency; every other kind starts at zero or above.
    fn opening_floor(&self, request: AccountRequest, currency: Currency) -> Amount {
        match request {
            AccountRequest::Credit => credit_limit_in(currency, &self.rates),
            _ => 0.0,
        }
    }

    fn allocate_account(
        &mut self,
        client_id: ClientId,
        request: AccountRequest,
        opening_balance: Amount,
        currency: Currency,
    ) -> AccountId {
        let id = self.next_account_id;
        self.next_account_id += 1;
        let account = Account::new(
            id,
            client_id,
            opening_balance,
            currency,
            Utc::now(),
            request.into_kind(),
        );
        self.accounts.insert(id, account);
        id
    }

    // ========================
    // Money movement
    // ========================

    pub fn deposit(
        &mut self,
        client_id: ClientId,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<(), BankError> {
        validate::validate_amount(amount)?;
        let account = self.owned_account_mut(client_id, account_id)?;
        account.deposit(amount);
        self.record(account_id, account_id, amount, TransactionKind::Deposit);
        self.save();
        self.audit.log(&format!(
            "deposit of {:.2} into account {}",
            amount, account_id
        ));
        Ok(())
    }

    /// Withdraw under the account variant's rules. The bonus early-lock is
    /// surfaced to the caller (see [`BankError::is_early_withdrawal_lock`])
    /// rather than resolved here.
    pub fn withdraw(
        &mut self,
        client_id: ClientId,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<(), BankError> {
        self.withdraw_inner(client_id, account_id, amount, false)
    }

    /// The confirmed retry path for a locked bonus account: forfeits the
    /// accrued interest before debiting.
    pub fn withdraw_forced(
        &mut self,
        client_id: ClientId,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<(), BankError> {
        self.withdraw_inner(client_id, account_id, amount, true)
    }

    fn withdraw_inner(
        &mut self,
        client_id: ClientId,
        account_id: AccountId,
        amount: Amount,
        forced: bool,
    ) -> Result<(), BankError> {
        validate::validate_amount(amount)?;
        let rates = self.rates.clone();
        let now = Utc::now();
        let account = self.owned_account_mut(client_id, account_id)?;
        if forced {
            account.withdraw_forced(amount, &rates, now)?;
        } else {
            account.withdraw(amount, &rates, now)?;
        }
        self.record(account_id, account_id, amount, TransactionKind::Withdrawal);
        self.save();
        self.audit.log(&format!(
            "withdrawal of {:.2} from account {}{}",
            amount,
            account_id,
            if forced { " (forced)" } else { "" }
        ));
        Ok(())
    }

    /// Move money between two accounts. The amount is interpreted in the
    /// source currency; cross-currency transfers convert through the rate
    /// table and refuse to proceed when the pair has no rate.
    ///
    /// All-or-nothing: the debit is first attempted on a scratch copy of the
    /// source account, so a failure at any step leaves both balances and the
    /// ledger exactly as they were.
    pub fn transfer(
        &mut self,
        source_id: AccountId,
        dest_id: AccountId,
        amount: Amount,
    ) -> Result<TransactionId, BankError> {
        validate::validate_amount(amount)?;
        let source = self
            .accounts
            .get(&source_id)
            .ok_or(BankError::AccountNotFound(source_id))?;
        let dest = self
            .accounts
            .get(&dest_id)
            .ok_or(BankError::AccountNotFound(dest_id))?;

        let credited = match self.rates.convert(amount, source.currency, dest.currency) {
            Conversion::Converted(v) => v,
            Conversion::MissingRate(_) => {
                return Err(BankError::MissingConversionRate {
                    from: source.currency,
                    to: dest.currency,
                });
            }
        };

        let mut debited_source = source.clone();
        debited_source.withdraw(amount, &self.rates, Utc::now())?;

        // every fallible step has passed; commit
        self.accounts.insert(source_id, debited_source);
        if let Some(dest) = self.accounts.get_mut(&dest_id) {
            dest.deposit(credited);
        }
        let tx_id = self.record(source_id, dest_id, amount, TransactionKind::Transfer);
        self.save();
        self.audit.log(&format!(
            "transfer of {:.2} from account {} to account {}",
            amount, source_id, dest_id
        ));
        Ok(tx_id)
    }

    /// Re-denominate an account. Missing rates degrade gracefully (the
    /// amount passes through unconverted); the returned [`Conversion`] lets
    /// the caller surface that.
    pub fn change_currency(
        &mut self,
        client_id: ClientId,
        account_id: AccountId,
        new_currency: Currency,
    ) -> Result<Conversion, BankError> {
        let rates = self.rates.clone();
        let account = self.owned_account_mut(client_id, account_id)?;
        let outcome = account.change_currency(new_currency, &rates)?;
        self.save();
        self.audit.log(&format!(
            "account {} re-denominated to {}{}",
            account_id,
            new_currency,
            if outcome.is_missing_rate() {
                " (no rate, balance unconverted)"
            } else {
                ""
            }
        ));
        Ok(outcome)
    }

    /// Close an account whose balance has settled to (within 0.01 of) zero.
    /// Cascades removal of every ledger entry referencing it; returns how
    /// many entries were dropped.
    pub fn close_account(
        &mut self,
        account_id: AccountId,
        client_id: ClientId,
    ) -> Result<usize, BankError> {
        let account = self
            .accounts
            .get(&account_id)
            .ok_or(BankError::AccountNotFound(account_id))?;
        if account.client_id != client_id {
            return Err(BankError::UnauthorizedAccount {
                account: account_id,
                client: client_id,
            });
        }
        if !is_settled(account.balance) {
            return Err(BankError::NonZeroBalance {
                account: account_id,
                balance: account.balance,
            });
        }
        self.accounts.remove(&account_id);
        let removed = self.ledger.remove_where(|t| t.touches(account_id));
        self.save();
        self.audit.log(&format!(
            "closed account {} ({} ledger entries removed)",
            account_id, removed
        ));
        Ok(removed)
    }

    // ========================
    // Interest
    // ========================

    /// Apply monthly interest to every savings account, at most once per
    /// calendar month. The gate is the persisted last-run date: the batch
    /// runs only when it predates the first day of `today`'s month (or was
    /// never recorded). Returns how many accounts actually accrued.
    pub fn run_monthly_interest_batch(&mut self, today: NaiveDate) -> usize {
        let first_of_month = today.with_day(1).expect("day 1 always exists");
        if let Some(last) = self.store.last_interest_run() {
            if last >= first_of_month {
                return 0;
            }
        }

        let now = Utc::now();
        let mut accrued = 0;
        for account in self.accounts.values_mut() {
            if account.accrue_monthly_interest(now) > 0.0 {
                accrued += 1;
            }
        }

        if let Err(err) = self.store.save_last_interest_run(today) {
            warn!(%err, "failed to persist interest-run date");
        }
        self.save();
        self.audit.log(&format!(
            "monthly interest batch: {} savings accounts accrued",
            accrued
        ));
        accrued
    }

    // ========================
    // Rates
    // ========================

    /// Single-direction rate update; the inverse pair is the caller's call.
    pub fn update_rate(&mut self, from: Currency, to: Currency, value: f64) {
        self.rates.set_rate(from, to, value);
        if let Err(err) = self.store.save_rates(&self.rates) {
            warn!(%err, "failed to persist rates");
        }
        self.audit
            .log(&format!("rate updated: {} -> {} = {}", from, to, value));
    }

    // ========================
    // Persistence
    // ========================

    /// Whole-file rewrite of all three stores. Best-effort: failures are
    /// logged and the in-memory state stays authoritative for this session.
    pub fn save(&self) {
        if let Err(err) = self.store.save_clients(&self.clients) {
            warn!(%err, "failed to persist clients");
        }
        if let Err(err) = self.store.save_accounts(self.accounts.values()) {
            warn!(%err, "failed to persist accounts");
        }
        if let Err(err) = self.store.save_transactions(self.ledger.all()) {
            warn!(%err, "failed to persist transactions");
        }
    }

    /// Write the text report into the data directory.
    pub fn write_report(&self) -> Result<std::path::PathBuf> {
        let report = super::reporting::render_report(self);
        let path = self.store.write_report(&report)?;
        self.audit.log("report generated");
        Ok(path)
    }

    // ========================
    // Internals
    // ========================

    fn owned_account_mut(
        &mut self,
        client_id: ClientId,
        account_id: AccountId,
    ) -> Result<&mut Account, BankError> {
        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or(BankError::AccountNotFound(account_id))?;
        if account.client_id != client_id {
            return Err(BankError::UnauthorizedAccount {
                account: account_id,
                client: client_id,
            });
        }
        Ok(account)
    }

    fn record(
        &mut self,
        source: AccountId,
        dest: AccountId,
        amount: Amount,
        kind: TransactionKind,
    ) -> TransactionId {
        let id = self.next_transaction_id;
        self.next_transaction_id += 1;
        self.ledger
            .append(Transaction::new(id, source, dest, amount, kind, Utc::now()));
        id
    }
}

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::warn;

use crate::domain::{
    Account, AccountKind, Client, Currency, RateTable, SavingsSubtype, Transaction,
    TransactionKind,
};

const CLIENTS_FILE: &str = "clients.txt";
const ACCOUNTS_FILE: &str = "accounts.txt";
const TRANSACTIONS_FILE: &str = "transactions.txt";
const LAST_INTEREST_FILE: &str = "last_interest_run.txt";
const RATES_FILE: &str = "rates.txt";
const REPORT_FILE: &str = "report.txt";

/// Flat-file store: one semicolon-delimited record per line, whole-file
/// rewrite on every save. A crash mid-write can leave a store truncated or
/// out of step with the others; that is an accepted failure mode of the
/// format, not something this layer masks.
///
/// Missing files load as empty stores. Individual malformed rows are skipped
/// with a warning rather than failing the whole load.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the data directory if it doesn't exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create data dir {}", self.dir.display()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn audit_path(&self) -> PathBuf {
        self.dir.join("audit.log")
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn reader(path: &Path) -> Result<csv::Reader<File>> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(file))
    }

    fn writer(path: &Path) -> Result<csv::Writer<File>> {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_writer(file))
    }

    // ========================
    // Clients
    // ========================

    /// Rows are `id;name;email;password;admin;loyalty`; the trailing two
    /// fields are later additions and default to false / 0 when absent.
    pub fn load_clients(&self) -> Result<Vec<Client>> {
        let path = self.path(CLIENTS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut clients = Vec::new();
        for record in Self::reader(&path)?.records() {
            let record = record.with_context(|| format!("bad row in {}", path.display()))?;
            match parse_client(&record) {
                Some(client) => clients.push(client),
                None => warn!(?record, "skipping malformed client row"),
            }
        }
        Ok(clients)
    }

    pub fn save_clients(&self, clients: &[Client]) -> Result<()> {
        let path = self.path(CLIENTS_FILE);
        let mut writer = Self::writer(&path)?;
        for c in clients {
            writer.write_record([
                c.id.to_string(),
                c.name.clone(),
                c.email.clone(),
                c.password.clone(),
                c.admin.to_string(),
                c.loyalty_score.to_string(),
            ])?;
        }
        writer.flush().context("failed to flush clients file")?;
        Ok(())
    }

    // ========================
    // Accounts
    // ========================

    /// Rows are `id;balance;clientId;currency;kind;openedAt` with a trailing
    /// `;subtype;accruedInterest` pair on savings rows only. Absent trailing
    /// fields default to Standard / 0.0.
    pub fn load_accounts(&self) -> Result<Vec<Account>> {
        let path = self.path(ACCOUNTS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut accounts = Vec::new();
        for record in Self::reader(&path)?.records() {
            let record = record.with_context(|| format!("bad row in {}", path.display()))?;
            match parse_account(&record) {
                Some(account) => accounts.push(account),
                None => warn!(?record, "skipping malformed account row"),
            }
        }
        Ok(accounts)
    }

    pub fn save_accounts<'a>(&self, accounts: impl Iterator<Item = &'a Account>) -> Result<()> {
        let path = self.path(ACCOUNTS_FILE);
        let mut writer = Self::writer(&path)?;
        for a in accounts {
            let base = [
                a.id.to_string(),
                a.balance.to_string(),
                a.client_id.to_string(),
                a.currency.to_string(),
                a.kind.name().to_string(),
                a.opened_at.to_rfc3339(),
            ];
            match a.kind {
                AccountKind::Savings {
                    subtype,
                    accrued_interest,
                } => {
                    let mut row = base.to_vec();
                    row.push(subtype.as_str().to_string());
                    row.push(accrued_interest.to_string());
                    writer.write_record(&row)?;
                }
                _ => writer.write_record(&base)?,
            }
        }
        writer.flush().context("failed to flush accounts file")?;
        Ok(())
    }

    // ========================
    // Transactions
    // ========================

    /// Rows are `id;sourceId;destId;amount;kind;timestamp`. Older five-field
    /// rows without a kind tag load as transfers.
    pub fn load_transactions(&self) -> Result<Vec<Transaction>> {
        let path = self.path(TRANSACTIONS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut transactions = Vec::new();
        for record in Self::reader(&path)?.records() {
            let record = record.with_context(|| format!("bad row in {}", path.display()))?;
            match parse_transaction(&record) {
                Some(tx) => transactions.push(tx),
                None => warn!(?record, "skipping malformed transaction row"),
            }
        }
        Ok(transactions)
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let path = self.path(TRANSACTIONS_FILE);
        let mut writer = Self::writer(&path)?;
        for t in transactions {
            writer.write_record([
                t.id.to_string(),
                t.source_account.to_string(),
                t.dest_account.to_string(),
                t.amount.to_string(),
                t.kind.to_string(),
                t.timestamp.to_rfc3339(),
            ])?;
        }
        writer.flush().context("failed to flush transactions file")?;
        Ok(())
    }

    // ========================
    // Rates
    // ========================

    /// `KEY=VALUE` lines with keys of the form `<FROM>_TO_<TO>`. Unknown
    /// currencies and malformed lines are skipped; a missing file leaves the
    /// identity table (diagonal 1.0, everything else unset).
    pub fn load_rates(&self) -> Result<RateTable> {
        let mut table = RateTable::new();
        let path = self.path(RATES_FILE);
        if !path.exists() {
            return Ok(table);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(line, "skipping malformed rate line");
                continue;
            };
            let Some((from, to)) = parse_rate_key(key.trim()) else {
                warn!(line, "skipping rate line with unknown currency pair");
                continue;
            };
            match value.trim().parse::<f64>() {
                Ok(rate) => table.set_rate(from, to, rate),
                Err(_) => warn!(line, "skipping rate line with unparseable value"),
            }
        }
        Ok(table)
    }

    pub fn save_rates(&self, table: &RateTable) -> Result<()> {
        use crate::domain::CURRENCIES;
        let path = self.path(RATES_FILE);
        let mut lines = String::new();
        for from in CURRENCIES {
            for to in CURRENCIES {
                if from != to && table.rate(from, to) != 0.0 {
                    lines.push_str(&format!("{}_TO_{}={}\n", from, to, table.rate(from, to)));
                }
            }
        }
        fs::write(&path, lines).with_context(|| format!("failed to write {}", path.display()))
    }

    // ========================
    // Interest-run gate
    // ========================

    /// Date of the last monthly interest run; `None` when it never ran or the
    /// file is unreadable.
    pub fn last_interest_run(&self) -> Option<NaiveDate> {
        let content = fs::read_to_string(self.path(LAST_INTEREST_FILE)).ok()?;
        content.trim().parse().ok()
    }

    pub fn save_last_interest_run(&self, date: NaiveDate) -> Result<()> {
        let path = self.path(LAST_INTEREST_FILE);
        fs::write(&path, format!("{}\n", date))
            .with_context(|| format!("failed to write {}", path.display()))
    }

    // ========================
    // Report
    // ========================

    pub fn write_report(&self, content: &str) -> Result<PathBuf> {
        let path = self.path(REPORT_FILE);
        fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn field(record: &StringRecord, i: usize) -> Option<&str> {
    record.get(i).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_client(record: &StringRecord) -> Option<Client> {
    let id = field(record, 0)?.parse().ok()?;
    let name = field(record, 1)?.to_string();
    let email = field(record, 2)?.to_string();
    let password = field(record, 3)?.to_string();
    let mut client = Client::new(id, name, email, password);
    if let Some(admin) = field(record, 4) {
        client.admin = admin.parse().ok()?;
    }
    if let Some(loyalty) = field(record, 5) {
        client.loyalty_score = loyalty.parse().ok()?;
    }
    Some(client)
}

fn parse_account(record: &StringRecord) -> Option<Account> {
    let id = field(record, 0)?.parse().ok()?;
    let balance = field(record, 1)?.parse().ok()?;
    let client_id = field(record, 2)?.parse().ok()?;
    let currency = Currency::from_str(field(record, 3)?)?;
    let kind_name = field(record, 4)?.to_uppercase();
    let opened_at = match field(record, 5) {
        Some(raw) => DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc),
        None => Utc::now(),
    };
    let kind = match kind_name.as_str() {
        "CHECKING" => AccountKind::Checking,
        "CREDIT" => AccountKind::Credit,
        "SAVINGS" => {
            let subtype = field(record, 6)
                .and_then(SavingsSubtype::from_str)
                .unwrap_or(SavingsSubtype::Standard);
            let accrued_interest = field(record, 7).and_then(|s| s.parse().ok()).unwrap_or(0.0);
            AccountKind::Savings {
                subtype,
                accrued_interest,
            }
        }
        _ => return None,
    };
    Some(Account::new(id, client_id, balance, currency, opened_at, kind))
}

fn parse_transaction(record: &StringRecord) -> Option<Transaction> {
    let id = field(record, 0)?.parse().ok()?;
    let source = field(record, 1)?.parse().ok()?;
    let dest = field(record, 2)?.parse().ok()?;
    let amount = field(record, 3)?.parse().ok()?;
    // five-field rows predate the kind tag
    let (kind, ts_field) = if record.len() >= 6 {
        (TransactionKind::from_str(field(record, 4)?)?, 5)
    } else {
        (TransactionKind::Transfer, 4)
    };
    let timestamp = DateTime::parse_from_rfc3339(field(record, ts_field)?)
        .ok()?
        .with_timezone(&Utc);
    Some(Transaction::new(id, source, dest, amount, kind, timestamp))
}

fn parse_rate_key(key: &str) -> Option<(Currency, Currency)> {
    let (from, to) = key.split_once("_TO_")?;
    Some((Currency::from_str(from)?, Currency::from_str(to)?))
}

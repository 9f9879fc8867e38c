use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::Bank;
use crate::domain::{Account, Client, Transaction};

/// Full-state snapshot for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub clients: Vec<Client>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

/// Exporter for handing bank data to external tools.
pub struct Exporter<'a> {
    bank: &'a Bank,
}

impl<'a> Exporter<'a> {
    pub fn new(bank: &'a Bank) -> Self {
        Self { bank }
    }

    /// Export the whole state as pretty-printed JSON.
    pub fn export_snapshot_json<W: Write>(&self, writer: W) -> Result<()> {
        let snapshot = BankSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            clients: self.bank.clients().to_vec(),
            accounts: self.bank.accounts().cloned().collect(),
            transactions: self.bank.transactions().to_vec(),
        };
        serde_json::to_writer_pretty(writer, &snapshot)?;
        Ok(())
    }

    /// Export the ledger as comma-delimited CSV with a header row; returns
    /// the number of rows written.
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["id", "source_account", "dest_account", "amount", "kind", "timestamp"])?;

        let mut count = 0;
        for tx in self.bank.transactions() {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.source_account.to_string(),
                tx.dest_account.to_string(),
                tx.amount.to_string(),
                tx.kind.to_string(),
                tx.timestamp.to_rfc3339(),
            ])?;
            count += 1;
        }
        csv_writer.flush()?;
        Ok(count)
    }
}

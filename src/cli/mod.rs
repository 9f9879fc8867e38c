use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::application::{AccountRequest, Bank, BankError};
use crate::domain::{Currency, format_amount, parse_amount};
use crate::io::Exporter;
use crate::storage::FileStore;

/// Argentaria - flat-file retail banking engine
#[derive(Parser)]
#[command(name = "argentaria")]
#[command(about = "A small retail bank over flat-file records")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the flat record files
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new client together with a first account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Account kind: checking, credit, savings or savings-bonus
        #[arg(long, default_value = "checking")]
        kind: String,
        #[arg(long, default_value = "RON")]
        currency: String,
        /// Opening balance (e.g. "1500" or "1500.00")
        #[arg(long, default_value = "0")]
        balance: String,
    },

    /// Open an additional account for an existing client
    Open {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        kind: String,
        #[arg(long, default_value = "RON")]
        currency: String,
        #[arg(long, default_value = "0")]
        balance: String,
    },

    /// Deposit into one of your accounts
    Deposit {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        account: u32,
        amount: String,
    },

    /// Withdraw from one of your accounts
    Withdraw {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        account: u32,
        amount: String,
        /// Confirm a locked bonus-savings withdrawal, forfeiting the accrued
        /// interest
        #[arg(long)]
        force: bool,
    },

    /// Transfer between accounts (amount in the source currency)
    Transfer {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
        amount: String,
    },

    /// Re-denominate an account into another currency
    Convert {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        account: u32,
        currency: String,
    },

    /// Close a settled account and drop its ledger entries
    Close {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        account: u32,
    },

    /// Run the monthly interest batch (no-op if it already ran this month)
    Accrue,

    /// Set a single-direction conversion rate
    SetRate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        value: f64,
    },

    /// Write the text report into the data directory
    Report,

    /// List registered clients
    Clients,

    /// List your accounts
    Accounts {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// List ledger entries, optionally for a single account
    Transactions {
        #[arg(long)]
        account: Option<u32>,
    },

    /// Export data: "snapshot" (JSON) or "transactions" (CSV)
    Export {
        export_type: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let store = FileStore::new(&self.data_dir);
        let mut bank = Bank::load(store)?;

        // the only scheduled work: once per process start, gated per month
        let accrued = bank.run_monthly_interest_batch(Local::now().date_naive());
        if accrued > 0 {
            println!("Monthly interest applied to {} savings account(s).", accrued);
        }

        match self.command {
            Commands::Register {
                name,
                email,
                password,
                kind,
                currency,
                balance,
            } => {
                let client_id = bank.register_client_and_account(
                    &name,
                    &email,
                    &password,
                    parse_kind(&kind)?,
                    parse_currency(&currency)?,
                    parse_amount(&balance).context("invalid opening balance")?,
                )?;
                println!("Registered client {} ({}).", client_id, email);
            }

            Commands::Open {
                email,
                password,
                kind,
                currency,
                balance,
            } => {
                let client_id = login(&bank, &email, &password)?;
                let account_id = bank.open_account(
                    client_id,
                    parse_kind(&kind)?,
                    parse_amount(&balance).context("invalid opening balance")?,
                    parse_currency(&currency)?,
                )?;
                // opening alone doesn't flush; do it here
                bank.save();
                println!("Opened account {}.", account_id);
            }

            Commands::Deposit {
                email,
                password,
                account,
                amount,
            } => {
                let client_id = login(&bank, &email, &password)?;
                let amount = parse_amount(&amount).context("invalid amount")?;
                bank.deposit(client_id, account, amount)?;
                println!("Deposited {} into account {}.", format_amount(amount), account);
            }

            Commands::Withdraw {
                email,
                password,
                account,
                amount,
                force,
            } => {
                let client_id = login(&bank, &email, &password)?;
                let amount = parse_amount(&amount).context("invalid amount")?;
                match bank.withdraw(client_id, account, amount) {
                    Ok(()) => {
                        println!("Withdrew {} from account {}.", format_amount(amount), account)
                    }
                    Err(err) if err.is_early_withdrawal_lock() => {
                        if force {
                            bank.withdraw_forced(client_id, account, amount)?;
                            println!(
                                "Withdrew {} from account {} (accrued interest forfeited).",
                                format_amount(amount),
                                account
                            );
                        } else {
                            bail!("{err}. Re-run with --force to withdraw anyway and forfeit the accrued interest.");
                        }
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            Commands::Transfer {
                email,
                password,
                from,
                to,
                amount,
            } => {
                let client_id = login(&bank, &email, &password)?;
                let source = bank
                    .account(from)
                    .ok_or(BankError::AccountNotFound(from))?;
                if source.client_id != client_id {
                    return Err(BankError::UnauthorizedAccount {
                        account: from,
                        client: client_id,
                    }
                    .into());
                }
                let amount = parse_amount(&amount).context("invalid amount")?;
                let tx_id = bank.transfer(from, to, amount)?;
                println!(
                    "Transferred {} from account {} to account {} (transaction {}).",
                    format_amount(amount),
                    from,
                    to,
                    tx_id
                );
            }

            Commands::Convert {
                email,
                password,
                account,
                currency,
            } => {
                let client_id = login(&bank, &email, &password)?;
                let target = parse_currency(&currency)?;
                let outcome = bank.change_currency(client_id, account, target)?;
                if outcome.is_missing_rate() {
                    println!(
                        "Account {} is now in {}, but no rate was configured: the balance passed through unconverted.",
                        account, target
                    );
                } else {
                    println!("Account {} converted to {}.", account, target);
                }
            }

            Commands::Close {
                email,
                password,
                account,
            } => {
                let client_id = login(&bank, &email, &password)?;
                let removed = bank.close_account(account, client_id)?;
                println!(
                    "Closed account {} ({} ledger entries removed).",
                    account, removed
                );
            }

            Commands::Accrue => {
                // already attempted above; report the gate state
                if accrued == 0 {
                    println!("Interest batch already ran this month; nothing to do.");
                }
            }

            Commands::SetRate { from, to, value } => {
                let from = parse_currency(&from)?;
                let to = parse_currency(&to)?;
                bank.update_rate(from, to, value);
                println!("Rate {} -> {} set to {}.", from, to, value);
            }

            Commands::Report => {
                let path = bank.write_report()?;
                println!("Report written to {}.", path.display());
            }

            Commands::Clients => {
                for client in bank.clients() {
                    println!("{}", client);
                }
            }

            Commands::Accounts { email, password } => {
                let client_id = login(&bank, &email, &password)?;
                for account in bank.accounts_of(client_id) {
                    println!(
                        "{} | {} | {} {}",
                        account.id,
                        account.kind.name(),
                        format_amount(account.balance),
                        account.currency
                    );
                }
            }

            Commands::Transactions { account } => {
                let entries: Vec<_> = match account {
                    Some(id) => bank.transactions_of(id).collect(),
                    None => bank.transactions().iter().collect(),
                };
                for tx in entries {
                    println!(
                        "{} | {} | {} -> {} | {} | {}",
                        tx.id,
                        tx.kind,
                        tx.source_account,
                        tx.dest_account,
                        format_amount(tx.amount),
                        tx.timestamp.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let exporter = Exporter::new(&bank);
                let mut writer: Box<dyn Write> = match &output {
                    Some(path) => Box::new(
                        File::create(path).with_context(|| format!("cannot create {path}"))?,
                    ),
                    None => Box::new(io::stdout()),
                };
                match export_type.as_str() {
                    "snapshot" => exporter.export_snapshot_json(&mut writer)?,
                    "transactions" => {
                        exporter.export_transactions_csv(&mut writer)?;
                    }
                    other => bail!("unknown export type: {other}"),
                }
            }
        }

        Ok(())
    }
}

fn login(bank: &Bank, email: &str, password: &str) -> Result<u32> {
    bank.authenticate(email, password)
        .map(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("authentication failed for {email}"))
}

fn parse_kind(kind: &str) -> Result<AccountRequest> {
    AccountRequest::parse(kind)
        .with_context(|| format!("unknown account kind: {kind} (expected checking, credit, savings or savings-bonus)"))
}

fn parse_currency(currency: &str) -> Result<Currency> {
    Currency::from_str(currency).with_context(|| format!("unknown currency: {currency}"))
}

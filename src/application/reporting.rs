use std::fmt::Write;

use crate::domain::format_amount;

use super::Bank;

/// Render the bank overview as plain text: totals, then a per-client
/// breakdown by account kind. Balances are summed nominally across
/// currencies, as the report always has.
pub fn render_report(bank: &Bank) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== BANK REPORT ===");
    let _ = writeln!(out, "Clients on file: {}", bank.clients().len());
    let _ = writeln!(out, "Accounts on file: {}", bank.accounts().count());
    let _ = writeln!(out, "Ledger entries: {}", bank.transactions().len());

    let total: f64 = bank.accounts().map(|a| a.balance).sum();
    let _ = writeln!(out, "Gross balance across accounts: {}", format_amount(total));

    let _ = writeln!(out, "\n=== PER CLIENT ===");
    for client in bank.clients() {
        let _ = writeln!(out, "{} <{}>", client.name, client.email);
        for account in bank.accounts_of(client.id) {
            let _ = write!(
                out,
                "  - {} #{}: {} {}",
                account.kind.name(),
                account.id,
                format_amount(account.balance),
                account.currency
            );
            let debt = account.debt_interest();
            if debt > 0.0 {
                let _ = write!(out, " (debt interest owed: {})", format_amount(debt));
            }
            if account.is_savings() {
                let _ = write!(
                    out,
                    " (last accrual: {})",
                    format_amount(account.accrued_interest())
                );
            }
            let _ = writeln!(out);
        }
    }
    out
}

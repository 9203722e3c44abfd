use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::domain::{AccountSnapshot, Amount, checked_sum, format_amount};

/// Balance sheet for JSON export
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheet {
    pub exported_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Amount,
    pub accounts: Vec<AccountSnapshot>,
}

impl BalanceSheet {
    pub fn new(accounts: Vec<AccountSnapshot>) -> Result<Self> {
        let total = checked_sum(accounts.iter().map(|account| account.balance))
            .context("Total balance exceeds the representable range")?;
        Ok(Self {
            exported_at: Utc::now(),
            total,
            accounts,
        })
    }
}

/// Export balances to CSV format
pub fn export_balances_csv<W: Write>(writer: W, accounts: &[AccountSnapshot]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "balance"])?;

    for account in accounts {
        csv_writer.write_record([account.id.as_str(), format_amount(account.balance).as_str()])?;
    }

    csv_writer.flush()?;
    Ok(accounts.len())
}

/// Export balances as a pretty-printed JSON balance sheet
pub fn export_balances_json<W: Write>(mut writer: W, accounts: &[AccountSnapshot]) -> Result<usize> {
    let sheet = BalanceSheet::new(accounts.to_vec())?;
    serde_json::to_writer_pretty(&mut writer, &sheet)?;
    writeln!(writer)?;
    Ok(sheet.accounts.len())
}

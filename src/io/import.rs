use anyhow::{Context, Result};
use std::io::Read;

use crate::domain::{AccountSnapshot, TransferRequest, parse_amount};
use crate::storage::InMemoryAccountStore;

/// Transfers read from a batch file, plus the lines that could not be used
#[derive(Debug, Clone, Default)]
pub struct BatchFile {
    pub requests: Vec<TransferRequest>,
    pub errors: Vec<ImportError>,
}

/// Error that occurred while reading a batch line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Read account snapshots from a JSON array:
/// `[{"id": "alice", "balance": "500.00"}, ...]`
pub fn load_accounts_json<R: Read>(reader: R) -> Result<Vec<AccountSnapshot>> {
    let snapshots: Vec<AccountSnapshot> =
        serde_json::from_reader(reader).context("Failed to parse accounts file")?;
    Ok(snapshots)
}

/// Build an account store from a JSON seed.
pub fn seed_store_json<R: Read>(reader: R) -> Result<InMemoryAccountStore> {
    let snapshots = load_accounts_json(reader)?;
    let store = InMemoryAccountStore::from_snapshots(snapshots)
        .context("Failed to seed account store")?;
    Ok(store)
}

/// Read transfer requests from CSV with a `from,to,amount` header.
/// Bad lines are collected in `errors` and skipped.
pub fn read_transfer_batch_csv<R: Read>(reader: R) -> Result<BatchFile> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut batch = BatchFile::default();

    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                batch.errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        let from = record.get(0).unwrap_or("");
        let to = record.get(1).unwrap_or("");
        let amount_str = record.get(2).unwrap_or("");

        if from.is_empty() || to.is_empty() {
            batch.errors.push(ImportError {
                line,
                field: Some(if from.is_empty() { "from" } else { "to" }.to_string()),
                error: "Missing account id".to_string(),
            });
            continue;
        }

        // Sign is not checked here: the engine rejects non-positive amounts itself
        let amount = match parse_amount(amount_str) {
            Ok(a) => a,
            Err(e) => {
                batch.errors.push(ImportError {
                    line,
                    field: Some("amount".to_string()),
                    error: format!("Invalid amount: {}", e),
                });
                continue;
            }
        };

        batch.requests.push(TransferRequest::new(from, to, amount));
    }

    Ok(batch)
}

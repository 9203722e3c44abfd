use anyhow::{Context, Result, bail, ensure};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufReader, stdout};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::application::{TracingNotifier, TransferOrchestrator, TransferResponse};
use crate::config::EngineConfig;
use crate::domain::{Amount, TransferRequest, format_amount, parse_amount};
use crate::io::{export_balances_csv, export_balances_json, read_transfer_batch_csv, seed_store_json};
use crate::logging::init_tracing;
use crate::storage::InMemoryAccountStore;

/// Remit - concurrent funds transfers between in-memory accounts
#[derive(Parser)]
#[command(name = "remit")]
#[command(about = "Run funds transfers against a set of in-memory accounts")]
#[command(version)]
pub struct Cli {
    /// JSON file with the opening accounts: [{"id": "alice", "balance": "500.00"}]
    #[arg(short, long, default_value = "accounts.json", global = true)]
    pub accounts: String,

    /// Give up waiting for an account lock after this many milliseconds (0 = wait forever)
    #[arg(long, global = true)]
    pub lock_timeout_ms: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Source account id
        #[arg(long)]
        from: String,

        /// Destination account id
        #[arg(long)]
        to: String,
    },

    /// Run every transfer of a CSV file (from,to,amount) concurrently
    Batch {
        /// CSV file with a from,to,amount header
        file: String,
    },

    /// Hammer one account pair with transfers in both directions
    Stress {
        /// First account id
        #[arg(long)]
        from: String,

        /// Second account id
        #[arg(long)]
        to: String,

        /// Total number of transfers, split evenly between both directions
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Amount of each transfer
        #[arg(long, default_value = "1")]
        amount: String,
    },

    /// Show opening balances
    Balances {
        /// Output format: table, csv, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        let file = File::open(&self.accounts)
            .with_context(|| format!("Cannot open accounts file '{}'", self.accounts))?;
        let store = Arc::new(seed_store_json(BufReader::new(file))?);
        let config = EngineConfig::from_lock_timeout_ms(self.lock_timeout_ms);
        let orchestrator = Arc::new(TransferOrchestrator::with_config(
            store.clone(),
            Arc::new(TracingNotifier),
            config,
        ));

        match self.command {
            Commands::Transfer { amount, from, to } => {
                let amount = parse_amount(&amount)
                    .context("Invalid amount format. Use '50.00' or '50'")?;
                run_transfer_command(&orchestrator, &store, &from, &to, amount).await?;
            }

            Commands::Batch { file } => {
                let reader = File::open(&file)
                    .with_context(|| format!("Cannot open batch file '{}'", file))?;
                run_batch_command(orchestrator, &store, BufReader::new(reader)).await?;
            }

            Commands::Stress {
                from,
                to,
                count,
                amount,
            } => {
                let amount = parse_amount(&amount).context("Invalid amount format")?;
                run_stress_command(orchestrator, &store, from, to, count, amount).await?;
            }

            Commands::Balances { format } => match format.as_str() {
                "table" => print_balances(&store)?,
                "csv" => {
                    export_balances_csv(stdout(), &store.list_accounts())?;
                }
                "json" => {
                    export_balances_json(stdout(), &store.list_accounts())?;
                }
                other => bail!("Unknown format '{}'. Use table, csv or json", other),
            },
        }

        Ok(())
    }
}

async fn run_transfer_command(
    orchestrator: &TransferOrchestrator,
    store: &InMemoryAccountStore,
    from: &str,
    to: &str,
    amount: Amount,
) -> Result<()> {
    let result = orchestrator.execute(from, to, amount).await;
    let response = TransferResponse::from_result(&result);

    println!("{}", serde_json::to_string_pretty(&response)?);
    if let Ok(receipt) = &result {
        println!(
            "Transferred {} {} -> {} ({})",
            format_amount(receipt.amount),
            receipt.from,
            receipt.to,
            receipt.id
        );
    }
    println!();
    print_balances(store)
}

async fn run_batch_command(
    orchestrator: Arc<TransferOrchestrator>,
    store: &InMemoryAccountStore,
    reader: impl std::io::Read,
) -> Result<()> {
    let batch = read_transfer_batch_csv(reader)?;
    let opening_total = store.total_balance()?;

    let responses = run_concurrently(orchestrator, batch.requests).await?;
    let summary = BatchSummary::tally(&responses);

    println!("Batch complete");
    println!("  Accepted: {}", summary.accepted);
    println!("  Rejected: {}", summary.rejected);
    println!("  Failed:   {}", summary.failed);
    println!("  Skipped:  {}", batch.errors.len());

    if !batch.errors.is_empty() {
        println!("\nErrors:");
        for error in batch.errors.iter().take(10) {
            println!(
                "  Line {}: {} {}",
                error.line,
                error.field.as_deref().unwrap_or(""),
                error.error
            );
        }
        if batch.errors.len() > 10 {
            println!("  ... and {} more errors", batch.errors.len() - 10);
        }
    }

    println!();
    print_balances(store)?;
    ensure_total_conserved(store, opening_total)
}

async fn run_stress_command(
    orchestrator: Arc<TransferOrchestrator>,
    store: &InMemoryAccountStore,
    from: String,
    to: String,
    count: usize,
    amount: Amount,
) -> Result<()> {
    let opening_total = store.total_balance()?;
    let forward = TransferRequest::new(from, to, amount);
    let backward = forward.reversed();

    let requests = (0..count)
        .map(|i| if i % 2 == 0 { forward.clone() } else { backward.clone() })
        .collect();

    let responses = run_concurrently(orchestrator, requests).await?;
    let summary = BatchSummary::tally(&responses);

    println!(
        "Stress run: {} transfers ({} accepted, {} rejected, {} failed)",
        responses.len(),
        summary.accepted,
        summary.rejected,
        summary.failed
    );
    print_balances(store)?;

    ensure_total_conserved(store, opening_total)?;
    ensure!(
        store
            .list_accounts()
            .iter()
            .all(|account| account.balance >= Decimal::ZERO),
        "An account balance went negative"
    );
    println!("Invariants hold: total conserved, no negative balance");
    Ok(())
}

fn ensure_total_conserved(store: &InMemoryAccountStore, opening_total: Amount) -> Result<()> {
    let closing_total = store.total_balance()?;
    ensure!(
        closing_total == opening_total,
        "Total balance changed from {} to {}",
        format_amount(opening_total),
        format_amount(closing_total)
    );
    Ok(())
}

/// Spawn one task per request and collect the classified responses.
async fn run_concurrently(
    orchestrator: Arc<TransferOrchestrator>,
    requests: Vec<TransferRequest>,
) -> Result<Vec<TransferResponse>> {
    let mut tasks = JoinSet::new();
    for request in requests {
        let orchestrator = Arc::clone(&orchestrator);
        tasks.spawn(async move {
            let result = orchestrator.execute_request(&request).await;
            TransferResponse::from_result(&result)
        });
    }

    let mut responses = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        responses.push(joined.context("Transfer task panicked")?);
    }
    Ok(responses)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    accepted: usize,
    rejected: usize,
    failed: usize,
}

impl BatchSummary {
    fn tally(responses: &[TransferResponse]) -> Self {
        responses.iter().fold(Self::default(), |mut summary, response| {
            if response.is_accepted() {
                summary.accepted += 1;
            } else if response.is_client_error() {
                summary.rejected += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
    }
}

fn print_balances(store: &InMemoryAccountStore) -> Result<()> {
    let accounts = store.list_accounts();
    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }
    let total = store.total_balance()?;

    println!("{:<20} {:>15}", "ACCOUNT", "BALANCE");
    println!("{}", "-".repeat(36));
    for account in &accounts {
        println!("{:<20} {:>15}", account.id, format_amount(account.balance));
    }
    println!("{}", "-".repeat(36));
    println!("{:<20} {:>15}", "TOTAL", format_amount(total));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cli_parses_transfer() {
        let cli = Cli::try_parse_from([
            "remit",
            "--accounts",
            "seed.json",
            "transfer",
            "100",
            "--from",
            "a",
            "--to",
            "b",
        ])
        .unwrap();

        assert_eq!(cli.accounts, "seed.json");
        assert!(matches!(
            cli.command,
            Commands::Transfer { ref amount, ref from, ref to }
                if amount == "100" && from == "a" && to == "b"
        ));
    }

    #[test]
    fn test_cli_accepts_negative_amount_for_engine_to_reject() {
        let cli =
            Cli::try_parse_from(["remit", "transfer", "-100", "--from", "a", "--to", "b"]).unwrap();
        assert!(matches!(cli.command, Commands::Transfer { ref amount, .. } if amount == "-100"));
    }

    #[test]
    fn test_balances_table_reports_unrepresentable_total() {
        let store = InMemoryAccountStore::new();
        store.create_account("whale", Decimal::MAX).unwrap();
        store.create_account("minnow", Decimal::ONE).unwrap();

        let err = print_balances(&store).unwrap_err();
        assert!(err.to_string().contains("representable range"));
    }

    #[test]
    fn test_conservation_check_spots_a_changed_total() {
        let store = InMemoryAccountStore::new();
        store.create_account("a", Decimal::TEN).unwrap();

        assert!(ensure_total_conserved(&store, Decimal::TEN).is_ok());
        let err = ensure_total_conserved(&store, Decimal::ONE).unwrap_err();
        assert!(err.to_string().contains("Total balance changed from 1.00 to 10.00"));
    }

    #[test]
    fn test_batch_summary_tally() {
        let responses = vec![
            TransferResponse::Accepted {
                transfer_id: Uuid::new_v4(),
            },
            TransferResponse::Rejected {
                reason: "nope".into(),
            },
            TransferResponse::Failed {
                correlation_id: Uuid::new_v4(),
            },
            TransferResponse::Accepted {
                transfer_id: Uuid::new_v4(),
            },
        ];

        assert_eq!(
            BatchSummary::tally(&responses),
            BatchSummary {
                accepted: 2,
                rejected: 1,
                failed: 1,
            }
        );
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::domain::{Account, AccountId, Amount, format_amount};

/// Receiver of post-transfer notices. Delivery is best effort: an `Err`
/// is logged by the orchestrator and never undoes a committed transfer.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, account: &Account, description: &str, amount: Amount) -> Result<()>;
}

/// Writes each notification as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, account: &Account, description: &str, amount: Amount) -> Result<()> {
        info!(
            account = account.id(),
            amount = %format_amount(amount),
            balance = %format_amount(account.balance()),
            "{}",
            description
        );
        Ok(())
    }
}

/// A notification as delivered to [`RecordingNotifier`].
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub account: AccountId,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Amount,
    pub sent_at: DateTime<Utc>,
}

/// Keeps every notification in memory, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, account: &Account, description: &str, amount: Amount) -> Result<()> {
        self.sent.lock().push(Notification {
            account: account.id().to_string(),
            description: description.to_string(),
            amount,
            sent_at: Utc::now(),
        });
        Ok(())
    }
}

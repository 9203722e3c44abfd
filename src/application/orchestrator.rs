use std::sync::Arc;

use tracing::{error, warn};

use crate::config::EngineConfig;
use crate::domain::{Account, Amount, TransferReceipt, TransferRequest};
use crate::storage::AccountStore;

use super::{Notifier, OrchestrationError, TransferEngine};

/// Runs a transfer, then tells both participants about it.
///
/// This is the primary entry point for request handlers. It adds no locking
/// of its own: transfers over disjoint accounts run fully in parallel.
pub struct TransferOrchestrator {
    store: Arc<dyn AccountStore>,
    engine: TransferEngine,
    notifier: Arc<dyn Notifier>,
}

impl TransferOrchestrator {
    pub fn new(store: Arc<dyn AccountStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_config(store, notifier, EngineConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn AccountStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        let engine = TransferEngine::with_config(Arc::clone(&store), config);
        Self::with_engine(store, engine, notifier)
    }

    /// Orchestrator around an engine built by the caller, e.g. one with its
    /// own lock table. `engine` must work on `store`.
    pub fn with_engine(
        store: Arc<dyn AccountStore>,
        engine: TransferEngine,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            engine,
            notifier,
        }
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    /// Transfer `amount` from `from` to `to` and notify both sides.
    pub async fn execute(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<TransferReceipt, OrchestrationError> {
        self.execute_request(&TransferRequest::new(from, to, amount))
            .await
    }

    pub async fn execute_request(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, OrchestrationError> {
        let from_account = self.lookup(&request.from).await?;
        let to_account = self.lookup(&request.to).await?;

        let receipt = self.engine.execute(request).await.map_err(|err| {
            let err = OrchestrationError::from(err);
            if err.is_failure() {
                error!(from = %request.from, to = %request.to, error = %err, "transfer failed");
            }
            err
        })?;

        // Committed from here on; notification problems are only logged.
        self.notify(
            &from_account,
            &format!("Transfer to {}", request.to),
            request.amount,
        )
        .await;
        self.notify(
            &to_account,
            &format!("Transfer from {}", request.from),
            request.amount,
        )
        .await;

        Ok(receipt)
    }

    async fn lookup(&self, id: &str) -> Result<Arc<Account>, OrchestrationError> {
        match self.store.get_account(id).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(OrchestrationError::InvalidAccount(format!(
                "account not found: {}",
                id
            ))),
            Err(err) => {
                error!(account = id, error = %err, "account lookup failed");
                Err(OrchestrationError::failure(
                    format!("account lookup failed for {}", id),
                    err,
                ))
            }
        }
    }

    async fn notify(&self, account: &Account, description: &str, amount: Amount) {
        if let Err(err) = self.notifier.notify(account, description, amount).await {
            warn!(
                account = account.id(),
                description,
                error = %err,
                "notification failed; transfer stays committed"
            );
        }
    }
}

// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use remit::application::{LockTable, Notifier, RecordingNotifier, TransferOrchestrator};
use remit::domain::{Account, Amount};
use remit::storage::{AccountStore, InMemoryAccountStore};
use remit::{EngineConfig, TransferEngine};

/// Helper to create a store holding the given accounts
pub fn seeded_store(accounts: &[(&str, Amount)]) -> Arc<InMemoryAccountStore> {
    let store = Arc::new(InMemoryAccountStore::new());
    for (id, balance) in accounts {
        store
            .create_account(*id, *balance)
            .expect("fixture account should be valid");
    }
    store
}

/// Helper to create an engine over the given accounts, with a lock table
/// of its own so handle counts and held handles stay local to the test
pub fn test_engine(accounts: &[(&str, Amount)]) -> (TransferEngine, Arc<InMemoryAccountStore>) {
    let store = seeded_store(accounts);
    let engine = isolated_engine(store.clone(), EngineConfig::default());
    (engine, store)
}

pub fn isolated_engine(store: Arc<dyn AccountStore>, config: EngineConfig) -> TransferEngine {
    TransferEngine::with_locks(store, config, Arc::new(LockTable::new()))
}

/// Helper to create an orchestrator that records its notifications
pub fn test_orchestrator(
    accounts: &[(&str, Amount)],
) -> (
    TransferOrchestrator,
    Arc<InMemoryAccountStore>,
    Arc<RecordingNotifier>,
) {
    let store = seeded_store(accounts);
    let notifier = Arc::new(RecordingNotifier::new());
    let orchestrator = TransferOrchestrator::new(store.clone(), notifier.clone());
    (orchestrator, store, notifier)
}

pub fn balance(store: &InMemoryAccountStore, id: &str) -> Amount {
    store.account(id).expect("account should exist").balance()
}

/// Store that fails every lookup of one account id and delegates the rest
pub struct FaultyStore {
    pub inner: Arc<InMemoryAccountStore>,
    pub failing_id: String,
    pub lookups: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryAccountStore>, failing_id: &str) -> Self {
        Self {
            inner,
            failing_id: failing_id.to_string(),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AccountStore for FaultyStore {
    async fn get_account(&self, id: &str) -> Result<Option<Arc<Account>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if id == self.failing_id {
            bail!("storage backend unavailable");
        }
        self.inner.get_account(id).await
    }
}

/// Notifier that always fails, counting attempts
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _account: &Account, _description: &str, _amount: Amount) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        bail!("mail server down")
    }
}

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use crate::domain::{Account, AccountError, AccountId, AccountSnapshot, Amount, checked_sum};

/// Lookup side of account storage, as seen by the transfer engine.
///
/// Handles returned here are shared: balance changes made through one handle
/// are visible to every later lookup of the same id.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns `Ok(None)` when the id is unknown. `Err` is reserved for
    /// store malfunctions.
    async fn get_account(&self, id: &str) -> Result<Option<Arc<Account>>>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    #[error(transparent)]
    InvalidAccount(#[from] AccountError),

    #[error("Total balance exceeds the representable range")]
    TotalOverflow,
}

/// Account store backed by a concurrent map. Accounts live for the
/// lifetime of the store.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from snapshots (seed files, fixtures).
    pub fn from_snapshots(
        snapshots: impl IntoIterator<Item = AccountSnapshot>,
    ) -> Result<Self, StoreError> {
        let store = Self::new();
        for snapshot in snapshots {
            store.create_account(snapshot.id, snapshot.balance)?;
        }
        Ok(store)
    }

    /// Create a new account. Ids are unique.
    pub fn create_account(
        &self,
        id: impl Into<AccountId>,
        opening_balance: Amount,
    ) -> Result<Arc<Account>, StoreError> {
        let account = Arc::new(Account::new(id, opening_balance)?);

        match self.accounts.entry(account.id().to_string()) {
            Entry::Occupied(existing) => Err(StoreError::AccountAlreadyExists(
                existing.key().clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&account));
                Ok(account)
            }
        }
    }

    pub fn account(&self, id: &str) -> Option<Arc<Account>> {
        self.accounts.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshots of every account, ordered by id.
    pub fn list_accounts(&self) -> Vec<AccountSnapshot> {
        let mut snapshots: Vec<AccountSnapshot> = self
            .accounts
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }

    /// Sum of all balances. Constant across any sequence of transfers.
    ///
    /// Each balance fits in an [`Amount`] but their sum may not; that case is
    /// `TotalOverflow`.
    pub fn total_balance(&self) -> Result<Amount, StoreError> {
        checked_sum(self.accounts.iter().map(|entry| entry.value().balance()))
            .ok_or(StoreError::TotalOverflow)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_account(&self, id: &str) -> Result<Option<Arc<Account>>> {
        Ok(self.account(id))
    }
}

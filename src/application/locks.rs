use std::cmp::Ordering;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::domain::AccountId;

use super::TransferError;

static GLOBAL_LOCKS: LazyLock<Arc<LockTable>> = LazyLock::new(|| Arc::new(LockTable::new()));

/// Registry of per-account lock handles.
///
/// Handles are created on first use and never removed, so the table grows
/// with the number of distinct account ids ever referenced. Engines share
/// [`LockTable::global`] unless handed a table of their own.
#[derive(Debug, Default)]
pub struct LockTable {
    handles: DashMap<AccountId, Arc<Mutex<()>>>,
}

/// Locks held for the duration of one transfer. Dropping it releases both.
#[derive(Debug)]
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table used by every engine built without an
    /// explicit one.
    pub fn global() -> Arc<LockTable> {
        Arc::clone(&GLOBAL_LOCKS)
    }

    /// Get or create the handle for `id`. Concurrent first use of the same id
    /// yields the same handle.
    pub fn handle(&self, id: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.handles.get(id) {
            return Arc::clone(existing.value());
        }
        let entry = self
            .handles
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }

    /// Lock both accounts, smaller id first regardless of transfer direction.
    /// A single lock is taken when both ids are the same.
    pub async fn acquire_pair(
        &self,
        a: &str,
        b: &str,
        timeout: Option<Duration>,
    ) -> Result<PairGuard, TransferError> {
        let (first, second) = match a.cmp(b) {
            Ordering::Equal => {
                let only = self.lock(a, timeout).await?;
                return Ok(PairGuard {
                    _first: only,
                    _second: None,
                });
            }
            Ordering::Less => (a, b),
            Ordering::Greater => (b, a),
        };

        let first_guard = self.lock(first, timeout).await?;
        let second_guard = self.lock(second, timeout).await?;
        trace!(first, second, "acquired account pair");

        Ok(PairGuard {
            _first: first_guard,
            _second: Some(second_guard),
        })
    }

    async fn lock(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<OwnedMutexGuard<()>, TransferError> {
        let handle = self.handle(id);
        match timeout {
            None => Ok(handle.lock_owned().await),
            Some(limit) => tokio::time::timeout(limit, handle.lock_owned())
                .await
                .map_err(|_| TransferError::LockTimeout {
                    account: id.to_string(),
                    waited: limit,
                }),
        }
    }

    /// Number of handles created so far.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

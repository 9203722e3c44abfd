use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::{Account, Amount, TransferReceipt, TransferRequest};
use crate::storage::AccountStore;

use super::{LockTable, TransferError};

/// Moves money between two accounts of an [`AccountStore`].
///
/// Every transfer holds the lock handles of both accounts across the
/// funds check and the two balance updates. Handles are always taken in
/// id order, so transfers running in opposite directions over the same
/// pair cannot deadlock. Engines built with [`TransferEngine::new`] or
/// [`TransferEngine::with_config`] share the process-wide [`LockTable`], so
/// any number of engines over one store serialize on the same handles.
pub struct TransferEngine {
    store: Arc<dyn AccountStore>,
    locks: Arc<LockTable>,
    config: EngineConfig,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn AccountStore>, config: EngineConfig) -> Self {
        Self::with_locks(store, config, LockTable::global())
    }

    /// Engine over its own lock table. Only engines sharing `locks` exclude
    /// each other at the handle level.
    pub fn with_locks(
        store: Arc<dyn AccountStore>,
        config: EngineConfig,
        locks: Arc<LockTable>,
    ) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    pub fn locks(&self) -> &LockTable {
        &self.locks
    }

    /// Transfer `amount` from `from` to `to`.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<TransferReceipt, TransferError> {
        self.execute(&TransferRequest::new(from, to, amount)).await
    }

    /// Execute a transfer request.
    ///
    /// Fails with `InvalidAccount` for a non-positive amount or an unknown
    /// account, and with `InsufficientFunds` when the source balance is below
    /// the amount at the moment of the check. Neither failure mutates state.
    pub async fn execute(&self, request: &TransferRequest) -> Result<TransferReceipt, TransferError> {
        if !request.has_positive_amount() {
            return Err(TransferError::InvalidAccount(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }

        let from_account = self.resolve(&request.from).await?;
        let to_account = self.resolve(&request.to).await?;

        let _guard = self
            .locks
            .acquire_pair(&request.from, &request.to, self.config.lock_timeout)
            .await?;

        let (from_balance, to_balance) = if request.is_self_transfer() {
            let balance = from_account.balance();
            ensure_funds(&from_account, balance, request.amount)?;
            (balance, balance)
        } else {
            apply(&from_account, &to_account, request.amount)?
        };

        info!(
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            "transfer committed"
        );

        Ok(TransferReceipt::new(request, from_balance, to_balance))
    }

    async fn resolve(&self, id: &str) -> Result<Arc<Account>, TransferError> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| TransferError::InvalidAccount(format!("account not found: {}", id)))
    }
}

fn ensure_funds(account: &Account, balance: Amount, required: Amount) -> Result<(), TransferError> {
    if balance < required {
        debug!(account = account.id(), %balance, %required, "insufficient funds");
        return Err(TransferError::InsufficientFunds {
            account: account.id().to_string(),
            balance,
            required,
        });
    }
    Ok(())
}

/// Debit and credit two distinct accounts. Caller holds both lock handles.
/// The balance cells are taken in id order, like the handles, and both new
/// balances are computed before either is written.
fn apply(from: &Account, to: &Account, amount: Amount) -> Result<(Amount, Amount), TransferError> {
    let (mut debit, mut credit) = if from.id() < to.id() {
        let debit = from.balance.lock();
        (debit, to.balance.lock())
    } else {
        let credit = to.balance.lock();
        (from.balance.lock(), credit)
    };
    ensure_funds(from, *debit, amount)?;

    let new_debit = *debit - amount;
    let new_credit = credit
        .checked_add(amount)
        .ok_or_else(|| TransferError::BalanceOverflow(to.id().to_string()))?;
    debug_assert!(new_debit >= Decimal::ZERO);

    *debit = new_debit;
    *credit = new_credit;
    Ok((new_debit, new_credit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryAccountStore;
    use rust_decimal_macros::dec;

    fn engine_with(accounts: &[(&str, Amount)]) -> (TransferEngine, Arc<InMemoryAccountStore>) {
        let store = Arc::new(InMemoryAccountStore::new());
        for (id, balance) in accounts {
            store.create_account(*id, *balance).unwrap();
        }
        let engine = TransferEngine::with_locks(
            store.clone(),
            EngineConfig::default(),
            Arc::new(LockTable::new()),
        );
        (engine, store)
    }

    fn balance(store: &InMemoryAccountStore, id: &str) -> Amount {
        store.account(id).unwrap().balance()
    }

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let (engine, store) = engine_with(&[("a", dec!(500)), ("b", dec!(2000))]);

        let receipt = engine.transfer("a", "b", dec!(100)).await.unwrap();

        assert_eq!(balance(&store, "a"), dec!(400));
        assert_eq!(balance(&store, "b"), dec!(2100));
        assert_eq!(receipt.from_balance, dec!(400));
        assert_eq!(receipt.to_balance, dec!(2100));
    }

    #[tokio::test]
    async fn test_exact_balance_can_be_drained() {
        let (engine, store) = engine_with(&[("a", dec!(100)), ("b", dec!(0))]);

        engine.transfer("a", "b", dec!(100)).await.unwrap();

        assert_eq!(balance(&store, "a"), dec!(0));
        assert_eq!(balance(&store, "b"), dec!(100));
    }

    #[tokio::test]
    async fn test_zero_amount_is_invalid() {
        let (engine, store) = engine_with(&[("a", dec!(500)), ("b", dec!(2000))]);

        let err = engine.transfer("a", "b", dec!(0)).await.unwrap_err();

        assert!(matches!(err, TransferError::InvalidAccount(_)));
        assert_eq!(balance(&store, "a"), dec!(500));
        // Rejected before any lock handle is created
        assert!(engine.locks().is_empty());
    }

    #[tokio::test]
    async fn test_overflow_leaves_both_balances() {
        let (engine, store) = engine_with(&[("a", dec!(10)), ("b", Decimal::MAX)]);

        let err = engine.transfer("a", "b", dec!(1)).await.unwrap_err();

        assert!(matches!(err, TransferError::BalanceOverflow(ref id) if id == "b"));
        assert_eq!(balance(&store, "a"), dec!(10));
        assert_eq!(balance(&store, "b"), Decimal::MAX);
    }

    #[tokio::test]
    async fn test_self_transfer_is_a_checked_no_op() {
        let (engine, store) = engine_with(&[("a", dec!(50))]);

        let receipt = engine.transfer("a", "a", dec!(20)).await.unwrap();
        assert_eq!(receipt.from_balance, dec!(50));
        assert_eq!(balance(&store, "a"), dec!(50));

        let err = engine.transfer("a", "a", dec!(80)).await.unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds { .. }));
        assert_eq!(engine.locks().len(), 1);
    }

    #[tokio::test]
    async fn test_default_engines_share_lock_handles() {
        let store = Arc::new(InMemoryAccountStore::new());
        let first = TransferEngine::new(store.clone());
        let second = TransferEngine::with_config(store, EngineConfig::default());

        assert!(Arc::ptr_eq(
            &first.locks().handle("engine-shared"),
            &second.locks().handle("engine-shared")
        ));
    }

    #[tokio::test]
    async fn test_transfer_in_either_direction_across_id_order() {
        let (engine, store) = engine_with(&[("a", dec!(100)), ("z", dec!(100))]);

        let forward = engine.transfer("a", "z", dec!(30)).await.unwrap();
        assert_eq!((forward.from_balance, forward.to_balance), (dec!(70), dec!(130)));

        let backward = engine.transfer("z", "a", dec!(130)).await.unwrap();
        assert_eq!((backward.from_balance, backward.to_balance), (dec!(0), dec!(200)));

        let err = engine.transfer("z", "a", dec!(1)).await.unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds { ref account, .. } if account == "z"));
        assert_eq!(balance(&store, "a"), dec!(200));
        assert_eq!(balance(&store, "z"), dec!(0));
    }
}

use std::time::Duration;

use thiserror::Error;

use crate::domain::{AccountId, Amount};

/// Outcome of a failed engine transfer.
///
/// `InvalidAccount` and `InsufficientFunds` are expected business outcomes.
/// The remaining variants are faults and are raised before any balance moves.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Invalid account or amount: {0}")]
    InvalidAccount(String),

    #[error("Insufficient funds in account {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: AccountId,
        balance: Amount,
        required: Amount,
    },

    #[error("Timed out after {waited:?} waiting for the lock on account {account}")]
    LockTimeout { account: AccountId, waited: Duration },

    #[error("Crediting account {0} would overflow its balance")]
    BalanceOverflow(AccountId),

    #[error("Account store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl TransferError {
    /// True for outcomes the caller caused, as opposed to system faults.
    pub fn is_business_error(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidAccount(_) | TransferError::InsufficientFunds { .. }
        )
    }
}

/// Outcome of a failed orchestrated transfer.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Invalid account or amount: {0}")]
    InvalidAccount(String),

    #[error("Insufficient funds in account {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: AccountId,
        balance: Amount,
        required: Amount,
    },

    #[error("Transfer orchestration failed: {message}")]
    Failure {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl OrchestrationError {
    pub fn failure(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        OrchestrationError::Failure {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, OrchestrationError::Failure { .. })
    }
}

impl From<TransferError> for OrchestrationError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidAccount(reason) => OrchestrationError::InvalidAccount(reason),
            TransferError::InsufficientFunds {
                account,
                balance,
                required,
            } => OrchestrationError::InsufficientFunds {
                account,
                balance,
                required,
            },
            fault => OrchestrationError::failure("transfer engine fault", fault),
        }
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Amount};

pub type TransferId = Uuid;

/// A request to move money from one account to another.
/// Requests are ephemeral; nothing about them is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Source account (balance decreases)
    pub from: AccountId,
    /// Destination account (balance increases)
    pub to: AccountId,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Amount,
}

impl TransferRequest {
    pub fn new(from: impl Into<AccountId>, to: impl Into<AccountId>, amount: Amount) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn has_positive_amount(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }

    /// The same amount flowing the other way.
    pub fn reversed(&self) -> Self {
        Self::new(self.to.clone(), self.from.clone(), self.amount)
    }
}

/// Proof of a committed transfer, with both balances as they stood
/// right after the mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: TransferId,
    pub from: AccountId,
    pub to: AccountId,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Amount,
    #[serde(with = "rust_decimal::serde::str")]
    pub from_balance: Amount,
    #[serde(with = "rust_decimal::serde::str")]
    pub to_balance: Amount,
    pub executed_at: DateTime<Utc>,
}

impl TransferReceipt {
    pub(crate) fn new(
        request: &TransferRequest,
        from_balance: Amount,
        to_balance: Amount,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: request.from.clone(),
            to: request.to.clone(),
            amount: request.amount,
            from_balance,
            to_balance,
            executed_at: Utc::now(),
        }
    }
}

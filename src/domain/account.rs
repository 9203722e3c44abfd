use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Amount;

pub type AccountId = String;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account id must not be empty")]
    EmptyId,

    #[error("Opening balance of account {id} is negative: {balance}")]
    NegativeBalance { id: AccountId, balance: Amount },
}

/// A balance-holding account.
///
/// The balance cell is only written by the transfer engine, which takes the
/// cells of a pair in id order. Readers lock it briefly for a copy.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    pub(crate) balance: Mutex<Amount>,
}

/// Point-in-time copy of an account, used for display and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Amount,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, opening_balance: Amount) -> Result<Self, AccountError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AccountError::EmptyId);
        }
        if opening_balance < Decimal::ZERO {
            return Err(AccountError::NegativeBalance {
                id,
                balance: opening_balance,
            });
        }
        Ok(Self {
            id,
            balance: Mutex::new(opening_balance),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> Amount {
        *self.balance.lock()
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id.clone(),
            balance: self.balance(),
        }
    }
}

impl TryFrom<AccountSnapshot> for Account {
    type Error = AccountError;

    fn try_from(snapshot: AccountSnapshot) -> Result<Self, Self::Error> {
        Account::new(snapshot.id, snapshot.balance)
    }
}

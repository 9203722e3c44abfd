use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::domain::{TransferId, TransferReceipt, format_amount};

use super::OrchestrationError;

/// What a request handler reports back for one transfer.
///
/// Faults are reduced to a correlation id; their details only reach the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferResponse {
    Accepted { transfer_id: TransferId },
    Rejected { reason: String },
    Failed { correlation_id: Uuid },
}

impl TransferResponse {
    pub fn from_result(result: &Result<TransferReceipt, OrchestrationError>) -> Self {
        match result {
            Ok(receipt) => TransferResponse::Accepted {
                transfer_id: receipt.id,
            },
            Err(OrchestrationError::InvalidAccount(reason)) => TransferResponse::Rejected {
                reason: format!("invalid request: {}", reason),
            },
            Err(OrchestrationError::InsufficientFunds {
                account,
                balance,
                required,
            }) => TransferResponse::Rejected {
                reason: format!(
                    "insufficient funds in {}: available {}, requested {}",
                    account,
                    format_amount(*balance),
                    format_amount(*required)
                ),
            },
            Err(err @ OrchestrationError::Failure { .. }) => {
                let correlation_id = Uuid::new_v4();
                error!(%correlation_id, error = ?err, "transfer failed with an internal error");
                TransferResponse::Failed { correlation_id }
            }
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TransferResponse::Accepted { .. })
    }

    /// The caller should fix the request; maps to a 4xx-style answer.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TransferResponse::Rejected { .. })
    }

    /// Something broke on our side; maps to a 5xx-style answer.
    pub fn is_server_error(&self) -> bool {
        matches!(self, TransferResponse::Failed { .. })
    }
}

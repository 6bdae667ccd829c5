//! Error types for transfer execution.
//!
//! Messages name accounts by number only; internal ids stay in the logs.

use crate::{AccountNumber, AccountSide, MinorUnits};
use thiserror::Error;

/// Errors reported by the transfer engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Amount is zero, negative, or not representable in minor units.
    #[error("transfer amount must be positive")]
    InvalidAmount,

    /// One of the accounts could not be resolved.
    #[error("{side} account {number} not found")]
    AccountNotFound {
        side: AccountSide,
        number: AccountNumber,
    },

    /// Source and destination are the same account.
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// Source balance does not cover the amount.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientFunds {
        required: MinorUnits,
        available: MinorUnits,
    },

    /// Debit of the source failed; the transaction was rolled back.
    #[error("failed to debit source account {number}: {reason}")]
    DebitFailed {
        number: AccountNumber,
        reason: String,
    },

    /// Credit of the destination failed; the transaction was rolled back.
    #[error("failed to credit destination account {number}: {reason}")]
    CreditFailed {
        number: AccountNumber,
        reason: String,
    },

    /// Commit was refused by the store.
    #[error("failed to commit transfer: {0}")]
    CommitFailed(String),

    /// Connection or transport failure from any store call.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl TransferError {
    /// Check if this error was raised before any transaction was opened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidAmount
                | TransferError::AccountNotFound { .. }
                | TransferError::SelfTransfer
                | TransferError::InsufficientFunds { .. }
        )
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            TransferError::SelfTransfer => "SELF_TRANSFER",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::DebitFailed { .. } => "DEBIT_FAILED",
            TransferError::CreditFailed { .. } => "CREDIT_FAILED",
            TransferError::CommitFailed(_) => "COMMIT_FAILED",
            TransferError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;

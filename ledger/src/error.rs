//! Ledger store error types.

use minibank_common::{AccountId, AccountNumber, AmountError};
use thiserror::Error;

/// SQLSTATE for `check_violation`.
const PG_CHECK_VIOLATION: &str = "23514";

/// SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur in a ledger store.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No account row with this id.
    #[error("account id {0} not found")]
    AccountNotFound(AccountId),

    /// No account row with this number.
    #[error("account with number [{0}] not found")]
    AccountNumberNotFound(AccountNumber),

    /// Account number is already taken.
    #[error("account number {0} already exists")]
    DuplicateAccountNumber(AccountNumber),

    /// Mutation would leave a negative balance.
    #[error("balance of account id {account_id} would become negative")]
    NegativeBalance { account_id: AccountId },

    /// New account requested with a balance below zero.
    #[error("opening balance of account {0} cannot be negative")]
    NegativeOpeningBalance(AccountNumber),

    /// Operation on a committed or rolled back transaction.
    #[error("transaction already closed")]
    TransactionClosed,

    /// Amount could not be converted to minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Failure planted by a test store.
    #[error("injected fault: {0}")]
    InjectedFault(String),

    /// Driver or connection failure.
    #[error("database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Check if this error means the row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotFound(_) | LedgerError::AccountNumberNotFound(_)
        )
    }

    /// Message safe to hand to API callers: never contains internal ids or
    /// raw driver output.
    pub fn public_message(&self) -> String {
        match self {
            LedgerError::AccountNotFound(_) | LedgerError::AccountNumberNotFound(_) => {
                "account no longer exists".to_string()
            }
            LedgerError::DuplicateAccountNumber(number) => {
                format!("account number {} already exists", number)
            }
            LedgerError::NegativeBalance { .. } => "balance would become negative".to_string(),
            LedgerError::NegativeOpeningBalance(_) => {
                "opening balance cannot be negative".to_string()
            }
            LedgerError::TransactionClosed => "transaction already closed".to_string(),
            LedgerError::InvalidAmount(e) => e.to_string(),
            LedgerError::InjectedFault(_) => "injected fault".to_string(),
            LedgerError::Database(_) => "database error".to_string(),
        }
    }

    /// Map a driver error raised by a balance update on `account_id`.
    pub(crate) fn from_update(err: sqlx::Error, account_id: AccountId) -> Self {
        if sqlstate(&err).as_deref() == Some(PG_CHECK_VIOLATION) {
            return LedgerError::NegativeBalance { account_id };
        }
        LedgerError::from(err)
    }

    /// Map a driver error raised by an account insert.
    pub(crate) fn from_insert(err: sqlx::Error, number: AccountNumber) -> Self {
        match sqlstate(&err).as_deref() {
            Some(PG_UNIQUE_VIOLATION) => LedgerError::DuplicateAccountNumber(number),
            Some(PG_CHECK_VIOLATION) => LedgerError::NegativeOpeningBalance(number),
            _ => LedgerError::from(err),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Database(err.to_string())
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Result type for ledger store operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

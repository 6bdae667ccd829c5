//! Transfer request and receipt types.

use crate::{AccountNumber, MinorUnits, TransferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a transfer an account sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSide {
    /// The account being debited.
    Source,
    /// The account being credited.
    Destination,
}

impl fmt::Display for AccountSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountSide::Source => write!(f, "source"),
            AccountSide::Destination => write!(f, "destination"),
        }
    }
}

/// A request to move money between two accounts.
///
/// `amount` is in major units, exactly as it arrives on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Account to debit.
    pub from_account: AccountNumber,
    /// Account to credit.
    pub to_account: AccountNumber,
    /// Amount in major units.
    pub amount: f64,
}

impl TransferRequest {
    /// Create a new transfer request.
    pub fn new(
        from_account: impl Into<AccountNumber>,
        to_account: impl Into<AccountNumber>,
        amount: f64,
    ) -> Self {
        Self {
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
        }
    }
}

/// Outcome status carried by a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Both legs applied and committed.
    Success,
}

/// Record returned to the caller once a transfer has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Always `success`; receipts are only built after commit.
    pub status: TransferStatus,
    /// Transfer execution id.
    pub transfer_id: TransferId,
    /// Debited account.
    pub from_account: AccountNumber,
    /// Credited account.
    pub to_account: AccountNumber,
    /// Amount as requested, in major units.
    pub amount: f64,
    /// Amount actually moved, in minor units.
    pub amount_minor: MinorUnits,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
}

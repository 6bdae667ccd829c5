//! Identifier types for minibank entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Internal, store-assigned account identifier.
///
/// Never leaves the process in error messages; callers address accounts by
/// [`AccountNumber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i32);

impl AccountId {
    /// Create from a raw store identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for AccountId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// External account number, the routable handle used by transfer requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(i64);

impl AccountNumber {
    /// Upper bound (exclusive) for generated account numbers.
    pub const GENERATED_MAX: i64 = 1_000_000;

    /// Create a new account number.
    pub fn new(number: i64) -> Self {
        Self(number)
    }

    /// Get the raw number.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccountNumber {
    fn from(number: i64) -> Self {
        Self(number)
    }
}

/// Identifier of a single transfer execution.
/// Uses UUID v7 so ids sort by creation time in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Create a new transfer ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

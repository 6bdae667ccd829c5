//! Account records held by the ledger.

use chrono::{DateTime, Utc};
use minibank_common::{AccountId, AccountNumber, MinorUnits};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned identifier.
    pub id: AccountId,
    /// Holder first name.
    pub first_name: String,
    /// Holder last name.
    pub last_name: String,
    /// Unique external account number.
    #[serde(rename = "account_number")]
    pub number: AccountNumber,
    /// Balance in minor units. Never negative once committed.
    pub balance: MinorUnits,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Check if the balance covers `amount`.
    pub fn has_sufficient_funds(&self, amount: MinorUnits) -> bool {
        self.balance >= amount
    }
}

/// Fields for inserting a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub number: AccountNumber,
    pub balance: MinorUnits,
}

impl NewAccount {
    /// New zero-balance account with a random account number.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let number = rand::thread_rng().gen_range(0..AccountNumber::GENERATED_MAX);
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            number: AccountNumber::new(number),
            balance: MinorUnits::ZERO,
        }
    }

    /// Use a fixed account number.
    pub fn with_number(mut self, number: impl Into<AccountNumber>) -> Self {
        self.number = number.into();
        self
    }

    /// Seed the opening balance.
    pub fn with_balance(mut self, balance: MinorUnits) -> Self {
        self.balance = balance;
        self
    }
}

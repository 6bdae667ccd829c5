//! Ledger store contract.
//!
//! The transfer engine only talks to storage through these two traits, so a
//! store can be swapped (PostgreSQL in production, in-memory in tests and the
//! simulator) without touching the engine.

use async_trait::async_trait;
use minibank_common::{AccountId, AccountNumber, MinorUnits};

use crate::account::{Account, NewAccount};
use crate::error::LedgerResult;

/// An open unit of work against a ledger store.
///
/// Owned by exactly one caller. `rollback` after a terminal call is a no-op,
/// `commit` after `commit` is a no-op, and `apply_delta` or `commit` after
/// `rollback` return [`LedgerError::TransactionClosed`](crate::LedgerError).
/// Dropping an open handle rolls it back.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Execute `balance = balance + delta` for one account inside this
    /// transaction. Returns the number of rows affected.
    async fn apply_delta(&mut self, account_id: AccountId, delta: MinorUnits) -> LedgerResult<u64>;

    /// Make every applied delta durable and visible.
    async fn commit(&mut self) -> LedgerResult<()>;

    /// Discard every applied delta.
    async fn rollback(&mut self) -> LedgerResult<()>;

    /// Check if neither commit nor rollback has completed.
    fn is_open(&self) -> bool;
}

/// Durable keeper of account records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Transaction handle type.
    type Tx: LedgerTransaction + 'static;

    /// Exact match on the unique account number.
    async fn get_account_by_number(&self, number: AccountNumber) -> LedgerResult<Account>;

    /// Lookup by internal id.
    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account>;

    /// Open a unit of work.
    async fn begin_transaction(&self) -> LedgerResult<Self::Tx>;

    /// Apply `balance += delta` as a single row-level update.
    ///
    /// Inside `tx` when given, otherwise auto-committed. A missing row is
    /// reported as [`LedgerError::AccountNotFound`](crate::LedgerError).
    async fn update_balance(
        &self,
        account_id: AccountId,
        delta: MinorUnits,
        tx: Option<&mut Self::Tx>,
    ) -> LedgerResult<()>;

    /// Same as [`update_balance`](Self::update_balance) with the delta given in
    /// major units; converted by multiplying by 100 and truncating toward zero.
    async fn update_balance_major(
        &self,
        account_id: AccountId,
        amount: f64,
        tx: Option<&mut Self::Tx>,
    ) -> LedgerResult<()> {
        let delta = MinorUnits::from_major(amount)?;
        self.update_balance(account_id, delta, tx).await
    }

    /// Insert a new account.
    async fn create_account(&self, account: NewAccount) -> LedgerResult<Account>;

    /// Delete an account. Returns false when no row matched.
    async fn delete_account(&self, id: AccountId) -> LedgerResult<bool>;
}

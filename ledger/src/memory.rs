//! In-memory ledger store.
//!
//! Transactions stage their deltas privately and apply them all at once at
//! commit, under the same lock that auto-committed updates take. That lock
//! plays the part of PostgreSQL's row locks: concurrent transfers touching
//! the same account serialize at commit and can never lose an update.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use minibank_common::{AccountId, AccountNumber, MinorUnits};
use parking_lot::Mutex;
use tracing::debug;

use crate::account::{Account, NewAccount};
use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, LedgerTransaction};

/// Failure to plant in a [`MemoryLedgerStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `begin_transaction` fails.
    Begin,
    /// Lookups of this account number fail with a non-not-found error.
    Lookup(AccountNumber),
    /// Balance updates on this account fail.
    UpdateBalance(AccountId),
    /// `commit` fails and leaves the transaction open.
    Commit,
    /// `rollback` reports failure (staged deltas are still discarded).
    Rollback,
}

#[derive(Default)]
struct Inner {
    accounts: Mutex<BTreeMap<AccountId, Account>>,
    next_id: AtomicI32,
    faults: Mutex<Vec<Fault>>,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl Inner {
    fn check_fault(&self, fault: Fault) -> LedgerResult<()> {
        if self.faults.lock().contains(&fault) {
            return Err(LedgerError::InjectedFault(format!("{:?}", fault)));
        }
        Ok(())
    }

    /// Apply a batch of deltas atomically. Either every delta lands or none.
    fn apply_all(&self, deltas: &[(AccountId, MinorUnits)]) -> LedgerResult<()> {
        let mut accounts = self.accounts.lock();

        let mut projected: BTreeMap<AccountId, MinorUnits> = BTreeMap::new();
        for (id, delta) in deltas {
            let current = match projected.get(id) {
                Some(balance) => *balance,
                None => accounts
                    .get(id)
                    .map(|a| a.balance)
                    .ok_or(LedgerError::AccountNotFound(*id))?,
            };
            let next = current
                .checked_add(*delta)
                .ok_or(LedgerError::NegativeBalance { account_id: *id })?;
            if next.is_negative() {
                return Err(LedgerError::NegativeBalance { account_id: *id });
            }
            projected.insert(*id, next);
        }

        for (id, balance) in projected {
            if let Some(account) = accounts.get_mut(&id) {
                account.balance = balance;
            }
        }
        Ok(())
    }
}

/// Ledger store kept in process memory.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a fault. Stays active until [`clear_faults`](Self::clear_faults).
    pub fn inject_fault(&self, fault: Fault) {
        self.inner.faults.lock().push(fault);
    }

    /// Remove all planted faults.
    pub fn clear_faults(&self) {
        self.inner.faults.lock().clear();
    }

    /// Number of committed transactions.
    pub fn commit_count(&self) -> u64 {
        self.inner.commits.load(Ordering::Relaxed)
    }

    /// Number of transactions rolled back, explicitly or by drop.
    pub fn rollback_count(&self) -> u64 {
        self.inner.rollbacks.load(Ordering::Relaxed)
    }

    /// Committed balance of an account, if it exists.
    pub fn balance_of(&self, number: AccountNumber) -> Option<MinorUnits> {
        self.inner
            .accounts
            .lock()
            .values()
            .find(|a| a.number == number)
            .map(|a| a.balance)
    }

    /// Sum of every committed balance.
    pub fn total_balance(&self) -> MinorUnits {
        self.inner.accounts.lock().values().map(|a| a.balance).sum()
    }

    /// Snapshot of all accounts ordered by id.
    pub fn accounts(&self) -> Vec<Account> {
        self.inner.accounts.lock().values().cloned().collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryTransaction;

    async fn get_account_by_number(&self, number: AccountNumber) -> LedgerResult<Account> {
        self.inner.check_fault(Fault::Lookup(number))?;
        self.inner
            .accounts
            .lock()
            .values()
            .find(|a| a.number == number)
            .cloned()
            .ok_or(LedgerError::AccountNumberNotFound(number))
    }

    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account> {
        self.inner
            .accounts
            .lock()
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn begin_transaction(&self) -> LedgerResult<MemoryTransaction> {
        self.inner.check_fault(Fault::Begin)?;
        Ok(MemoryTransaction {
            inner: self.inner.clone(),
            staged: Vec::new(),
            state: TxState::Open,
        })
    }

    async fn update_balance(
        &self,
        account_id: AccountId,
        delta: MinorUnits,
        tx: Option<&mut MemoryTransaction>,
    ) -> LedgerResult<()> {
        let rows = match tx {
            Some(tx) => tx.apply_delta(account_id, delta).await?,
            None => {
                self.inner.check_fault(Fault::UpdateBalance(account_id))?;
                if !self.inner.accounts.lock().contains_key(&account_id) {
                    0
                } else {
                    self.inner.apply_all(&[(account_id, delta)])?;
                    1
                }
            }
        };

        if rows == 0 {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> LedgerResult<Account> {
        if account.balance.is_negative() {
            return Err(LedgerError::NegativeOpeningBalance(account.number));
        }

        let mut accounts = self.inner.accounts.lock();
        if accounts.values().any(|a| a.number == account.number) {
            return Err(LedgerError::DuplicateAccountNumber(account.number));
        }

        let id = AccountId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let created = Account {
            id,
            first_name: account.first_name,
            last_name: account.last_name,
            number: account.number,
            balance: account.balance,
            created_at: Utc::now(),
        };
        accounts.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_account(&self, id: AccountId) -> LedgerResult<bool> {
        Ok(self.inner.accounts.lock().remove(&id).is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Open,
    Committed,
    RolledBack,
}

/// Transaction on a [`MemoryLedgerStore`].
pub struct MemoryTransaction {
    inner: Arc<Inner>,
    staged: Vec<(AccountId, MinorUnits)>,
    state: TxState,
}

impl MemoryTransaction {
    fn discard(&mut self) {
        self.staged.clear();
        self.state = TxState::RolledBack;
        self.inner.rollbacks.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: MinorUnits,
    ) -> LedgerResult<u64> {
        if self.state != TxState::Open {
            return Err(LedgerError::TransactionClosed);
        }
        self.inner.check_fault(Fault::UpdateBalance(account_id))?;

        let committed = match self.inner.accounts.lock().get(&account_id) {
            Some(account) => account.balance,
            None => return Ok(0),
        };

        // Mirror the CHECK (balance >= 0) constraint against what this
        // transaction would see.
        let pending: MinorUnits = self
            .staged
            .iter()
            .filter(|(id, _)| *id == account_id)
            .map(|(_, d)| *d)
            .sum();
        if (committed + pending + delta).is_negative() {
            return Err(LedgerError::NegativeBalance { account_id });
        }

        self.staged.push((account_id, delta));
        Ok(1)
    }

    async fn commit(&mut self) -> LedgerResult<()> {
        match self.state {
            TxState::Committed => return Ok(()),
            TxState::RolledBack => return Err(LedgerError::TransactionClosed),
            TxState::Open => {}
        }
        self.inner.check_fault(Fault::Commit)?;

        self.inner.apply_all(&self.staged)?;
        self.staged.clear();
        self.state = TxState::Committed;
        self.inner.commits.fetch_add(1, Ordering::Relaxed);
        debug!("Memory transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> LedgerResult<()> {
        if self.state != TxState::Open {
            return Ok(());
        }
        self.discard();
        self.inner.check_fault(Fault::Rollback)
    }

    fn is_open(&self) -> bool {
        self.state == TxState::Open
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.state == TxState::Open {
            self.discard();
        }
    }
}

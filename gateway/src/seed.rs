//! Demo data and manual balance adjustments.

use tracing::{info, instrument};

use minibank_common::AccountNumber;
use minibank_ledger::{Account, LedgerResult, LedgerStore, LedgerTransaction, NewAccount};

/// Opening balance credited to the demo account, in major units.
pub const DEMO_BALANCE: f64 = 1000.00;

/// Create the demo account and credit its opening balance.
pub async fn seed_demo_account<S: LedgerStore>(store: &S) -> LedgerResult<Account> {
    let account = store.create_account(NewAccount::new("Transfer", "Test")).await?;
    info!(id = %account.id, number = %account.number, "Demo account created");

    credit_account(store, account.number, DEMO_BALANCE).await
}

/// Credit `amount` major units to an account inside a committed transaction.
///
/// Returns the account as re-read after the commit.
#[instrument(skip(store))]
pub async fn credit_account<S: LedgerStore>(
    store: &S,
    number: AccountNumber,
    amount: f64,
) -> LedgerResult<Account> {
    let account = store.get_account_by_number(number).await?;

    // An early return drops the open transaction, which rolls it back.
    let mut tx = store.begin_transaction().await?;
    store
        .update_balance_major(account.id, amount, Some(&mut tx))
        .await?;
    tx.commit().await?;

    let updated = store.get_account_by_number(number).await?;
    info!(balance = %updated.balance, "Balance credited");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minibank_common::MinorUnits;
    use minibank_ledger::{Fault, LedgerError, MemoryLedgerStore};

    #[tokio::test]
    async fn test_seed_demo_account() {
        let store = MemoryLedgerStore::new();

        let account = seed_demo_account(&store).await.unwrap();

        assert_eq!(account.first_name, "Transfer");
        assert_eq!(account.last_name, "Test");
        assert_eq!(account.balance, MinorUnits::new(100000));
        assert_eq!(account.balance.to_string(), "1000.00");
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_credit_unknown_account() {
        let store = MemoryLedgerStore::new();
        let err = credit_account(&store, AccountNumber::new(42), 10.0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_balance() {
        let store = MemoryLedgerStore::new();
        let account = store
            .create_account(NewAccount::new("A", "B").with_number(7))
            .await
            .unwrap();
        store.inject_fault(Fault::Commit);

        let err = credit_account(&store, account.number, 5.0).await.unwrap_err();

        assert!(matches!(err, LedgerError::InjectedFault(_)));
        assert_eq!(store.balance_of(account.number), Some(MinorUnits::ZERO));
        assert_eq!(store.rollback_count(), 1);
    }
}

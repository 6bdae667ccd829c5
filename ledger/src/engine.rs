//! Transfer engine.
//!
//! Moves funds between two account balances as one unit of work: validate,
//! open a transaction, debit the source, credit the destination, commit.
//! Any failure after the transaction opens rolls it back exactly once.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use minibank_common::{
    AccountNumber, AccountSide, MinorUnits, Receipt, Result, TransferError, TransferId,
    TransferRequest, TransferStatus,
};

use crate::account::Account;
use crate::error::LedgerError;
use crate::metrics::{SharedTransferMetrics, TransferMetrics};
use crate::store::{LedgerStore, LedgerTransaction};

/// Executes transfers against an injected ledger store.
pub struct TransferEngine<S: LedgerStore> {
    store: Arc<S>,
    metrics: SharedTransferMetrics,
}

impl<S: LedgerStore> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S: LedgerStore> TransferEngine<S> {
    /// Create a new engine over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_metrics(store, Arc::new(TransferMetrics::new()))
    }

    /// Create a new engine reporting into shared metrics.
    pub fn with_metrics(store: Arc<S>, metrics: SharedTransferMetrics) -> Self {
        Self { store, metrics }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get the engine metrics.
    pub fn metrics(&self) -> &SharedTransferMetrics {
        &self.metrics
    }

    /// Execute a transfer.
    ///
    /// On success both balances have changed by exactly the converted amount
    /// and the change is committed. On any error neither balance has changed.
    pub async fn execute(&self, request: TransferRequest) -> Result<Receipt> {
        self.execute_with_id(TransferId::new(), request).await
    }

    #[instrument(
        name = "transfer",
        skip(self, request),
        fields(
            transfer_id = %transfer_id,
            from = %request.from_account,
            to = %request.to_account,
            amount = request.amount,
        )
    )]
    async fn execute_with_id(
        &self,
        transfer_id: TransferId,
        request: TransferRequest,
    ) -> Result<Receipt> {
        self.metrics.transfer_submitted();

        let result = match self.validate(&request).await {
            Ok(amount) => self.perform(transfer_id, &request, amount).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(receipt) => {
                self.metrics.transfer_succeeded(receipt.amount_minor);
                info!(amount_minor = receipt.amount_minor.get(), "Transfer committed");
            }
            Err(err) if err.is_validation() => {
                self.metrics.transfer_rejected();
                info!(code = err.error_code(), error = %err, "Transfer rejected");
            }
            Err(err) => {
                self.metrics.transfer_failed();
                warn!(code = err.error_code(), error = %err, "Transfer failed");
            }
        }

        result
    }

    /// Side-effect free checks. Returns the amount in minor units.
    async fn validate(&self, request: &TransferRequest) -> Result<MinorUnits> {
        let amount = MinorUnits::from_major(request.amount)
            .ok()
            .filter(MinorUnits::is_positive)
            .ok_or(TransferError::InvalidAmount)?;

        let source = self.resolve(AccountSide::Source, request.from_account).await?;
        let destination = self
            .resolve(AccountSide::Destination, request.to_account)
            .await?;

        if source.number == destination.number {
            return Err(TransferError::SelfTransfer);
        }

        if !source.has_sufficient_funds(amount) {
            return Err(TransferError::InsufficientFunds {
                required: amount,
                available: source.balance,
            });
        }

        Ok(amount)
    }

    async fn perform(
        &self,
        transfer_id: TransferId,
        request: &TransferRequest,
        amount: MinorUnits,
    ) -> Result<Receipt> {
        // Accounts are resolved again here; nothing read during validation is
        // carried into the mutation.
        let source = self.resolve(AccountSide::Source, request.from_account).await?;
        let destination = self
            .resolve(AccountSide::Destination, request.to_account)
            .await?;

        let mut tx = self
            .store
            .begin_transaction()
            .await
            .map_err(|e| TransferError::StoreUnavailable(e.public_message()))?;

        if let Err(err) = self.apply_legs(&mut tx, &source, &destination, amount).await {
            self.release(&mut tx).await;
            return Err(err);
        }

        Ok(Receipt {
            status: TransferStatus::Success,
            transfer_id,
            from_account: source.number,
            to_account: destination.number,
            amount: request.amount,
            amount_minor: amount,
            timestamp: Utc::now(),
        })
    }

    /// Debit, credit and commit inside `tx`.
    async fn apply_legs(
        &self,
        tx: &mut S::Tx,
        source: &Account,
        destination: &Account,
        amount: MinorUnits,
    ) -> Result<()> {
        self.store
            .update_balance(source.id, -amount, Some(&mut *tx))
            .await
            .map_err(|e| TransferError::DebitFailed {
                number: source.number,
                reason: e.public_message(),
            })?;
        debug!(account = %source.number, "Source debited");

        self.store
            .update_balance(destination.id, amount, Some(&mut *tx))
            .await
            .map_err(|e| TransferError::CreditFailed {
                number: destination.number,
                reason: e.public_message(),
            })?;
        debug!(account = %destination.number, "Destination credited");

        tx.commit()
            .await
            .map_err(|e| TransferError::CommitFailed(e.public_message()))
    }

    /// The single rollback point. Failures are logged, never escalated.
    async fn release(&self, tx: &mut S::Tx) {
        if let Err(err) = tx.rollback().await {
            self.metrics.rollback_failed();
            warn!(error = %err, "Rollback failed");
        }
    }

    async fn resolve(&self, side: AccountSide, number: AccountNumber) -> Result<Account> {
        self.store
            .get_account_by_number(number)
            .await
            .map_err(|e| lookup_error(e, side, number))
    }
}

fn lookup_error(err: LedgerError, side: AccountSide, number: AccountNumber) -> TransferError {
    if err.is_not_found() {
        TransferError::AccountNotFound { side, number }
    } else {
        TransferError::StoreUnavailable(err.public_message())
    }
}

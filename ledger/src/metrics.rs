//! Transfer execution counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minibank_common::MinorUnits;
use serde::Serialize;

/// Counters kept by a transfer engine.
#[derive(Debug, Default)]
pub struct TransferMetrics {
    /// Transfers submitted.
    pub transfers_total: AtomicU64,
    /// Transfers committed.
    pub transfers_succeeded: AtomicU64,
    /// Transfers rejected by validation.
    pub transfers_rejected: AtomicU64,
    /// Transfers that failed after validation.
    pub transfers_failed: AtomicU64,
    /// Rollbacks that reported an error.
    pub rollback_failures: AtomicU64,
    /// Minor units moved by committed transfers.
    pub minor_units_moved: AtomicU64,
}

impl TransferMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment transfers submitted.
    pub fn transfer_submitted(&self) {
        self.transfers_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed transfer.
    pub fn transfer_succeeded(&self, amount: MinorUnits) {
        self.transfers_succeeded.fetch_add(1, Ordering::Relaxed);
        self.minor_units_moved
            .fetch_add(amount.get().unsigned_abs(), Ordering::Relaxed);
    }

    /// Record a validation rejection.
    pub fn transfer_rejected(&self) {
        self.transfers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an execution failure.
    pub fn transfer_failed(&self) {
        self.transfers_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rollback that reported an error.
    pub fn rollback_failed(&self) {
        self.rollback_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> TransferMetricsSnapshot {
        TransferMetricsSnapshot {
            transfers_total: self.transfers_total.load(Ordering::Relaxed),
            transfers_succeeded: self.transfers_succeeded.load(Ordering::Relaxed),
            transfers_rejected: self.transfers_rejected.load(Ordering::Relaxed),
            transfers_failed: self.transfers_failed.load(Ordering::Relaxed),
            rollback_failures: self.rollback_failures.load(Ordering::Relaxed),
            minor_units_moved: self.minor_units_moved.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TransferMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferMetricsSnapshot {
    pub transfers_total: u64,
    pub transfers_succeeded: u64,
    pub transfers_rejected: u64,
    pub transfers_failed: u64,
    pub rollback_failures: u64,
    pub minor_units_moved: u64,
}

/// Shared metrics handle.
pub type SharedTransferMetrics = Arc<TransferMetrics>;

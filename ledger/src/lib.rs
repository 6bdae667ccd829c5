//! Minibank Ledger
//!
//! Account storage and the transfer engine that moves funds between accounts
//! atomically.

pub mod account;
pub mod engine;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod postgres;
pub mod store;

pub use account::{Account, NewAccount};
pub use engine::TransferEngine;
pub use error::{LedgerError, LedgerResult};
pub use memory::{Fault, MemoryLedgerStore, MemoryTransaction};
pub use metrics::{SharedTransferMetrics, TransferMetrics, TransferMetricsSnapshot};
pub use postgres::{PgLedgerStore, PgTransaction, PoolSettings};
pub use store::{LedgerStore, LedgerTransaction};

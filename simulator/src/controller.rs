//! Simulation controller.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use minibank_common::{AccountNumber, MinorUnits, TransferRequest};
use minibank_ledger::{
    Fault, LedgerStore, MemoryLedgerStore, NewAccount, TransferEngine, TransferMetricsSnapshot,
};

use crate::metrics::SimulationMetrics;
use crate::scenario::{FaultPlan, Scenario, Traffic};

/// First account number handed out by the simulator.
const FIRST_ACCOUNT_NUMBER: i64 = 100_000;

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of accounts to open.
    pub account_count: usize,
    /// Opening balance of every account.
    pub initial_balance: MinorUnits,
    /// Transfers to submit.
    pub transfers: usize,
    /// Concurrent worker tasks.
    pub workers: usize,
    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            account_count: 8,
            initial_balance: MinorUnits::new(100_000),
            transfers: 1000,
            workers: 16,
            seed: None,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Scenario that ran.
    pub scenario: String,
    /// Sum of balances before traffic.
    pub initial_total: MinorUnits,
    /// Sum of balances after traffic.
    pub final_total: MinorUnits,
    /// Accounts that ended below zero.
    pub negative_accounts: Vec<AccountNumber>,
    /// Client-side view of the run.
    pub metrics: SimulationMetrics,
    /// Engine counters.
    pub engine: TransferMetricsSnapshot,
    /// Transactions rolled back by the store.
    pub rollbacks: u64,
}

impl SimulationReport {
    /// Check that money was conserved and no balance went negative.
    pub fn is_consistent(&self) -> bool {
        self.initial_total == self.final_total && self.negative_accounts.is_empty()
    }
}

/// Controls the simulation.
pub struct SimulationController {
    /// Simulation parameters.
    config: SimulationConfig,
    /// Random number generator.
    rng: StdRng,
    /// Shared engine over the in-memory store.
    engine: TransferEngine<MemoryLedgerStore>,
    /// Opened accounts.
    accounts: Vec<AccountNumber>,
    /// Simulation metrics.
    metrics: Arc<RwLock<SimulationMetrics>>,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            rng,
            engine: TransferEngine::new(Arc::new(MemoryLedgerStore::new())),
            accounts: Vec::new(),
            metrics: Arc::new(RwLock::new(SimulationMetrics::new())),
        }
    }

    /// Open the simulated accounts.
    pub async fn initialize(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(self.config.account_count >= 2, "Need at least 2 accounts");

        info!(
            accounts = self.config.account_count,
            balance = %self.config.initial_balance,
            "Initializing simulation"
        );

        let store = self.engine.store();
        for i in 0..self.config.account_count {
            let account = store
                .create_account(
                    NewAccount::new(format!("Sim{}", i), "Account")
                        .with_number(FIRST_ACCOUNT_NUMBER + i as i64)
                        .with_balance(self.config.initial_balance),
                )
                .await?;
            self.accounts.push(account.number);
        }

        Ok(())
    }

    /// Run a scenario to completion and check the ledger afterwards.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<SimulationReport> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        let store = self.engine.store().clone();
        let initial_total = store.total_balance();

        for plan in &scenario.faults {
            self.plant(plan).await?;
        }

        let plan = self.plan_transfers(scenario.traffic);
        let workers = self.config.workers.max(1);
        let mut batches: Vec<Vec<TransferRequest>> = vec![Vec::new(); workers];
        for (i, request) in plan.into_iter().enumerate() {
            batches[i % workers].push(request);
        }

        let handles = batches.into_iter().map(|batch| {
            let engine = self.engine.clone();
            let metrics = self.metrics.clone();
            tokio::spawn(async move {
                for request in batch {
                    let started = Instant::now();
                    let result = engine.execute(request).await;
                    let latency = started.elapsed().as_micros() as u64;

                    let mut metrics = metrics.write().await;
                    match result {
                        Ok(_) => metrics.record_success(latency),
                        Err(e) if e.is_validation() => metrics.record_rejection(),
                        Err(_) => metrics.record_failure(),
                    }
                }
            })
        });

        for joined in join_all(handles).await {
            joined?;
        }

        store.clear_faults();

        let accounts = store.accounts();
        let negative_accounts: Vec<AccountNumber> = accounts
            .iter()
            .filter(|a| a.balance.is_negative())
            .map(|a| a.number)
            .collect();

        let report = SimulationReport {
            scenario: scenario.name.clone(),
            initial_total,
            final_total: store.total_balance(),
            negative_accounts,
            metrics: self.metrics.read().await.clone(),
            engine: self.engine.metrics().snapshot(),
            rollbacks: store.rollback_count(),
        };

        if !report.is_consistent() {
            warn!(
                initial = %report.initial_total,
                final_total = %report.final_total,
                negative = report.negative_accounts.len(),
                "Ledger invariant violated"
            );
        }

        Ok(report)
    }

    async fn plant(&self, plan: &FaultPlan) -> anyhow::Result<()> {
        match *plan {
            FaultPlan::UpdateFailure { account_index } => {
                let number = self
                    .accounts
                    .get(account_index)
                    .copied()
                    .ok_or_else(|| anyhow::anyhow!("No account at index {}", account_index))?;
                let account = self.engine.store().get_account_by_number(number).await?;
                info!(account = %number, "Injecting update fault");
                self.engine
                    .store()
                    .inject_fault(Fault::UpdateBalance(account.id));
            }
        }
        Ok(())
    }

    /// Generate the transfer sequence up front so a seeded run is repeatable.
    fn plan_transfers(&mut self, traffic: Traffic) -> Vec<TransferRequest> {
        let count = self.accounts.len();
        let max_cents = (self.config.initial_balance.get() / 4).max(1);

        (0..self.config.transfers)
            .map(|_| {
                let (from, to) = match traffic {
                    Traffic::Uniform => {
                        let from = self.rng.gen_range(0..count);
                        let mut to = self.rng.gen_range(0..count);
                        while to == from {
                            to = self.rng.gen_range(0..count);
                        }
                        (from, to)
                    }
                    Traffic::Hotspot => {
                        if self.rng.gen_bool(0.5) {
                            (0, 1)
                        } else {
                            (1, 0)
                        }
                    }
                };
                let cents = self.rng.gen_range(1..=max_cents);
                TransferRequest::new(self.accounts[from], self.accounts[to], cents as f64 / 100.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(transfers: usize) -> SimulationConfig {
        SimulationConfig {
            account_count: 5,
            initial_balance: MinorUnits::new(10_000),
            transfers,
            workers: 4,
            seed: Some(7),
        }
    }

    async fn run(name: &str, transfers: usize) -> SimulationReport {
        let mut controller = SimulationController::new(config(transfers));
        controller.initialize().await.unwrap();
        let scenario = Scenario::load(name).unwrap();
        controller.run_scenario(&scenario).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_random_load_conserves_money() {
        let report = run("random-load", 300).await;

        assert!(report.is_consistent());
        assert_eq!(report.initial_total, MinorUnits::new(50_000));
        assert_eq!(report.metrics.total_transfers, 300);
        assert_eq!(report.engine.transfers_total, 300);
        assert!(report.metrics.successful_transfers > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contention_conserves_money() {
        let report = run("contention", 300).await;

        assert!(report.is_consistent());
        assert_eq!(
            report.metrics.successful_transfers,
            report.engine.transfers_succeeded
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_faulty_credit_leaks_nothing() {
        let report = run("faulty-credit", 300).await;

        assert!(report.is_consistent());
        assert!(report.metrics.failed_transfers > 0);
        assert!(report.rollbacks >= report.metrics.failed_transfers);
    }

    #[tokio::test]
    async fn test_seeded_plan_is_repeatable() {
        let mut first = SimulationController::new(config(20));
        let mut second = SimulationController::new(config(20));
        first.initialize().await.unwrap();
        second.initialize().await.unwrap();

        assert_eq!(
            first.plan_transfers(Traffic::Uniform),
            second.plan_transfers(Traffic::Uniform)
        );
    }

    #[tokio::test]
    async fn test_requires_two_accounts() {
        let mut controller = SimulationController::new(SimulationConfig {
            account_count: 1,
            ..config(1)
        });
        assert!(controller.initialize().await.is_err());
    }
}

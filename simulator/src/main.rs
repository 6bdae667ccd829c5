//! Minibank Simulator
//!
//! Fires concurrent random transfers at an in-memory ledger and checks that
//! money is conserved.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minibank_common::MinorUnits;

mod controller;
mod metrics;
mod scenario;

use controller::{SimulationConfig, SimulationController};
use scenario::Scenario;

/// Minibank Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Minibank transfer load simulator")]
struct Args {
    /// Number of accounts to open
    #[arg(short, long, default_value = "8")]
    accounts: usize,

    /// Scenario to run (random-load, contention, faulty-credit)
    #[arg(short, long, default_value = "random-load")]
    scenario: String,

    /// Opening balance per account, in major units
    #[arg(long, default_value = "1000.00")]
    balance: f64,

    /// Number of transfers to submit
    #[arg(short, long, default_value = "1000")]
    transfers: usize,

    /// Concurrent worker tasks
    #[arg(short, long, default_value = "16")]
    workers: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,minibank_ledger=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    info!("Starting Minibank Simulator");
    info!("Accounts: {}", args.accounts);
    info!("Transfers: {} across {} workers", args.transfers, args.workers);

    let scenario = Scenario::load(&args.scenario)?;

    let mut controller = SimulationController::new(SimulationConfig {
        account_count: args.accounts,
        initial_balance: MinorUnits::from_major(args.balance)?,
        transfers: args.transfers,
        workers: args.workers,
        seed: args.seed,
    });
    controller.initialize().await?;

    let report = controller.run_scenario(&scenario).await?;

    info!("Simulation complete");
    info!("Total transfers: {}", report.metrics.total_transfers);
    info!("Successful: {}", report.metrics.successful_transfers);
    info!("Rejected: {}", report.metrics.rejected_transfers);
    info!("Failed: {}", report.metrics.failed_transfers);
    info!("Average latency: {}µs", report.metrics.average_latency_us());
    info!("p99 latency: {}µs", report.metrics.p99_latency_us());
    info!("Success rate: {:.2}", report.metrics.success_rate());

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_consistent() {
        error!(
            initial = %report.initial_total,
            final_total = %report.final_total,
            "Money was not conserved"
        );
        anyhow::bail!("ledger invariant violated in scenario {}", report.scenario);
    }

    Ok(())
}

//! Minibank Gateway Binary
//!
//! Account administration and transfers against the PostgreSQL ledger.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use minibank_common::{AccountId, AccountNumber, TransferRequest};
use minibank_gateway::api::{self, ApiResponse};
use minibank_gateway::logging::init_logging;
use minibank_gateway::GatewayConfig;
use minibank_ledger::{PgLedgerStore, TransferEngine};

/// Minibank CLI
#[derive(Parser, Debug)]
#[command(name = "minibank")]
#[command(about = "Minibank account and transfer gateway")]
struct Args {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the account table if missing
    Init,
    /// Create the demo account with an opening balance
    Seed,
    /// Create an account with a random number
    CreateAccount {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Print an account
    Account { id: i32 },
    /// Delete an account
    DeleteAccount { id: i32 },
    /// Credit an account by number
    Deposit {
        #[arg(long)]
        number: i64,
        #[arg(long)]
        amount: f64,
    },
    /// Move money between two accounts
    Transfer {
        /// Raw JSON request body
        #[arg(long, conflicts_with_all = ["from", "to", "amount"])]
        body: Option<String>,
        #[arg(long, requires_all = ["to", "amount"])]
        from: Option<i64>,
        #[arg(long)]
        to: Option<i64>,
        #[arg(long)]
        amount: Option<f64>,
    },
}

fn print(response: &ApiResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

async fn ensure_schema(store: &PgLedgerStore) -> Option<ApiResponse> {
    match store.ensure_schema().await {
        Ok(()) => None,
        Err(e) => Some(api::ledger_failure(e)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = GatewayConfig::from_env();
    if let Some(url) = args.database_url.clone() {
        config.database.url = url;
    }
    if let Err(e) = config.validate() {
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    init_logging(&config)?;

    let store =
        PgLedgerStore::connect(&config.database.url, &config.database.pool_settings()).await?;
    store.health_check().await?;

    let response = match args.command {
        Command::Init => match ensure_schema(&store).await {
            Some(failure) => failure,
            None => {
                info!("Schema ready");
                ApiResponse::ok(&json!({ "schema": "ready" }))
            }
        },
        Command::Seed => match ensure_schema(&store).await {
            Some(failure) => failure,
            None => api::handle_seed(&store).await,
        },
        Command::CreateAccount {
            first_name,
            last_name,
        } => {
            let body = json!({ "firstName": first_name, "lastName": last_name });
            api::handle_create_account(&store, &body.to_string()).await
        }
        Command::Account { id } => api::handle_get_account(&store, AccountId::new(id)).await,
        Command::DeleteAccount { id } => {
            api::handle_delete_account(&store, AccountId::new(id)).await
        }
        Command::Deposit { number, amount } => {
            api::handle_deposit(&store, AccountNumber::new(number), amount).await
        }
        Command::Transfer {
            body,
            from,
            to,
            amount,
        } => {
            let body = match (body, from, to, amount) {
                (Some(body), _, _, _) => Some(body),
                (None, Some(from), Some(to), Some(amount)) => Some(serde_json::to_string(
                    &TransferRequest::new(from, to, amount),
                )?),
                _ => None,
            };

            match body {
                Some(body) => {
                    let engine = TransferEngine::new(Arc::new(store.clone()));
                    let response = api::handle_transfer(&engine, &body).await;
                    info!(metrics = ?engine.metrics().snapshot(), "Transfer finished");
                    response
                }
                None => ApiResponse::bad_request(api::INVALID_PAYLOAD),
            }
        }
    };

    print(&response)?;
    store.close().await;

    if !response.is_success() {
        error!(status = response.status, "Request failed");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

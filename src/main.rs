//! Charge Authorizer CLI
//!
//! Command-line front end for resetting accounts and authorizing charges
//! against a shared Redis store.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- reset --account acct-1
//! cargo run -- charge --account acct-1 --amount 30
//! cargo run -- --strategy optimistic charge --account acct-1 --amount 30
//! cargo run -- --store memory contend --amount 100 --requests 4
//! REDIS_HOST=cache.internal REDIS_PORT=6380 cargo run -- charge
//! ```
//!
//! Charge results are printed to stdout as JSON, one per line. Logs go to
//! stderr; set `RUST_LOG` to adjust verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success (including declined charges)
//! - 1: Error (store unreachable, reset failed, etc.)

use charge_authorizer::cli::{self, CliArgs, Command, StoreType};
use charge_authorizer::store::{BalanceStore, MemoryStore, RedisStore};
use charge_authorizer::strategy::create_strategy;
use charge_authorizer::{ChargeAuthorizer, ChargeResult};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(args)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), String> {
    let store: Arc<dyn BalanceStore> = match args.store {
        StoreType::Redis => Arc::new(
            RedisStore::connect(&args.redis_host, args.redis_port)
                .await
                .map_err(|e| e.to_string())?,
        ),
        StoreType::Memory => Arc::new(MemoryStore::new()),
    };

    let config = args.to_authorizer_config();
    let strategy = create_strategy(args.strategy, &config);
    let authorizer = Arc::new(ChargeAuthorizer::with_strategy(store, strategy, config));

    match args.command {
        Command::Reset { account } => {
            authorizer
                .reset(&account)
                .await
                .map_err(|e| format!("Failed to reset account '{}': {}", account, e))?;
        }
        Command::Charge { account, amount } => {
            let result = authorizer.charge(&account, amount).await;
            print_result(&result)?;
        }
        Command::Contend {
            account,
            amount,
            requests,
        } => {
            authorizer
                .reset(&account)
                .await
                .map_err(|e| format!("Failed to reset account '{}': {}", account, e))?;

            // All requests start together and race for the same account
            let tasks = (0..requests).map(|_| {
                let authorizer = Arc::clone(&authorizer);
                let account = account.clone();
                tokio::spawn(async move { authorizer.charge(&account, amount).await })
            });

            let mut authorized = 0;
            for joined in futures::future::join_all(tasks).await {
                match joined {
                    Ok(result) => {
                        if result.is_authorized {
                            authorized += 1;
                        }
                        print_result(&result)?;
                    }
                    Err(e) => tracing::error!("Task panicked: {:?}", e),
                }
            }
            tracing::info!(account = %account, requests, authorized, "contention run finished");
        }
    }

    Ok(())
}

fn print_result(result: &ChargeResult) -> Result<(), String> {
    let line = serde_json::to_string(result).map_err(|e| format!("Failed to encode result: {}", e))?;
    println!("{}", line);
    Ok(())
}

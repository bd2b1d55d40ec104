use crate::core::{AuthorizerConfig, DEFAULT_BALANCE};
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;

/// Authorize charges against balances in a shared store
#[derive(Parser, Debug)]
#[command(name = "charge-authorizer")]
#[command(about = "Authorize charges against balances in a shared store", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Redis host shared by every instance
    #[arg(long = "redis-host", env = "REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,

    /// Redis port
    #[arg(long = "redis-port", env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    /// Balance written by `reset`
    #[arg(
        long = "default-balance",
        env = "DEFAULT_BALANCE",
        default_value_t = DEFAULT_BALANCE,
        allow_negative_numbers = true
    )]
    pub default_balance: i64,

    /// Backing store
    #[arg(
        long = "store",
        value_name = "STORE",
        default_value = "redis",
        help = "Store backend: 'redis' for the shared server or 'memory' for a process-local map"
    )]
    pub store: StoreType,

    /// Charge strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "pessimistic",
        help = "Charge strategy: 'pessimistic', 'optimistic', 'naive' or 'decrement'"
    )]
    pub strategy: StrategyType,

    /// Lock token expiry in milliseconds
    #[arg(long = "lock-ttl-ms", value_name = "MS", default_value_t = 1000)]
    pub lock_ttl_ms: u64,

    /// Pause between attempts on a contended account, in milliseconds
    #[arg(long = "retry-backoff-ms", value_name = "MS", default_value_t = 10)]
    pub retry_backoff_ms: u64,

    /// Maximum attempts per charge
    #[arg(long = "max-attempts", value_name = "COUNT", default_value_t = 500)]
    pub max_attempts: u32,

    /// Maximum time spent retrying a single charge, in milliseconds
    #[arg(long = "max-wait-ms", value_name = "MS", default_value_t = 5000)]
    pub max_wait_ms: u64,

    /// Runtime worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,
}

/// Operations exposed to callers
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set an account's balance to the default
    Reset {
        #[arg(long, default_value = "account")]
        account: String,
    },

    /// Charge an amount against an account and print the result as JSON
    Charge {
        #[arg(long, default_value = "account")]
        account: String,

        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        amount: i64,
    },

    /// Reset an account, then issue concurrent charges against it
    Contend {
        #[arg(long, default_value = "account")]
        account: String,

        #[arg(long, default_value_t = 100)]
        amount: i64,

        #[arg(long, default_value_t = 4)]
        requests: usize,
    },
}

/// Available store backends
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreType {
    Redis,
    Memory,
}

/// Available charge strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Pessimistic,
    Optimistic,
    Naive,
    Decrement,
}

impl CliArgs {
    /// Build an AuthorizerConfig from CLI arguments
    ///
    /// Zero durations and a zero attempt count are replaced by defaults (with
    /// a warning) by `AuthorizerConfig::new`.
    pub fn to_authorizer_config(&self) -> AuthorizerConfig {
        AuthorizerConfig::new(
            Duration::from_millis(self.lock_ttl_ms),
            Duration::from_millis(self.retry_backoff_ms),
            self.max_attempts,
            Duration::from_millis(self.max_wait_ms),
            self.default_balance,
        )
    }

    /// Number of runtime worker threads, defaulting to the CPU count
    pub fn worker_threads(&self) -> usize {
        self.workers
            .filter(|&workers| workers > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, Command, StoreType, StrategyType};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Values not given on the command line fall back to `REDIS_HOST`,
/// `REDIS_PORT` and `DEFAULT_BALANCE` from the environment, then to built-in
/// defaults. On invalid arguments or `--help`, clap prints a message and
/// exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

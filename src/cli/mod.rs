// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, StrategyType};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Invalid arguments or `--help` make clap print a message and exit the process.
/// Options not given on the command line are read from their `LEDGER_*`
/// environment variables.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

use crate::config::{LedgerConfig, DEFAULT_EFFECT_QUEUE_CAPACITY, DEFAULT_EVENT_TOPIC};
use crate::strategy::BatchConfig;
use crate::types::Money;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay ledger operations and print final balances
#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Replay ledger operations from CSV and print final balances", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path (`type,user,counterparty,amount`)
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Balance below which a low-balance notification is sent
    #[arg(
        long = "low-balance-threshold",
        value_name = "AMOUNT",
        env = "LEDGER_LOW_BALANCE_THRESHOLD",
        default_value = "100.00"
    )]
    pub low_balance_threshold: Money,

    /// Topic ledger events are published on
    #[arg(
        long = "event-topic",
        value_name = "TOPIC",
        env = "LEDGER_EVENT_TOPIC",
        default_value = DEFAULT_EVENT_TOPIC
    )]
    pub event_topic: String,

    /// Capacity of the queued side-effect channel (async mode only)
    #[arg(
        long = "queue-capacity",
        value_name = "COUNT",
        env = "LEDGER_EFFECT_QUEUE_CAPACITY",
        default_value_t = DEFAULT_EFFECT_QUEUE_CAPACITY
    )]
    pub queue_capacity: usize,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        env = "LEDGER_BATCH_SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        env = "LEDGER_MAX_CONCURRENT",
        help = "Worker threads for the async runtime (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Ledger settings from the parsed arguments
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig::new(
            self.low_balance_threshold,
            &self.event_topic,
            self.queue_capacity,
        )
    }

    /// Batch settings from the parsed arguments, defaults where absent
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["ledger", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["ledger", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["ledger", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::batch_size(&["ledger", "--batch-size", "2000", "input.csv"], Some(2000), None)]
    #[case::max_concurrent(&["ledger", "--max-concurrent", "8", "input.csv"], None, Some(8))]
    #[case::no_options(&["ledger", "input.csv"], None, None)]
    fn test_batch_options(
        #[case] args: &[&str],
        #[case] batch_size: Option<usize>,
        #[case] max_concurrent: Option<usize>,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.batch_size, batch_size);
        assert_eq!(parsed.max_concurrent_batches, max_concurrent);
    }

    #[rstest]
    #[case::all_defaults(&["ledger", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["ledger", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::zero_batch_size(&["ledger", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    #[case::all_custom(
        &["ledger", "--batch-size", "2000", "--max-concurrent", "8", "input.csv"],
        2000,
        8
    )]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();
        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[test]
    fn test_ledger_config_defaults() {
        let config = CliArgs::try_parse_from(["ledger", "input.csv"])
            .unwrap()
            .to_ledger_config();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_ledger_config_custom_values() {
        let config = CliArgs::try_parse_from([
            "ledger",
            "--low-balance-threshold",
            "25.50",
            "--event-topic",
            "audit",
            "--queue-capacity",
            "16",
            "input.csv",
        ])
        .unwrap()
        .to_ledger_config();

        assert_eq!(config.low_balance_threshold, Money::from_cents(2_550));
        assert_eq!(config.event_topic, "audit");
        assert_eq!(config.effect_queue_capacity, 16);
    }

    #[test]
    fn test_zero_queue_capacity_falls_back() {
        let config = CliArgs::try_parse_from(["ledger", "--queue-capacity", "0", "input.csv"])
            .unwrap()
            .to_ledger_config();
        assert_eq!(config.effect_queue_capacity, DEFAULT_EFFECT_QUEUE_CAPACITY);
    }

    #[rstest]
    #[case::missing_input(&["ledger"])]
    #[case::invalid_strategy(&["ledger", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_threshold(&["ledger", "--low-balance-threshold", "lots", "input.csv"])]
    #[case::sub_cent_threshold(&["ledger", "--low-balance-threshold", "0.001", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}

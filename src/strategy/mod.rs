//! Processing strategies for CSV replays
//!
//! A strategy owns the whole pipeline: read ledger operations from CSV, apply
//! them through a fresh [`LedgerEngine`](crate::core::LedgerEngine), and write
//! the final balances. Strategies are selected at runtime.

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Complete replay pipeline
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the operations in `input_path` and write `username,balance` rows
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned: a missing or unreadable input file, a
    /// failed runtime start, or an output write failure. Malformed rows and
    /// rejected operations are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError>;
}

/// Create a processing strategy
///
/// `batch` is only used by the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: LedgerConfig,
    batch: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(config)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            config,
            batch.unwrap_or_default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case::sync_strategy(StrategyType::Sync)]
    #[case::async_strategy(StrategyType::Async)]
    fn test_created_strategies_agree(#[case] strategy_type: StrategyType) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"type,user,counterparty,amount\nopen,bob,,\nopen,alice,,\ndeposit,alice,,12.50\n",
        )
        .unwrap();

        let strategy = create_strategy(strategy_type, LedgerConfig::default(), None);
        let mut output = Vec::new();
        strategy.process(file.path(), &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "username,balance\nalice,12.50\nbob,0.00\n"
        );
    }
}

//! Synchronous processing strategy
//!
//! Single-threaded replay: [`SyncReader`] streams rows one at a time, each row
//! goes straight through the engine, and side effects are delivered inline
//! before the next row is read.

use crate::config::LedgerConfig;
use crate::core::clock::SystemClock;
use crate::core::dispatch::EffectDispatcher;
use crate::core::engine::LedgerEngine;
use crate::core::events::TracingEventPublisher;
use crate::core::inbox::NotificationInbox;
use crate::core::store::InMemoryLedgerStore;
use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ProcessingStrategy;
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Synchronous processing strategy
///
/// ```no_run
/// use banking_ledger::config::LedgerConfig;
/// use banking_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
/// strategy
///     .process(Path::new("operations.csv"), &mut std::io::stdout())
///     .expect("replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let engine = LedgerEngine::new(
            Arc::new(InMemoryLedgerStore::new()),
            EffectDispatcher::inline(
                Arc::new(NotificationInbox::new()),
                Arc::new(TracingEventPublisher),
            ),
            Arc::new(SystemClock),
            self.config.clone(),
        );

        let reader = SyncReader::new(input_path)?;

        let mut applied = 0usize;
        let mut skipped = 0usize;
        for result in reader {
            match result {
                Ok(operation) => match engine.process(&operation) {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        debug!(user = %operation.username, error = %e, "operation rejected");
                        skipped += 1;
                    }
                },
                Err(e) => {
                    warn!(error = %e, "skipping malformed record");
                    skipped += 1;
                }
            }
        }
        info!(applied, skipped, "replay finished");

        write_accounts_csv(&engine.list_accounts()?, output)
    }
}

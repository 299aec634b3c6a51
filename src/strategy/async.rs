//! Asynchronous batch processing strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (opens first, then per-user tasks)
//!     ├── LedgerEngine (thread-safe, per-account locks)
//!     └── side-effect worker (queued notifications and events)
//! ```
//!
//! Batches run one after another. Within a batch, users run in parallel on a
//! tokio multi-threaded runtime and each user's rows keep file order. The
//! side-effect queue is drained before balances are written.

use crate::config::LedgerConfig;
use crate::core::clock::SystemClock;
use crate::core::engine::LedgerEngine;
use crate::core::events::TracingEventPublisher;
use crate::core::inbox::NotificationInbox;
use crate::core::r#async::{spawn_effect_worker, BatchProcessor};
use crate::core::store::InMemoryLedgerStore;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::ProcessingStrategy;
use crate::types::LedgerError;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Worker threads for the tokio runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    ledger: LedgerConfig,
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(ledger: LedgerConfig, config: BatchConfig) -> Self {
        Self { ledger, config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let accounts = runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => LedgerError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => LedgerError::from(e),
                })?;

            let (effects, worker) = spawn_effect_worker(
                Arc::new(NotificationInbox::new()),
                Arc::new(TracingEventPublisher),
                self.ledger.effect_queue_capacity,
            );
            let engine = Arc::new(LedgerEngine::new(
                Arc::new(InMemoryLedgerStore::new()),
                effects,
                Arc::new(SystemClock),
                self.ledger.clone(),
            ));
            let processor = BatchProcessor::new(Arc::clone(&engine));

            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut applied = 0usize;
            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    match result.result {
                        Ok(()) => applied += 1,
                        Err(_) => rejected += 1,
                    }
                }
            }

            let accounts = engine.list_accounts();

            // The worker stops once the last dispatcher, owned by the engine, is gone.
            drop(processor);
            drop(engine);
            match worker.await {
                Ok(delivered) => info!(applied, rejected, delivered, "replay finished"),
                Err(e) => error!(error = %e, "side effect worker failed"),
            }

            accounts
        })?;

        write_accounts_csv(&accounts, output)
    }
}

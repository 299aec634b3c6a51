//! Batch processing of ledger operations
//!
//! This module provides the `BatchProcessor` which runs a batch of CSV operations
//! across tokio tasks.
//!
//! # Ordering
//!
//! - `open` rows of a batch run first, sequentially, in file order, so every
//!   account a batch refers to exists before any money moves.
//! - The remaining rows are partitioned by initiating user; each partition runs
//!   in its own task, in file order.
//! - Partitions run concurrently, so the relative order of two users' rows is not
//!   fixed. A transfer credits another user's account from the sender's
//!   partition; the engine's account locks keep every balance consistent.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::core::engine::LedgerEngine;
use crate::types::{LedgerError, LedgerOperation, OperationType};

/// Outcome of one operation in a batch
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub operation: LedgerOperation,
    pub result: Result<(), LedgerError>,
}

/// Runs batches of operations against a shared engine
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: Arc<LedgerEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    /// Split a batch into account openings and per-user operation lists
    ///
    /// Each list keeps file order.
    pub fn partition_by_user(
        &self,
        batch: Vec<LedgerOperation>,
    ) -> (Vec<LedgerOperation>, HashMap<String, Vec<LedgerOperation>>) {
        let mut opens = Vec::new();
        let mut user_batches: HashMap<String, Vec<LedgerOperation>> = HashMap::new();

        for operation in batch {
            if operation.op == OperationType::Open {
                opens.push(operation);
            } else {
                user_batches
                    .entry(operation.username.clone())
                    .or_default()
                    .push(operation);
            }
        }

        (opens, user_batches)
    }

    /// Run one user's operations in order
    pub fn process_user_operations(&self, operations: Vec<LedgerOperation>) -> Vec<ProcessingResult> {
        operations
            .into_iter()
            .map(|operation| {
                let result = self.engine.process(&operation);
                if let Err(e) = &result {
                    debug!(user = %operation.username, error = %e, "operation rejected");
                }
                ProcessingResult { operation, result }
            })
            .collect()
    }

    /// Run a whole batch and wait for every partition
    ///
    /// Results come back grouped: openings first, then one group per user.
    pub async fn process_batch(&self, batch: Vec<LedgerOperation>) -> Vec<ProcessingResult> {
        let (opens, user_batches) = self.partition_by_user(batch);

        let mut results = self.process_user_operations(opens);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, operations) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_operations(operations)
            }));
        }

        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = %e, "batch partition task failed"),
            }
        }

        results
    }
}

//! Asynchronous processing components
//!
//! This module provides the tokio-based pieces used by the async CLI strategy:
//!
//! - **effect_worker**: Background task delivering queued notifications and events
//! - **BatchProcessor**: Runs a batch of operations partitioned by user across tasks
//!
//! The ledger engine itself is synchronous and thread-safe; these components
//! only decide which thread calls it and where its side effects are delivered.

pub mod batch_processor;
pub mod effect_worker;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use effect_worker::spawn_effect_worker;

//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Store, notification sink and event publisher seams
//! - `store` - In-memory ledger store with atomic batch commits
//! - `locks` - Per-account and per-loan lock table
//! - `clock` - Time source
//! - `engine` - Deposits, withdrawals, transfers and transaction queries
//! - `amortization` - Fixed-payment repayment schedules
//! - `loans` - Loan application and review
//! - `analytics` - Spending summaries
//! - `dispatch` - Post-commit side effects
//! - `inbox` / `events` - Default notification sink and event publishers
//! - `async` - Tokio side-effect worker and batch processor

pub mod amortization;
pub mod analytics;
pub mod r#async;
pub mod clock;
pub mod dispatch;
pub mod engine;
pub mod events;
pub mod inbox;
pub mod loans;
pub mod locks;
pub mod store;
pub mod traits;

pub use analytics::AnalyticsAggregator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatch::{EffectDispatcher, SideEffect};
pub use engine::{LedgerEngine, LedgerReceipt, Reconciliation, TransferReceipt};
pub use events::{InMemoryEventLog, TracingEventPublisher};
pub use inbox::NotificationInbox;
pub use loans::LoanEngine;
pub use locks::LockTable;
pub use r#async::{spawn_effect_worker, BatchProcessor};
pub use store::InMemoryLedgerStore;
pub use traits::{EventPublisher, LedgerStore, NotificationSink, WriteBatch};

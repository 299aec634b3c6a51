//! Banking Ledger Library
//! # Overview
//!
//! Core of a small retail-banking backend: user accounts with exact decimal
//! balances, deposits, withdrawals and transfers with an append-only
//! transaction history, loan applications with fixed-payment amortization
//! schedules, and spending analytics. Successful operations raise
//! notifications and publish events after they commit.
//!
//! # Architecture
//!
//! - [`types`] - Domain types (Money, Account, Transaction, LoanApplication, errors)
//! - [`config`] - Ledger configuration
//! - [`core`] - Business logic:
//!   - [`core::engine`] - Deposits, withdrawals, transfers and history queries
//!   - [`core::loans`] - Loan application and review
//!   - [`core::amortization`] - Repayment schedules
//!   - [`core::analytics`] - Spending summaries
//!   - [`core::store`] - In-memory store with atomic batch commits
//!   - [`core::dispatch`] - Post-commit notifications and events
//! - [`io`] - CSV input and balance output
//! - [`strategy`] - Sync and async CSV replay pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Concurrency
//!
//! Every balance change runs under its account's lock; transfers lock both
//! accounts in ascending id order. The account updates and transaction records
//! of one operation are committed as a single batch, so a failure leaves no
//! partial state behind.

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::LedgerConfig;
pub use self::core::{AnalyticsAggregator, LedgerEngine, LedgerStore, LoanEngine};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, LedgerError, LoanApplication, LoanId, LoanStatus, Money, RepaymentEntry,
    Transaction, TransactionFilter, TransactionType,
};

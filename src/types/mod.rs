//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `money`: Exact decimal amounts
//! - `account`: Account-related types
//! - `transaction`: Transaction records, filters and CLI operations
//! - `loan`: Loan applications and repayment schedules
//! - `notification`: Notification records
//! - `event`: Events handed to the event publisher
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod event;
pub mod loan;
pub mod money;
pub mod notification;
pub mod transaction;

pub use account::{Account, AccountId};
pub use error::{DeliveryError, LedgerError, StoreError};
pub use event::LedgerEvent;
pub use loan::{
    LoanApplication, LoanApproval, LoanId, LoanRequest, LoanStatus, RepaymentEntry, RepaymentId,
};
pub use money::Money;
pub use notification::{Notification, NotificationId, NotificationKind, Priority};
pub use transaction::{
    LedgerOperation, OperationType, Transaction, TransactionFilter, TransactionId,
    TransactionKind, TransactionType,
};

//! Error types for the banking ledger
//!
//! This module defines every error a ledger operation can surface to its caller.
//! Errors carry enough context to explain a rejection without a second lookup.
//!
//! # Error Categories
//!
//! - **Business rejections**: invalid amount, insufficient funds, unknown recipient,
//!   unknown loan, loan not in the expected state. Nothing was written.
//! - **Storage failures**: the backing store failed mid-operation. Nothing was
//!   written either; the operation may be retried.
//! - **File I/O and CSV errors**: only raised by the replay CLI.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for ledger, loan and analytics operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero, negative, malformed or has sub-cent precision
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount {
        /// The offending amount as text
        amount: String,
        /// Why it was rejected
        reason: String,
    },

    /// Debit larger than the current balance
    ///
    /// The account is left untouched.
    #[error("Insufficient funds for '{username}': balance {balance}, requested {requested}")]
    InsufficientFunds {
        username: String,
        balance: Decimal,
        requested: Decimal,
    },

    /// Transfer recipient username does not exist
    #[error("Recipient '{username}' not found")]
    RecipientNotFound { username: String },

    /// Account referenced by id or username does not exist
    #[error("Account '{account}' not found")]
    AccountNotFound { account: String },

    /// Transfer where sender and recipient are the same account
    #[error("Cannot transfer from '{username}' to itself")]
    SameAccount { username: String },

    /// Username already registered
    #[error("Username '{username}' is already taken")]
    UsernameTaken { username: String },

    /// Username empty or containing whitespace or commas
    #[error("Invalid username '{username}'")]
    InvalidUsername { username: String },

    #[error("Loan {loan} not found")]
    LoanNotFound { loan: String },

    /// Loan is not in the state the operation requires
    #[error("Loan {loan} is {actual}, expected {expected}")]
    InvalidState {
        loan: String,
        expected: String,
        actual: String,
    },

    /// Loan term outside 1..=600 months
    #[error("Invalid loan term of {months} months")]
    InvalidTerm { months: u32 },

    /// Negative annual interest rate
    #[error("Invalid interest rate {rate}%")]
    InvalidRate { rate: Decimal },

    /// Balance or schedule arithmetic would overflow
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// Backing store failed; no partial write is visible
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    /// Input file not found (CLI)
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error while reading input or writing output (CLI)
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// Malformed CSV record (CLI)
    ///
    /// The record is skipped and processing continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        line: Option<u64>,
        message: String,
    },
}

/// Failure reported by a [`LedgerStore`](crate::core::LedgerStore) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Row was written by someone else since it was read
    #[error("version conflict on {entity} {id}")]
    Conflict { entity: &'static str, id: String },

    /// Write references a row that does not exist
    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: String },

    /// Unique key already present
    #[error("duplicate {entity} key {key}")]
    DuplicateKey { entity: &'static str, key: String },

    /// Store is unreachable or refused the write
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a notification sink or event publisher
///
/// Never propagated to the caller of a ledger operation; only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{target} delivery failed: {message}")]
pub struct DeliveryError {
    pub target: &'static str,
    pub message: String,
}

impl DeliveryError {
    pub fn new(target: &'static str, message: impl Into<String>) -> Self {
        DeliveryError {
            target,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: &str, reason: &str) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(username: &str, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            username: username.to_string(),
            balance,
            requested,
        }
    }

    /// Create a RecipientNotFound error
    pub fn recipient_not_found(username: &str) -> Self {
        LedgerError::RecipientNotFound {
            username: username.to_string(),
        }
    }

    /// Create an AccountNotFound error from anything displayable (id or username)
    pub fn account_not_found(account: impl ToString) -> Self {
        LedgerError::AccountNotFound {
            account: account.to_string(),
        }
    }

    /// Create a LoanNotFound error
    pub fn loan_not_found(loan: impl ToString) -> Self {
        LedgerError::LoanNotFound {
            loan: loan.to_string(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(loan: impl ToString, expected: impl ToString, actual: impl ToString) -> Self {
        LedgerError::InvalidState {
            loan: loan.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a ParseError without a line number
    pub fn parse(message: impl Into<String>) -> Self {
        LedgerError::ParseError {
            line: None,
            message: message.into(),
        }
    }

    /// `true` when the operation was refused by a business rule
    ///
    /// Storage, I/O and parse errors are not business rejections.
    pub fn is_business_rejection(&self) -> bool {
        !matches!(
            self,
            LedgerError::StorageFailure(_)
                | LedgerError::FileNotFound { .. }
                | LedgerError::IoError { .. }
                | LedgerError::ParseError { .. }
        )
    }
}

//! Transaction-related types
//!
//! This module defines ledger transaction records, the filters used to search
//! them, and the operation records replayed by the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::account::AccountId;
use super::money::Money;

/// Transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plain transaction category, used by filters and analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl TransactionType {
    /// Stable upper-case label (`DEPOSIT`, `TRANSFER_OUT`, ...)
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::TransferOut => "TRANSFER_OUT",
            TransactionType::TransferIn => "TRANSFER_IN",
        }
    }

    /// Whether this kind of transaction takes money out of the account
    pub fn is_debit(self) -> bool {
        matches!(self, TransactionType::Withdrawal | TransactionType::TransferOut)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a transaction did, including the counterparty for transfers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Funds credited from outside the ledger
    Deposit,

    /// Funds debited to outside the ledger
    Withdrawal,

    /// Sender side of a transfer, annotated with the recipient's username
    TransferOut { to: String },

    /// Recipient side of a transfer, annotated with the sender's username
    TransferIn { from: String },
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Deposit => TransactionType::Deposit,
            TransactionKind::Withdrawal => TransactionType::Withdrawal,
            TransactionKind::TransferOut { .. } => TransactionType::TransferOut,
            TransactionKind::TransferIn { .. } => TransactionType::TransferIn,
        }
    }

    /// Counterparty username for transfer kinds
    pub fn counterparty(&self) -> Option<&str> {
        match self {
            TransactionKind::TransferOut { to } => Some(to),
            TransactionKind::TransferIn { from } => Some(from),
            TransactionKind::Deposit | TransactionKind::Withdrawal => None,
        }
    }
}

/// Immutable ledger transaction record
///
/// Created only as a by-product of a ledger operation, never on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    /// Owning account
    pub account: AccountId,

    /// Always a positive magnitude; the direction comes from `kind`
    pub amount: Money,

    pub kind: TransactionKind,

    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        account: AccountId,
        amount: Money,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id: TransactionId::new(),
            account,
            amount,
            kind,
            timestamp,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.kind.transaction_type()
    }

    /// Amount signed by direction: credits positive, debits negative
    pub fn signed_amount(&self) -> Money {
        if self.transaction_type().is_debit() {
            -self.amount
        } else {
            self.amount
        }
    }
}

/// Conjunctive transaction search filter
///
/// Every bound is optional and inclusive; an absent bound matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn min_amount(mut self, amount: Money) -> Self {
        self.min_amount = Some(amount);
        self
    }

    pub fn max_amount(mut self, amount: Money) -> Self {
        self.max_amount = Some(amount);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.kind.is_none_or(|kind| tx.transaction_type() == kind)
            && self.min_amount.is_none_or(|min| tx.amount >= min)
            && self.max_amount.is_none_or(|max| tx.amount <= max)
            && self.from.is_none_or(|from| tx.timestamp >= from)
            && self.to.is_none_or(|to| tx.timestamp <= to)
    }
}

/// Operation types accepted by the replay CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Register a new account with a zero balance
    Open,

    Deposit,

    Withdrawal,

    /// Move funds from `username` to `counterparty`
    Transfer,
}

/// One ledger operation read from CSV
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerOperation {
    pub op: OperationType,

    /// Initiating user (the sender for transfers)
    pub username: String,

    /// Recipient username, required for transfers only
    pub counterparty: Option<String>,

    /// Required for deposits, withdrawals and transfers
    pub amount: Option<Money>,
}

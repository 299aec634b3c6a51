//! Collaborator traits consumed by the ledger core
//!
//! This module defines the seams between the engines and the outside world:
//! - [`LedgerStore`] - durable accounts, transactions, loans and schedules
//! - [`NotificationSink`] - account-holder alerts
//! - [`EventPublisher`] - best-effort notice of ledger mutations
//!
//! All three are object-safe so engines hold them as `Arc<dyn ...>`.

use crate::types::{
    Account, AccountId, DeliveryError, LoanApplication, LoanId, LoanStatus, NotificationKind,
    Priority, RepaymentEntry, StoreError, Transaction, TransactionFilter,
};

/// Set of writes committed as one unit
///
/// A store applies either every write in the batch or none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    /// Account snapshots to save
    ///
    /// Each snapshot carries the version it was read at; the store rejects the
    /// batch with [`StoreError::Conflict`] if the stored version has moved on.
    pub accounts: Vec<Account>,

    /// Transactions to append
    pub transactions: Vec<Transaction>,

    /// Loans to insert or replace
    pub loans: Vec<LoanApplication>,

    /// Complete repayment schedules to insert, one per loan
    pub schedules: Vec<(LoanId, Vec<RepaymentEntry>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn save_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    pub fn save_loan(mut self, loan: LoanApplication) -> Self {
        self.loans.push(loan);
        self
    }

    pub fn save_schedule(mut self, loan: LoanId, schedule: Vec<RepaymentEntry>) -> Self {
        self.schedules.push((loan, schedule));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.transactions.is_empty()
            && self.loans.is_empty()
            && self.schedules.is_empty()
    }
}

/// Durable persistence for the ledger
///
/// Reads return value snapshots. Every write goes through [`LedgerStore::commit`]
/// (plus [`LedgerStore::create_account`] for registration).
pub trait LedgerStore: Send + Sync {
    /// Insert a new account
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the username is taken.
    fn create_account(&self, account: Account) -> Result<Account, StoreError>;

    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Transactions of `account` matching `filter`, in the order they were committed
    fn find_transactions(
        &self,
        account: AccountId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError>;

    fn get_loan(&self, id: LoanId) -> Result<Option<LoanApplication>, StoreError>;

    fn find_loans_by_applicant(
        &self,
        applicant: AccountId,
    ) -> Result<Vec<LoanApplication>, StoreError>;

    fn find_loans_by_status(&self, status: LoanStatus) -> Result<Vec<LoanApplication>, StoreError>;

    /// Repayment schedule of `loan`, ordered by installment; empty if none
    fn find_repayment_schedule(&self, loan: LoanId) -> Result<Vec<RepaymentEntry>, StoreError>;

    /// Apply every write in `batch` atomically
    ///
    /// # Returns
    ///
    /// The saved account snapshots with their new versions, in batch order
    fn commit(&self, batch: WriteBatch) -> Result<Vec<Account>, StoreError>;
}

/// Receiver of account-holder notifications
pub trait NotificationSink: Send + Sync {
    fn notify(
        &self,
        account: AccountId,
        message: &str,
        kind: NotificationKind,
        priority: Priority,
    ) -> Result<(), DeliveryError>;
}

/// Receiver of ledger events
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: &str, message: &str) -> Result<(), DeliveryError>;
}

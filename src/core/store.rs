//! In-memory ledger store
//!
//! [`InMemoryLedgerStore`] implements [`LedgerStore`] on top of `DashMap` tables.
//!
//! # Atomicity
//!
//! A commit validates the whole [`WriteBatch`] before touching any table, then
//! applies it while holding the write side of a commit gate. Readers hold the
//! read side, so they see a batch either completely or not at all.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::core::traits::{LedgerStore, WriteBatch};
use crate::types::{
    Account, AccountId, LoanApplication, LoanId, LoanStatus, RepaymentEntry, StoreError,
    Transaction, TransactionFilter,
};

/// Thread-safe in-memory implementation of [`LedgerStore`]
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    gate: RwLock<()>,
    accounts: DashMap<AccountId, Account>,
    usernames: DashMap<String, AccountId>,

    /// Per-account transaction log in commit order
    transactions: DashMap<AccountId, Vec<Transaction>>,

    /// Loans keyed by id, with their insertion sequence
    loans: DashMap<LoanId, (u64, LoanApplication)>,
    schedules: DashMap<LoanId, Vec<RepaymentEntry>>,
    loan_seq: AtomicU64,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject the batch if any write would fail
    fn validate(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for account in &batch.accounts {
            let stored = self.accounts.get(&account.id).ok_or_else(|| StoreError::Missing {
                entity: "account",
                id: account.id.to_string(),
            })?;
            if stored.version != account.version || !seen.insert(account.id) {
                return Err(StoreError::Conflict {
                    entity: "account",
                    id: account.id.to_string(),
                });
            }
        }

        for tx in &batch.transactions {
            if !self.accounts.contains_key(&tx.account) {
                return Err(StoreError::Missing {
                    entity: "account",
                    id: tx.account.to_string(),
                });
            }
        }

        for loan in &batch.loans {
            if !self.accounts.contains_key(&loan.applicant) {
                return Err(StoreError::Missing {
                    entity: "account",
                    id: loan.applicant.to_string(),
                });
            }
        }

        let mut scheduled = HashSet::new();
        for (loan, _) in &batch.schedules {
            if self.schedules.contains_key(loan) || !scheduled.insert(*loan) {
                return Err(StoreError::DuplicateKey {
                    entity: "repayment schedule",
                    key: loan.to_string(),
                });
            }
            let known = self.loans.contains_key(loan) || batch.loans.iter().any(|l| l.id == *loan);
            if !known {
                return Err(StoreError::Missing {
                    entity: "loan",
                    id: loan.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn create_account(&self, account: Account) -> Result<Account, StoreError> {
        let _gate = self.write_gate();
        if self.usernames.contains_key(&account.username) {
            return Err(StoreError::DuplicateKey {
                entity: "username",
                key: account.username,
            });
        }
        self.usernames.insert(account.username.clone(), account.id);
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let _gate = self.read_gate();
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let _gate = self.read_gate();
        let id = match self.usernames.get(username) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let _gate = self.read_gate();
        let mut accounts: Vec<Account> = self.accounts.iter().map(|a| a.value().clone()).collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    fn find_transactions(
        &self,
        account: AccountId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let _gate = self.read_gate();
        Ok(self
            .transactions
            .get(&account)
            .map(|log| log.iter().filter(|tx| filter.matches(tx)).cloned().collect())
            .unwrap_or_default())
    }

    fn get_loan(&self, id: LoanId) -> Result<Option<LoanApplication>, StoreError> {
        let _gate = self.read_gate();
        Ok(self.loans.get(&id).map(|entry| entry.1.clone()))
    }

    fn find_loans_by_applicant(
        &self,
        applicant: AccountId,
    ) -> Result<Vec<LoanApplication>, StoreError> {
        let _gate = self.read_gate();
        let mut loans: Vec<(u64, LoanApplication)> = self
            .loans
            .iter()
            .filter(|entry| entry.1.applicant == applicant)
            .map(|entry| entry.value().clone())
            .collect();
        loans.sort_by_key(|(seq, _)| *seq);
        Ok(loans.into_iter().map(|(_, loan)| loan).collect())
    }

    fn find_loans_by_status(&self, status: LoanStatus) -> Result<Vec<LoanApplication>, StoreError> {
        let _gate = self.read_gate();
        let mut loans: Vec<(u64, LoanApplication)> = self
            .loans
            .iter()
            .filter(|entry| entry.1.status == status)
            .map(|entry| entry.value().clone())
            .collect();
        loans.sort_by_key(|(seq, _)| *seq);
        Ok(loans.into_iter().map(|(_, loan)| loan).collect())
    }

    fn find_repayment_schedule(&self, loan: LoanId) -> Result<Vec<RepaymentEntry>, StoreError> {
        let _gate = self.read_gate();
        Ok(self
            .schedules
            .get(&loan)
            .map(|s| s.clone())
            .unwrap_or_default())
    }

    fn commit(&self, batch: WriteBatch) -> Result<Vec<Account>, StoreError> {
        let _gate = self.write_gate();
        self.validate(&batch)?;

        let mut saved = Vec::with_capacity(batch.accounts.len());
        for mut account in batch.accounts {
            account.version += 1;
            self.accounts.insert(account.id, account.clone());
            saved.push(account);
        }

        for tx in batch.transactions {
            self.transactions.entry(tx.account).or_default().push(tx);
        }

        for loan in batch.loans {
            match self.loans.get_mut(&loan.id) {
                Some(mut entry) => entry.1 = loan,
                None => {
                    let seq = self.loan_seq.fetch_add(1, Ordering::Relaxed);
                    self.loans.insert(loan.id, (seq, loan));
                }
            }
        }

        for (loan, mut schedule) in batch.schedules {
            schedule.sort_by_key(|entry| entry.installment);
            self.schedules.insert(loan, schedule);
        }

        debug!(accounts = saved.len(), "batch committed");
        Ok(saved)
    }
}

//! Spending analytics over transaction history
//!
//! Spending means money leaving the account: WITHDRAWAL and TRANSFER_OUT
//! transactions. Deposits and incoming transfers are ignored. Read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::traits::LedgerStore;
use crate::types::{AccountId, LedgerError, Money, Transaction, TransactionFilter};

/// Derives monthly and per-category spending summaries
pub struct AnalyticsAggregator {
    store: Arc<dyn LedgerStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        AnalyticsAggregator { store }
    }

    /// Spending per calendar month, keyed `YYYY-MM`
    ///
    /// An account with no spending yields an empty map.
    pub fn monthly_spending(&self, account: AccountId) -> Result<BTreeMap<String, Money>, LedgerError> {
        Ok(sum_by(self.spending(account)?, |tx| {
            tx.timestamp.format("%Y-%m").to_string()
        }))
    }

    /// Spending per transaction type label (`WITHDRAWAL`, `TRANSFER_OUT`)
    pub fn spending_by_category(
        &self,
        account: AccountId,
    ) -> Result<BTreeMap<String, Money>, LedgerError> {
        Ok(sum_by(self.spending(account)?, |tx| {
            tx.transaction_type().label().to_string()
        }))
    }

    fn spending(&self, account: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        let history = self
            .store
            .find_transactions(account, &TransactionFilter::default())?;
        Ok(history
            .into_iter()
            .filter(|tx| tx.transaction_type().is_debit())
            .collect())
    }
}

fn sum_by(
    transactions: Vec<Transaction>,
    key: impl Fn(&Transaction) -> String,
) -> BTreeMap<String, Money> {
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for tx in &transactions {
        let total = totals.entry(key(tx)).or_default();
        *total = *total + tx.amount;
    }
    totals
}

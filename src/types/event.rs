//! Ledger events handed to the event publisher
//!
//! Events are serialized to JSON and published as the message body; the
//! `event` field names the variant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::loan::LoanId;
use super::money::Money;
use super::transaction::TransactionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposit {
        account: AccountId,
        username: String,
        transaction: TransactionId,
        amount: Money,
        balance: Money,
        at: DateTime<Utc>,
    },
    Withdrawal {
        account: AccountId,
        username: String,
        transaction: TransactionId,
        amount: Money,
        balance: Money,
        at: DateTime<Utc>,
    },
    Transfer {
        sender: String,
        recipient: String,
        amount: Money,
        at: DateTime<Utc>,
    },
    LoanApplied {
        loan: LoanId,
        applicant: AccountId,
        amount: Money,
        term_months: u32,
    },
    LoanApproved {
        loan: LoanId,
        approved_by: String,
        interest_rate: Decimal,
        monthly_payment: Money,
    },
    LoanRejected {
        loan: LoanId,
        reviewed_by: String,
    },
}

impl LedgerEvent {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Deposit { .. } => "deposit",
            LedgerEvent::Withdrawal { .. } => "withdrawal",
            LedgerEvent::Transfer { .. } => "transfer",
            LedgerEvent::LoanApplied { .. } => "loan_applied",
            LedgerEvent::LoanApproved { .. } => "loan_approved",
            LedgerEvent::LoanRejected { .. } => "loan_rejected",
        }
    }

    /// JSON message body
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

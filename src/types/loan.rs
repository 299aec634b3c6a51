//! Loan-related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::account::AccountId;
use super::money::Money;

/// Loan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        LoanId(Uuid::new_v4())
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Repayment entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepaymentId(Uuid);

impl RepaymentId {
    pub fn new() -> Self {
        RepaymentId(Uuid::new_v4())
    }
}

impl Default for RepaymentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Loan lifecycle state
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LoanStatus::Pending)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
        })
    }
}

/// Input for a new loan application
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub applicant: AccountId,
    pub amount: Money,
    pub term_months: u32,
    pub purpose: String,

    /// Reference to an uploaded supporting document, stored elsewhere
    pub document: Option<String>,
}

/// A loan application and its review outcome
///
/// The repayment schedule is not embedded; entries reference the loan by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: LoanId,
    pub applicant: AccountId,
    pub amount: Money,
    pub term_months: u32,
    pub purpose: String,
    pub status: LoanStatus,
    pub applied_at: DateTime<Utc>,

    /// Set only on approval
    pub approved_by: Option<String>,

    /// Annual percentage rate, set only on approval
    pub interest_rate: Option<Decimal>,

    pub notes: Option<String>,
    pub document: Option<String>,

    /// When the application left `Pending`
    pub decided_at: Option<DateTime<Utc>>,
}

impl LoanApplication {
    /// Create a pending application from a request
    pub fn new(request: LoanRequest, applied_at: DateTime<Utc>) -> Self {
        LoanApplication {
            id: LoanId::new(),
            applicant: request.applicant,
            amount: request.amount,
            term_months: request.term_months,
            purpose: request.purpose,
            status: LoanStatus::Pending,
            applied_at,
            approved_by: None,
            interest_rate: None,
            notes: None,
            document: request.document,
            decided_at: None,
        }
    }
}

/// One month of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentEntry {
    pub id: RepaymentId,
    pub loan: LoanId,

    /// 1-based position in the schedule
    pub installment: u32,

    pub due_date: NaiveDate,
    pub principal: Money,
    pub interest: Money,

    /// Outstanding principal after this installment
    pub remaining_balance: Money,

    pub paid: bool,
}

impl RepaymentEntry {
    /// Total amount due for this installment
    pub fn payment(&self) -> Money {
        self.principal + self.interest
    }
}

/// Result of approving a loan
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApproval {
    pub loan: LoanApplication,
    pub schedule: Vec<RepaymentEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_application_is_pending() {
        let applicant = AccountId::new();
        let loan = LoanApplication::new(
            LoanRequest {
                applicant,
                amount: Money::from_cents(1_200_000),
                term_months: 12,
                purpose: "car".to_string(),
                document: Some("docs/payslip.pdf".to_string()),
            },
            Utc::now(),
        );
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.applicant, applicant);
        assert!(loan.approved_by.is_none());
        assert!(loan.interest_rate.is_none());
        assert!(loan.decided_at.is_none());
        assert_eq!(loan.document.as_deref(), Some("docs/payslip.pdf"));
    }

    #[rstest]
    #[case(LoanStatus::Pending, false)]
    #[case(LoanStatus::Approved, true)]
    #[case(LoanStatus::Rejected, true)]
    fn test_terminal_states(#[case] status: LoanStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn test_status_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&LoanStatus::Approved).unwrap(), "\"APPROVED\"");
        assert_eq!(LoanStatus::Rejected.to_string(), "REJECTED");
    }
}

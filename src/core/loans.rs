//! Loan lifecycle engine
//!
//! Loans start `PENDING` and move once, to `APPROVED` (with a generated
//! repayment schedule) or `REJECTED`. Both transitions run under a per-loan
//! lock and commit the loan together with its schedule.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::LedgerConfig;
use crate::core::amortization::{build_schedule, monthly_payment, validate_term};
use crate::core::clock::Clock;
use crate::core::dispatch::{EffectDispatcher, SideEffect};
use crate::core::engine::event_effect;
use crate::core::locks::LockTable;
use crate::core::traits::{LedgerStore, WriteBatch};
use crate::types::{
    AccountId, LedgerError, LedgerEvent, LoanApplication, LoanApproval, LoanId, LoanRequest,
    LoanStatus, Money, NotificationKind, Priority, RepaymentEntry, StoreError,
};

/// Loan application, review and schedule engine
pub struct LoanEngine {
    store: Arc<dyn LedgerStore>,
    effects: EffectDispatcher,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    locks: LockTable<LoanId>,
}

impl LoanEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        effects: EffectDispatcher,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        LoanEngine {
            store,
            effects,
            clock,
            config,
            locks: LockTable::new(),
        }
    }

    /// Submit a new loan application
    ///
    /// # Returns
    ///
    /// The stored application, status `PENDING`, without rate or schedule
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the applicant does not exist
    /// - `InvalidAmount` if the amount is not strictly positive
    /// - `InvalidTerm` if the term is outside `1..=600` months
    pub fn apply(&self, request: LoanRequest) -> Result<LoanApplication, LedgerError> {
        self.require_account(request.applicant)?;
        if !request.amount.is_positive() {
            return Err(LedgerError::invalid_amount(
                &request.amount.to_string(),
                "loan amount must be greater than zero",
            ));
        }
        validate_term(request.term_months)?;

        let loan = LoanApplication::new(request, self.clock.now());
        self.commit("apply_loan", WriteBatch::new().save_loan(loan.clone()))?;

        info!(loan = %loan.id, applicant = %loan.applicant, amount = %loan.amount, "loan application received");
        self.effects.dispatch_all(event_effect(
            &self.config.event_topic,
            &LedgerEvent::LoanApplied {
                loan: loan.id,
                applicant: loan.applicant,
                amount: loan.amount,
                term_months: loan.term_months,
            },
        ));
        Ok(loan)
    }

    /// Approve a pending loan and generate its repayment schedule
    ///
    /// The schedule starts from today's date on the engine clock; the loan
    /// update and the schedule are committed together.
    ///
    /// # Arguments
    ///
    /// * `id` - Loan to approve
    /// * `approver` - Identity of the reviewing officer
    /// * `annual_rate_percent` - Agreed annual interest rate, e.g. `6` for 6%
    /// * `notes` - Free-text review notes
    ///
    /// # Errors
    ///
    /// - `LoanNotFound` if the loan does not exist
    /// - `InvalidState` if the loan is not `PENDING`
    /// - `InvalidRate` if the rate is negative
    /// - `StorageFailure` if the commit fails; the loan stays `PENDING`
    pub fn approve(
        &self,
        id: LoanId,
        approver: &str,
        annual_rate_percent: Decimal,
        notes: Option<String>,
    ) -> Result<LoanApproval, LedgerError> {
        let (approval, payment) = self.locks.with_lock(id, || -> Result<_, LedgerError> {
            let mut loan = self.pending(id)?;
            let schedule = build_schedule(
                id,
                loan.amount,
                annual_rate_percent,
                loan.term_months,
                self.clock.today(),
            )?;
            let payment = monthly_payment(loan.amount, annual_rate_percent, loan.term_months)?;

            loan.status = LoanStatus::Approved;
            loan.approved_by = Some(approver.to_string());
            loan.interest_rate = Some(annual_rate_percent);
            loan.notes = notes;
            loan.decided_at = Some(self.clock.now());

            self.commit(
                "approve_loan",
                WriteBatch::new()
                    .save_loan(loan.clone())
                    .save_schedule(id, schedule.clone()),
            )?;
            Ok((LoanApproval { loan, schedule }, Money::round(payment)))
        })?;

        info!(
            loan = %id,
            approver,
            rate = %annual_rate_percent,
            installments = approval.schedule.len(),
            "loan approved"
        );
        let mut effects: Vec<SideEffect> = event_effect(
            &self.config.event_topic,
            &LedgerEvent::LoanApproved {
                loan: id,
                approved_by: approver.to_string(),
                interest_rate: annual_rate_percent,
                monthly_payment: payment,
            },
        )
        .into_iter()
        .collect();
        effects.push(SideEffect::Notify {
            account: approval.loan.applicant,
            message: format!(
                "Your loan of ${} was approved at {}% ({} monthly payments of ${})",
                approval.loan.amount,
                annual_rate_percent.normalize(),
                approval.loan.term_months,
                payment
            ),
            kind: NotificationKind::Account,
            priority: Priority::Medium,
        });
        self.effects.dispatch_all(effects);
        Ok(approval)
    }

    /// Reject a pending loan
    ///
    /// No schedule is generated and no approver is recorded.
    ///
    /// # Errors
    ///
    /// - `LoanNotFound` if the loan does not exist
    /// - `InvalidState` if the loan is not `PENDING`
    pub fn reject(
        &self,
        id: LoanId,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<LoanApplication, LedgerError> {
        let loan = self.locks.with_lock(id, || -> Result<_, LedgerError> {
            let mut loan = self.pending(id)?;
            loan.status = LoanStatus::Rejected;
            loan.notes = notes;
            loan.decided_at = Some(self.clock.now());
            self.commit("reject_loan", WriteBatch::new().save_loan(loan.clone()))?;
            Ok(loan)
        })?;

        info!(loan = %id, reviewer, "loan rejected");
        let mut effects: Vec<SideEffect> = event_effect(
            &self.config.event_topic,
            &LedgerEvent::LoanRejected {
                loan: id,
                reviewed_by: reviewer.to_string(),
            },
        )
        .into_iter()
        .collect();
        effects.push(SideEffect::Notify {
            account: loan.applicant,
            message: format!("Your loan application for ${} was declined", loan.amount),
            kind: NotificationKind::Account,
            priority: Priority::Medium,
        });
        self.effects.dispatch_all(effects);
        Ok(loan)
    }

    pub fn get_loan(&self, id: LoanId) -> Result<LoanApplication, LedgerError> {
        self.store
            .get_loan(id)
            .map_err(|e| storage_failure("get_loan", e))?
            .ok_or_else(|| LedgerError::loan_not_found(id))
    }

    /// Every loan of an applicant, any status, in application order
    pub fn loans_by_user(&self, applicant: AccountId) -> Result<Vec<LoanApplication>, LedgerError> {
        self.require_account(applicant)?;
        self.store
            .find_loans_by_applicant(applicant)
            .map_err(|e| storage_failure("find_loans_by_applicant", e))
    }

    /// Loans awaiting review
    pub fn pending_loans(&self) -> Result<Vec<LoanApplication>, LedgerError> {
        self.store
            .find_loans_by_status(LoanStatus::Pending)
            .map_err(|e| storage_failure("find_loans_by_status", e))
    }

    /// Stored schedule of a loan, ordered by installment
    ///
    /// Empty for loans that were never approved.
    pub fn repayment_schedule(&self, id: LoanId) -> Result<Vec<RepaymentEntry>, LedgerError> {
        self.get_loan(id)?;
        self.store
            .find_repayment_schedule(id)
            .map_err(|e| storage_failure("find_repayment_schedule", e))
    }

    fn pending(&self, id: LoanId) -> Result<LoanApplication, LedgerError> {
        let loan = self.get_loan(id)?;
        if loan.status != LoanStatus::Pending {
            warn!(loan = %id, status = %loan.status, "loan review rejected: not pending");
            return Err(LedgerError::invalid_state(
                id,
                LoanStatus::Pending,
                loan.status,
            ));
        }
        Ok(loan)
    }

    fn require_account(&self, id: AccountId) -> Result<(), LedgerError> {
        match self.store.get_account(id) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(LedgerError::account_not_found(id)),
            Err(e) => Err(storage_failure("get_account", e)),
        }
    }

    fn commit(&self, operation: &str, batch: WriteBatch) -> Result<(), LedgerError> {
        self.store
            .commit(batch)
            .map(|_| ())
            .map_err(|e| storage_failure(operation, e))
    }
}

impl std::fmt::Debug for LoanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanEngine")
            .field("config", &self.config)
            .finish()
    }
}

fn storage_failure(operation: &str, e: StoreError) -> LedgerError {
    error!(operation, error = %e, "storage failure");
    LedgerError::StorageFailure(e)
}

//! Fixed-payment amortization schedules
//!
//! Standard reducing-balance amortization: every installment pays the same
//! amount, split into interest on the outstanding principal and a principal
//! portion that grows over the term.
//!
//! Payment formula, with monthly rate `r`, term `n` and `g = (1 + r)^n`:
//!
//! ```text
//! payment = P * r * g / (g - 1)
//! ```
//!
//! A zero rate degenerates to `payment = P / n`.
//!
//! # Precision
//!
//! Intermediate values keep full `Decimal` precision (28 significant digits).
//! Each stored remaining balance is the exact balance rounded to cents, and the
//! last one is zero. A stored principal portion is the difference between two
//! consecutive stored balances, so the portions add up to the loan amount
//! exactly and no balance is off by more than half a cent.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};

use crate::types::{LedgerError, LoanId, Money, RepaymentEntry, RepaymentId};

/// Longest accepted loan term (50 years)
pub const MAX_TERM_MONTHS: u32 = 600;

/// Check a loan term is within `1..=MAX_TERM_MONTHS`
pub fn validate_term(term_months: u32) -> Result<(), LedgerError> {
    if (1..=MAX_TERM_MONTHS).contains(&term_months) {
        Ok(())
    } else {
        Err(LedgerError::InvalidTerm {
            months: term_months,
        })
    }
}

/// Monthly rate from an annual percentage (`6` -> `0.005`)
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(12)
}

/// Unrounded fixed monthly payment
///
/// # Errors
///
/// - `InvalidAmount` if `principal` is not strictly positive
/// - `InvalidRate` if the rate is negative
/// - `InvalidTerm` if the term is outside `1..=600`
/// - `ArithmeticOverflow` if the compounding factor does not fit a `Decimal`
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Result<Decimal, LedgerError> {
    if !principal.is_positive() {
        return Err(LedgerError::invalid_amount(
            &principal.to_string(),
            "loan amount must be greater than zero",
        ));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(LedgerError::InvalidRate {
            rate: annual_rate_percent,
        });
    }
    validate_term(term_months)?;

    let p = principal.amount();
    let n = Decimal::from(term_months);
    let r = monthly_rate(annual_rate_percent);
    if r.is_zero() {
        return Ok(p / n);
    }

    let overflow = || LedgerError::arithmetic_overflow("amortization");
    let g = (Decimal::ONE + r)
        .checked_powu(u64::from(term_months))
        .ok_or_else(overflow)?;
    // g / (g - 1) stays close to 1, keeping P * r * factor in range
    let factor = g.checked_div(g - Decimal::ONE).ok_or_else(overflow)?;
    p.checked_mul(r)
        .and_then(|pr| pr.checked_mul(factor))
        .ok_or_else(overflow)
}

/// Build the repayment schedule of a loan
///
/// Installment `i` is due `i` months after `start`. Day-of-month overflow clamps
/// to the last day of the month (Jan 31 -> Feb 28).
///
/// # Arguments
///
/// * `loan` - Loan the entries belong to
/// * `principal` - Loan amount
/// * `annual_rate_percent` - Annual interest rate in percent
/// * `term_months` - Number of monthly installments
/// * `start` - Approval date
///
/// # Errors
///
/// Same as [`monthly_payment`], plus `ArithmeticOverflow` if a due date falls
/// outside the calendar range.
pub fn build_schedule(
    loan: LoanId,
    principal: Money,
    annual_rate_percent: Decimal,
    term_months: u32,
    start: NaiveDate,
) -> Result<Vec<RepaymentEntry>, LedgerError> {
    let payment = monthly_payment(principal, annual_rate_percent, term_months)?;
    let r = monthly_rate(annual_rate_percent);

    let mut remaining = principal.amount();
    let mut previous = principal;
    let mut schedule = Vec::with_capacity(term_months as usize);

    for installment in 1..=term_months {
        let interest = remaining * r;
        remaining -= payment - interest;

        let stored_remaining = if installment == term_months {
            Money::ZERO
        } else {
            Money::round(remaining)
        };
        let stored_principal = previous - stored_remaining;
        previous = stored_remaining;

        let due_date = start
            .checked_add_months(Months::new(installment))
            .ok_or_else(|| LedgerError::arithmetic_overflow("due date"))?;

        schedule.push(RepaymentEntry {
            id: RepaymentId::new(),
            loan,
            installment,
            due_date,
            principal: stored_principal,
            interest: Money::round(interest),
            remaining_balance: stored_remaining,
            paid: false,
        });
    }

    Ok(schedule)
}

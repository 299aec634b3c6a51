//! Exact monetary amounts
//!
//! [`Money`] wraps a [`rust_decimal::Decimal`] and is the only type the ledger
//! uses for balances, transaction amounts and loan figures. Stored amounts carry
//! two decimal places; intermediate loan arithmetic works on raw `Decimal`s and
//! rounds back into `Money` with [`Money::round`].

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Number of decimal places kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Signed amount of money with two decimal places.
///
/// Ledger amounts (deposits, withdrawals, transfers) are always positive; the
/// sign only shows up in derived values such as [`Transaction::signed_amount`].
///
/// # Examples
///
/// ```rust
/// use banking_ledger::Money;
///
/// let amount: Money = "12.5".parse().unwrap();
/// assert_eq!(amount, Money::from_cents(1250));
/// assert_eq!(amount.to_string(), "12.50");
/// assert!("12.345".parse::<Money>().is_err());
/// ```
///
/// [`Transaction::signed_amount`]: crate::types::Transaction::signed_amount
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount from integer cents.
    pub const fn from_cents(cents: i64) -> Self {
        let abs = cents.unsigned_abs();
        Money(Decimal::from_parts(
            abs as u32,
            (abs >> 32) as u32,
            0,
            cents < 0,
            MONEY_SCALE,
        ))
    }

    /// Wraps an exact decimal, rejecting values with sub-cent precision.
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value.normalize().scale() > MONEY_SCALE {
            return Err(LedgerError::invalid_amount(
                &value.to_string(),
                "more than two decimal places",
            ));
        }
        let mut value = value;
        value.rescale(MONEY_SCALE);
        Ok(Money(value))
    }

    /// Rounds an arbitrary-precision value to cents (half away from zero).
    ///
    /// A value that rounds to zero becomes [`Money::ZERO`], so a tiny negative
    /// residue never renders as `-0.00`.
    pub fn round(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            return Money::ZERO;
        }
        rounded.rescale(MONEY_SCALE);
        Money(rounded)
    }

    /// Returns the underlying decimal value.
    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// `true` for strictly positive amounts.
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Checked addition (returns `None` on overflow).
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| LedgerError::invalid_amount(trimmed, "not a decimal number"))?;
        Money::new(value)
    }
}

impl TryFrom<String> for Money {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::integer("10", 1000)]
    #[case::one_decimal("10.5", 1050)]
    #[case::two_decimals("10.55", 1055)]
    #[case::trailing_zeros("10.500", 1050)]
    #[case::whitespace("  7.25 ", 725)]
    #[case::negative("-3.10", -310)]
    fn test_parse_valid(#[case] input: &str, #[case] cents: i64) {
        assert_eq!(input.parse::<Money>().unwrap(), Money::from_cents(cents));
    }

    #[rstest]
    #[case::too_precise("12.345")]
    #[case::text("twelve")]
    #[case::empty("")]
    fn test_parse_invalid(#[case] input: &str) {
        let err = input.parse::<Money>().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }

    #[rstest]
    #[case(Money::from_cents(30000), "300.00")]
    #[case(Money::from_cents(5), "0.05")]
    #[case(Money::from_cents(-1999), "-19.99")]
    #[case(Money::ZERO, "0.00")]
    fn test_display_always_two_decimals(#[case] money: Money, #[case] expected: &str) {
        assert_eq!(money.to_string(), expected);
    }

    #[rstest]
    #[case::half_up(Decimal::new(10005, 3), Money::from_cents(1001))]
    #[case::down(Decimal::new(100049, 4), Money::from_cents(1000))]
    #[case::negative_half(Decimal::new(-10005, 3), Money::from_cents(-1001))]
    fn test_round(#[case] value: Decimal, #[case] expected: Money) {
        assert_eq!(Money::round(value), expected);
    }

    #[test]
    fn test_round_tiny_negative_residue_is_plain_zero() {
        let residue = Decimal::new(-3, 20);
        let rounded = Money::round(residue);
        assert_eq!(rounded, Money::ZERO);
        assert_eq!(rounded.to_string(), "0.00");
        assert!(!rounded.is_negative());
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(15000);
        let b = Money::from_cents(7000);
        assert_eq!(a.checked_sub(b), Some(Money::from_cents(8000)));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(22000)));
        assert_eq!(Money(Decimal::MAX).checked_add(Money::from_cents(100)), None);
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Money::from_cents(1).is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(Money::ZERO.is_zero());
        assert!(Money::from_cents(-1).is_negative());
    }

    const THRESHOLD: Money = Money::from_cents(10_000);

    #[rstest]
    #[case::positive(1_250, "12.50")]
    #[case::negative(-500, "-5.00")]
    #[case::zero(0, "0.00")]
    #[case::above_u32(4_294_967_296, "42949672.96")]
    #[case::max(i64::MAX, "92233720368547758.07")]
    #[case::min(i64::MIN, "-92233720368547758.08")]
    fn test_from_cents(#[case] cents: i64, #[case] expected: &str) {
        let money = Money::from_cents(cents);
        assert_eq!(money.to_string(), expected);
        assert_eq!(money.amount(), Decimal::new(cents, MONEY_SCALE));
    }

    #[test]
    fn test_from_cents_in_const_context() {
        assert_eq!(THRESHOLD, "100".parse::<Money>().unwrap());
        assert_eq!(crate::config::DEFAULT_LOW_BALANCE_THRESHOLD, THRESHOLD);
    }

    #[test]
    fn test_sum() {
        let total: Money = [125, 250, 625].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(1000));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_cents(4250)).unwrap();
        assert_eq!(json, "\"42.50\"");
        let back: Money = serde_json::from_str("\"42.5\"").unwrap();
        assert_eq!(back, Money::from_cents(4250));
    }
}

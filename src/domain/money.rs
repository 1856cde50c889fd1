//! Fixed-point currency backed by rust_decimal.
//!
//! Stored as canonical strings in TEXT columns and serialized as JSON strings,
//! so balances never pass through floating point.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits kept for currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(Decimal);

impl Money {
    pub fn new(value: Decimal) -> Self {
        Money(value)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Parse a Money from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(s.trim()).map(Money)
    }

    /// Canonical string with trailing zeros removed and no exponent.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Round to whole cents, midpoint away from zero.
    pub fn round_cents(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by a plain decimal factor (hours, refund rate) and round to
    /// cents. `None` when the product leaves the decimal range.
    pub fn checked_scale_by(&self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(|v| Money(v).round_cents())
    }

    pub fn checked_add(&self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_strips_trailing_zeros() {
        let m = Money::from_str_canonical("150000.00").unwrap();
        assert_eq!(m.to_canonical_string(), "150000");
        assert!(!Money::from_cents(12345).to_canonical_string().contains('e'));
        assert_eq!(Money::from_cents(12345).to_string(), "123.45");
    }

    #[test]
    fn test_checked_scale_by_rounds_to_cents() {
        let hourly = Money::from_str_canonical("100").unwrap();
        // 50 minutes
        let hours = Decimal::new(50, 0) / Decimal::new(60, 0);
        assert_eq!(hourly.checked_scale_by(hours).unwrap().to_string(), "83.33");

        let price = Money::from_str_canonical("0.05").unwrap();
        assert_eq!(
            price.checked_scale_by(Decimal::new(5, 1)).unwrap().to_string(),
            "0.03"
        );
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.checked_scale_by(Decimal::TWO), None);
        assert_eq!(max.checked_scale_by(Decimal::ONE), Some(max));
        assert_eq!(max.checked_add(Money::from_cents(100)), None);
        assert_eq!(
            Money::from_cents(100).checked_add(Money::from_cents(5)),
            Some(Money::from_cents(105))
        );
    }

    #[test]
    fn test_arithmetic_and_sign() {
        let a = Money::from_cents(1050);
        let b = Money::from_cents(250);
        assert_eq!((a - b).to_string(), "8");
        assert!((b - a).is_negative());
        assert!((-a).is_negative());
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert_eq!(vec![a, b].into_iter().sum::<Money>().to_string(), "13");
    }

    #[test]
    fn test_json_is_string() {
        let m = Money::from_cents(9999);
        let json = serde_json::to_value(m).unwrap();
        assert!(json.is_string());
        assert_eq!(json, "99.99");

        let back: Money = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(back, Money::from_cents(1250));
    }
}

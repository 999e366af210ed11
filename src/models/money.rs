//! Money type for ledger amounts
//!
//! Amounts are integer cents (i64). Anything that needs more precision than a
//! cent (percentage scaling, decimal input) goes through `rust_decimal` and is
//! rounded half-away-from-zero exactly once, when it becomes `Money` again.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use super::percentage::Percentage;

/// A monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use bucket_ledger::models::Money;
    /// let amount = Money::from_cents(1050); // 10.50
    /// assert_eq!(amount.to_string(), "10.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole currency units
    ///
    /// # Panics
    ///
    /// Panics if `units * 100` does not fit in an `i64`. Use
    /// [`checked_from_units`](Self::checked_from_units) for untrusted input.
    pub const fn from_units(units: i64) -> Self {
        match Self::checked_from_units(units) {
            Some(money) => money,
            None => panic!("Money::from_units overflow"),
        }
    }

    /// `units * 100` cents, or `None` on overflow
    pub const fn checked_from_units(units: i64) -> Option<Self> {
        match units.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Convert a decimal amount in currency units to cents.
    ///
    /// Rounds half away from zero to the cent. Returns `None` if the value
    /// does not fit in the cent range.
    ///
    /// ```
    /// use bucket_ledger::models::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::from_decimal(Decimal::new(10005, 3)).unwrap(); // 10.005
    /// assert_eq!(m.cents(), 1001);
    /// ```
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        value
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// The exact decimal value in currency units
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Sum of `amounts`, or `None` if any partial sum overflows
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// `self * pct / 100`, rounded to the cent
    pub fn percentage(&self, pct: Percentage) -> Self {
        // A share of at most 100% is never larger than the amount itself.
        self.scaled_by_percent(pct.value()).unwrap_or(*self)
    }

    /// `self * pct / 100` for an arbitrary percentage value.
    ///
    /// Returns `None` when the result overflows.
    pub fn scaled_by_percent(&self, pct: Decimal) -> Option<Self> {
        let share = self
            .to_decimal()
            .checked_mul(pct)?
            .checked_div(Decimal::ONE_HUNDRED)?;
        Self::from_decimal(share)
    }

    /// Parse a money amount from a string
    ///
    /// Accepts "10", "10.5", "10.50", "-10.50" and "$10.50". More than two
    /// fractional digits are rejected rather than silently rounded.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest).trim();

        if rest.is_empty() || rest.starts_with(['+', '-']) {
            return Err(MoneyParseError::InvalidFormat(s.to_string()));
        }

        let value =
            Decimal::from_str(rest).map_err(|_| MoneyParseError::InvalidFormat(s.to_string()))?;
        if value.scale() > 2 {
            return Err(MoneyParseError::TooManyDecimals(s.to_string()));
        }

        let value = if negative { -value } else { value };
        Self::from_decimal(value).ok_or_else(|| MoneyParseError::OutOfRange(s.to_string()))
    }

    /// Format with an ISO currency code, e.g. `"BRL 10.50"`
    pub fn format_with_code(&self, code: &str) -> String {
        format!("{} {}", code, self)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    TooManyDecimals(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            Self::TooManyDecimals(s) => {
                write!(f, "Money amounts allow at most 2 decimals: {}", s)
            }
            Self::OutOfRange(s) => write!(f, "Money amount out of range: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::from_units(12).format_with_code("BRL"), "BRL 12.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b - a).cents(), -500);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("$10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse(" 0.05 ").unwrap().cents(), 5);
    }

    #[test]
    fn test_parse_rejects_garbage_and_extra_decimals() {
        assert!(matches!(
            Money::parse("12.345"),
            Err(MoneyParseError::TooManyDecimals(_))
        ));
        assert!(matches!(
            Money::parse("abc"),
            Err(MoneyParseError::InvalidFormat(_))
        ));
        assert!(Money::parse("").is_err());
        assert!(Money::parse("--5").is_err());
    }

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(Decimal::new(1005, 3)).unwrap().cents(), 101);
        assert_eq!(Money::from_decimal(Decimal::new(1004, 3)).unwrap().cents(), 100);
        assert_eq!(Money::from_decimal(Decimal::new(-1005, 3)).unwrap().cents(), -101);
        assert_eq!(Money::from_decimal(Decimal::new(3333, 2)).unwrap().cents(), 3333);
    }

    #[test]
    fn test_percentage_scaling() {
        let total = Money::from_units(1000);
        let twenty = Percentage::new(Decimal::new(20, 0)).unwrap();
        assert_eq!(total.percentage(twenty), Money::from_units(200));

        // 100.00 * 33.33% = 33.33
        let third = Percentage::new(Decimal::new(3333, 2)).unwrap();
        assert_eq!(Money::from_units(100).percentage(third).cents(), 3333);

        // 0.05 * 50% = 0.025 -> 0.03
        let half = Percentage::new(Decimal::new(50, 0)).unwrap();
        assert_eq!(Money::from_cents(5).percentage(half).cents(), 3);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![
            Money::from_cents(100),
            Money::from_cents(200),
            Money::from_cents(300),
        ];
        let by_ref: Money = amounts.iter().sum();
        let total: Money = amounts.into_iter().sum();
        assert_eq!(total.cents(), 600);
        assert_eq!(by_ref, total);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_cents(i64::MAX - 10);
        assert_eq!(big.checked_add(Money::from_cents(10)), Some(Money::from_cents(i64::MAX)));
        assert_eq!(big.checked_add(Money::from_cents(11)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);

        assert_eq!(
            Money::checked_sum([Money::from_cents(1), Money::from_cents(2)]),
            Some(Money::from_cents(3))
        );
        assert_eq!(Money::checked_sum([big, big]), None);

        assert_eq!(Money::checked_from_units(12), Some(Money::from_cents(1200)));
        assert_eq!(Money::checked_from_units(i64::MAX / 10), None);
    }

    #[test]
    #[should_panic(expected = "Money::from_units overflow")]
    fn test_from_units_panics_on_overflow() {
        let _ = Money::from_units(i64::MAX);
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");

        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, deserialized);
    }
}

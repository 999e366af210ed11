//! Allocation percentage in the closed range [0, 100].
//!
//! Wraps `rust_decimal::Decimal` so fractional shares like 33.33% stay exact.
//! Serialized as a string to keep the decimal representation lossless.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A percentage between 0 and 100 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Self = Percentage(Decimal::ZERO);
    pub const FULL: Self = Percentage(Decimal::ONE_HUNDRED);

    /// Create a percentage, rejecting values outside [0, 100]
    pub fn new(value: Decimal) -> Result<Self, PercentageError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PercentageError::OutOfRange(value));
        }
        if value > Decimal::ONE_HUNDRED {
            return Err(PercentageError::OutOfRange(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Whole-number percentage, e.g. `Percentage::whole(20)` for 20%
    pub fn whole(value: u8) -> Result<Self, PercentageError> {
        Self::new(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for Percentage {
    type Err = PercentageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%').trim_end();
        let value =
            Decimal::from_str(trimmed).map_err(|_| PercentageError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Percentage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Percentage::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PercentageError {
    Invalid(String),
    OutOfRange(Decimal),
}

impl fmt::Display for PercentageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(s) => write!(f, "Invalid percentage: {}", s),
            Self::OutOfRange(v) => write!(f, "Percentage must be between 0 and 100, got {}", v),
        }
    }
}

impl std::error::Error for PercentageError {}

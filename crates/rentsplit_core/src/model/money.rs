//! Monetary amounts as integer minor currency units.
//!
//! # Responsibility
//! - Represent money without floating-point drift inside core.
//! - Convert to/from decimal display units only at the boundary.
//!
//! # Invariants
//! - One `Money` unit is one minor currency unit (e.g. a cent).
//! - Formatting always renders exactly two decimal places.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Monetary amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|amount| amount.0).sum())
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Error for decimal money strings that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError {
    input: String,
}

impl Display for ParseMoneyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid money amount `{}`; expected a decimal with at most two fraction digits",
            self.input
        )
    }
}

impl Error for ParseMoneyError {}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMoneyError {
            input: value.to_string(),
        };

        let trimmed = value.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole_text, fraction_text) = match digits.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole_text.is_empty() || !whole_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction_text.len() > 2 || !fraction_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole_text.parse().map_err(|_| invalid())?;
        let fraction: i64 = if fraction_text.is_empty() {
            0
        } else {
            let parsed: i64 = fraction_text.parse().map_err(|_| invalid())?;
            if fraction_text.len() == 1 {
                parsed * 10
            } else {
                parsed
            }
        };

        let minor = whole
            .checked_mul(100)
            .and_then(|units| units.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Money;

    #[test]
    fn formats_two_decimal_places() {
        assert_eq!(Money::from_minor_units(100_000).to_string(), "1000.00");
        assert_eq!(Money::from_minor_units(33_340).to_string(), "333.40");
        assert_eq!(Money::from_minor_units(5).to_string(), "0.05");
        assert_eq!(Money::from_minor_units(-5).to_string(), "-0.05");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!("1000".parse::<Money>().unwrap(), Money::from_minor_units(100_000));
        assert_eq!("1000.5".parse::<Money>().unwrap(), Money::from_minor_units(100_050));
        assert_eq!("1000.56".parse::<Money>().unwrap(), Money::from_minor_units(100_056));
        assert_eq!("-3.07".parse::<Money>().unwrap(), Money::from_minor_units(-307));
    }

    #[test]
    fn rejects_malformed_strings() {
        for input in ["", "-", "1.234", "1,50", "abc", "1.", "1.x"] {
            assert!(input.parse::<Money>().is_err(), "accepted `{input}`");
        }
    }

    #[test]
    fn serde_round_trips_as_decimal_string() {
        let amount = Money::from_minor_units(123_456);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1234.56\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}

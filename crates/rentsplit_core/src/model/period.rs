//! Distribution period token (`YYYY-MM`).
//!
//! # Responsibility
//! - Validate period strings once, at the boundary.
//! - Guarantee that every `Period` held by core code is well-formed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static PERIOD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("period pattern is valid"));

/// Calendar-month bucket one distribution covers, e.g. `2026-08`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    /// Parses and validates a `YYYY-MM` period token.
    pub fn parse(value: &str) -> Result<Self, InvalidPeriod> {
        let trimmed = value.trim();
        if PERIOD_PATTERN.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidPeriod {
                input: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Period {
    type Error = InvalidPeriod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.0
    }
}

/// Error for period tokens that are not `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPeriod {
    input: String,
}

impl Display for InvalidPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid period `{}`; expected YYYY-MM", self.input)
    }
}

impl Error for InvalidPeriod {}

#[cfg(test)]
mod tests {
    use super::Period;

    #[test]
    fn accepts_calendar_months() {
        assert_eq!(Period::parse("2026-01").unwrap().as_str(), "2026-01");
        assert_eq!(Period::parse(" 2026-12 ").unwrap().as_str(), "2026-12");
    }

    #[test]
    fn rejects_malformed_tokens() {
        for input in ["2026-13", "2026-00", "2026-1", "202601", "26-01", "2026-01-01", ""] {
            assert!(Period::parse(input).is_err(), "accepted `{input}`");
        }
    }
}

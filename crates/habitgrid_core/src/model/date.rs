//! Calendar date newtype for completion bookkeeping.
//!
//! # Responsibility
//! - Guarantee the canonical zero-padded `YYYY-MM-DD` representation.
//! - Keep lexicographic comparison equal to chronological comparison.
//!
//! # Invariants
//! - A constructed `DayDate` always holds exactly ten ASCII characters.
//! - Range queries over stored dates rely on string ordering, so this type
//!   is the only path for date input into the persistence layer.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static DAY_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid day date regex"));

/// Error raised when an input string is not a canonical calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateError {
    input: String,
}

impl DateError {
    /// Returns the rejected input text.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid calendar date `{}`; expected zero-padded YYYY-MM-DD",
            self.input
        )
    }
}

impl Error for DateError {}

/// Canonical `YYYY-MM-DD` calendar date without a time component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayDate(String);

impl DayDate {
    /// Parses a calendar date from user input.
    ///
    /// Accepts `YYYY-MM-DD` with month `01..=12` and day `01..=31`. An ISO
    /// datetime is truncated at its `T` separator first, since UI layers
    /// historically sent full timestamps for day-level operations.
    pub fn parse(input: &str) -> Result<Self, DateError> {
        let day_part = input.trim().split('T').next().unwrap_or_default();

        let captures = match DAY_DATE_RE.captures(day_part) {
            Some(captures) => captures,
            None => {
                return Err(DateError {
                    input: input.to_string(),
                })
            }
        };

        let month: u32 = captures[2].parse().map_err(|_| DateError {
            input: input.to_string(),
        })?;
        let day: u32 = captures[3].parse().map_err(|_| DateError {
            input: input.to_string(),
        })?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(DateError {
                input: input.to_string(),
            });
        }

        Ok(Self(day_part.to_string()))
    }

    /// Returns the canonical `YYYY-MM-DD` text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DayDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DayDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DayDate> for String {
    fn from(value: DayDate) -> Self {
        value.0
    }
}

//! Calendar month identifiers for the aggregation window
//!
//! A [`MonthKey`] is the ordering unit of the whole pipeline: the resolver
//! discovers a set of them, every snapshot and timeline is keyed by one, and
//! all cross-month queries iterate them in ascending `(year, month)` order.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a `YYYY-MM` month identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthParseError {
    #[error("invalid month identifier `{0}`: expected YYYY-MM")]
    Malformed(String),

    #[error("month number {0} out of range 1..=12")]
    MonthOutOfRange(u32),
}

/// Identifier for one calendar month of data
///
/// Totally ordered by `(year, month)` independent of locale. The set of known
/// keys for a run is exactly what the resolver discovers; nothing in the
/// pipeline hardcodes a calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Create a key, rejecting month numbers outside 1..=12
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month
    pub fn first_day(&self) -> NaiveDate {
        // Month number is validated at construction, so this cannot fail.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| panic!("invalid month key {self}"))
    }

    /// Last calendar day of the month
    ///
    /// This is the snapshot date used for tenure computations, so re-running
    /// the pipeline later for the same historical month reproduces identical
    /// values.
    pub fn last_day(&self) -> NaiveDate {
        self.succ().first_day().pred_opt().unwrap_or_else(|| {
            panic!("invalid month key {self}")
        })
    }

    /// The previous calendar month
    pub fn pred(&self) -> MonthKey {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The next calendar month
    pub fn succ(&self) -> MonthKey {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Number of Monday-Friday dates in this month
    ///
    /// Used as the ceiling when validating reported working-day counts.
    pub fn business_days(&self) -> u32 {
        let mut day = self.first_day();
        let last = self.last_day();
        let mut count = 0;
        while day <= last {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                count += 1;
            }
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        count
    }

    /// Whether a date falls inside this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| MonthParseError::Malformed(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::Malformed(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::Malformed(s.to_string()))?;
        MonthKey::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

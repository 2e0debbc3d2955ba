//! Canonical bucket dates.
//!
//! Buckets arrive with dates in whatever shape the store produced them
//! (`2024-01-05`, `2024-01-05T00:00:00+00:00`, `01/05/24`, ...). Every date is
//! normalized to a [`BucketDate`] before any comparison, so two spellings of
//! the same day always land in the same bucket. Ordering is chronological;
//! the display form is `MM/DD/YY`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::SeriesError;

/// Display format at the presentation boundary.
pub const CANONICAL_FORMAT: &str = "%m/%d/%y";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// `%y` before `%Y`: `%Y` would read "24" as year 24.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

/// A calendar day used as a series key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketDate(NaiveDate);

impl BucketDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse any accepted date spelling.
    pub fn parse(input: &str) -> Result<Self, SeriesError> {
        let s = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_utc().date()));
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
            return Ok(Self(dt.naive_utc().date()));
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self(dt.date()));
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Ok(Self(d));
            }
        }

        Err(SeriesError::DateParseFailure {
            input: input.to_string(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The `MM/DD/YY` rendering.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BucketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for BucketDate {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalize a date string to `MM/DD/YY`.
pub fn format_date(input: &str) -> Result<String, SeriesError> {
    BucketDate::parse(input).map(|d| d.canonical())
}

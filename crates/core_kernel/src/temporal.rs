//! The handling month
//!
//! Every journal run is bounded by the application's handling month: source
//! records are selected by a date field falling between its first and last
//! day, and ledger lines carry the month as `YYYY-MM`.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date the record store uses for "not set" (an unconfirmed record)
pub const ZERO_DATE: &str = "0001-01-01";

/// Date format used for every date value exchanged with the record store
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemporalError {
    #[error("Invalid handling month: {0}")]
    InvalidMonth(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// A calendar month (`YYYY-MM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlingMonth {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl HandlingMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, TemporalError> {
        let invalid = || TemporalError::InvalidMonth(format!("{year:04}-{month:02}"));
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        Ok(Self { first_day, last_day })
    }

    /// Month containing the given date
    pub fn containing(date: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }
}

impl fmt::Display for HandlingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for HandlingMonth {
    type Err = TemporalError;

    /// Accepts `YYYY-MM`, or a full `YYYY-MM-DD` date
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Self::containing(date);
        }
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| TemporalError::InvalidMonth(s.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| TemporalError::InvalidMonth(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| TemporalError::InvalidMonth(s.to_string()))?;
        Self::new(year, month)
    }
}

impl Serialize for HandlingMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HandlingMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a `YYYY-MM-DD` date value
pub fn parse_date(value: &str) -> Result<NaiveDate, TemporalError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| TemporalError::InvalidDate(value.to_string()))
}

/// Formats a date the way the record store expects
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Returns true when a date value is unset (blank or the zero date)
pub fn is_unset_date(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.starts_with(ZERO_DATE)
}

//! Periodic recurrence intervals.
//!
//! # Invariants
//! - `count` is a natural number (`> 0`).
//! - Year and month units move calendar fields; the day clamps to the end of
//!   the resulting month (Jan 31 + 1 month = Feb 29 in 2024).
//! - Week is exactly seven calendar days.

use crate::model::calendar::Instant;
use crate::model::error::ValidationError;
use chrono::{Days, Months};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(year|month|week|day)s?\s*$").expect("valid period regex")
});

/// Unit of a recurrence period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Year,
    Month,
    Week,
    Day,
}

impl PeriodUnit {
    pub const ALL: [PeriodUnit; 4] = [Self::Year, Self::Month, Self::Week, Self::Day];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(value))
    }
}

impl Display for PeriodUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `count` repetitions of `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub count: u32,
    pub unit: PeriodUnit,
}

impl Period {
    pub fn new(count: u32, unit: PeriodUnit) -> Result<Self, ValidationError> {
        let period = Self { count, unit };
        period.validate()?;
        Ok(period)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidPeriodCount { count: self.count });
        }
        Ok(())
    }

    /// `from + count * unit`, or `None` past the representable range.
    pub fn advance(&self, from: Instant) -> Option<Instant> {
        match self.unit {
            PeriodUnit::Year => from.checked_add_months(Months::new(self.count.checked_mul(12)?)),
            PeriodUnit::Month => from.checked_add_months(Months::new(self.count)),
            PeriodUnit::Week => from.checked_add_days(Days::new(u64::from(self.count) * 7)),
            PeriodUnit::Day => from.checked_add_days(Days::new(u64::from(self.count))),
        }
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    /// Parses `"<count> <unit>"`, e.g. `"2 weeks"` or `"1day"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedPeriod {
            input: s.to_string(),
        };
        let captures = PERIOD_RE.captures(s).ok_or_else(malformed)?;
        let count = captures[1].parse::<u32>().map_err(|_| malformed())?;
        let unit = PeriodUnit::parse(&captures[2]).ok_or_else(malformed)?;
        Self::new(count, unit)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.count, self.unit)
    }
}

/// Earliest advance over all periods.
pub fn next_period(periods: &[Period], from: Instant) -> Option<Instant> {
    periods.iter().filter_map(|period| period.advance(from)).min()
}

#[cfg(test)]
mod tests {
    use super::{Period, PeriodUnit};
    use crate::model::error::ValidationError;
    use chrono::NaiveDate;

    fn midnight(y: i32, m: u32, d: u32) -> super::Instant {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn parse_accepts_plural_and_case() {
        let period = "2 Weeks".parse::<Period>().unwrap();
        assert_eq!(period, Period::new(2, PeriodUnit::Week).unwrap());
        assert_eq!("1day".parse::<Period>().unwrap().unit, PeriodUnit::Day);
    }

    #[test]
    fn parse_rejects_zero_and_unknown_units() {
        assert_eq!(
            "0 days".parse::<Period>().unwrap_err(),
            ValidationError::InvalidPeriodCount { count: 0 }
        );
        assert!(matches!(
            "3 fortnights".parse::<Period>().unwrap_err(),
            ValidationError::MalformedPeriod { .. }
        ));
    }

    #[test]
    fn month_advance_clamps_to_month_end() {
        let period = Period::new(1, PeriodUnit::Month).unwrap();
        assert_eq!(
            period.advance(midnight(2024, 1, 31)).unwrap(),
            midnight(2024, 2, 29)
        );
    }

    #[test]
    fn year_advance_moves_calendar_year() {
        let period = Period::new(1, PeriodUnit::Year).unwrap();
        assert_eq!(
            period.advance(midnight(2023, 3, 15)).unwrap(),
            midnight(2024, 3, 15)
        );
    }

    #[test]
    fn display_matches_storage_unit_names() {
        assert_eq!(Period::new(3, PeriodUnit::Month).unwrap().to_string(), "3 month");
    }
}

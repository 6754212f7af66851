//! Calendar primitives used by recurrence rules.
//!
//! # Responsibility
//! - Answer "does instant X fall within me" for weekdays, days of month,
//!   month-days and calendar dates.
//! - Compute next occurrences at or after an instant.
//!
//! # Invariants
//! - Day-shaped occurrences resolve to the end-of-day instant
//!   (23:59:59.999999999), so a task due on day D is overdue only after D
//!   has fully elapsed.
//! - A target day missing from a month clamps to that month's last day.
//! - Occurrence helpers return `None` only past chrono's representable range.

use crate::model::error::ValidationError;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Local wall-clock instant.
pub type Instant = NaiveDateTime;

const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999) {
    Some(time) => time,
    None => panic!("end of day must be a valid time"),
};

/// Returns the last representable instant of `date`.
pub fn end_of_day(date: NaiveDate) -> Instant {
    date.and_time(END_OF_DAY)
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekday(chrono::Weekday);

impl Weekday {
    pub const fn new(weekday: chrono::Weekday) -> Self {
        Self(weekday)
    }

    pub fn get(self) -> chrono::Weekday {
        self.0
    }

    /// `0 = Sunday` numbering used by storage.
    pub fn number_from_sunday(self) -> u32 {
        self.0.num_days_from_sunday()
    }

    pub fn from_number_from_sunday(number: u32) -> Option<Self> {
        let weekday = match number {
            0 => chrono::Weekday::Sun,
            1 => chrono::Weekday::Mon,
            2 => chrono::Weekday::Tue,
            3 => chrono::Weekday::Wed,
            4 => chrono::Weekday::Thu,
            5 => chrono::Weekday::Fri,
            6 => chrono::Weekday::Sat,
            _ => return None,
        };
        Some(Self(weekday))
    }

    pub fn contains(self, at: Instant) -> bool {
        at.weekday() == self.0
    }

    /// End of the nearest day at or after `at` falling on this weekday.
    pub fn next_occurrence(self, at: Instant) -> Option<Instant> {
        let current = at.weekday().num_days_from_monday();
        let target = self.0.num_days_from_monday();
        let ahead = (target + 7 - current) % 7;
        at.date()
            .checked_add_days(Days::new(u64::from(ahead)))
            .map(end_of_day)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        Self(value)
    }
}

impl FromStr for Weekday {
    type Err = chrono::ParseWeekdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<chrono::Weekday>().map(Self)
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            chrono::Weekday::Mon => "Monday",
            chrono::Weekday::Tue => "Tuesday",
            chrono::Weekday::Wed => "Wednesday",
            chrono::Weekday::Thu => "Thursday",
            chrono::Weekday::Fri => "Friday",
            chrono::Weekday::Sat => "Saturday",
            chrono::Weekday::Sun => "Sunday",
        };
        f.write_str(name)
    }
}

/// Day of month in `1..=31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Day(u32);

impl Day {
    pub fn new(day: u32) -> Result<Self, ValidationError> {
        if (1..=31).contains(&day) {
            Ok(Self(day))
        } else {
            Err(ValidationError::DayOutOfRange { day })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// This day inside the given month, clamped to the month's last day.
    pub fn in_month(self, year: i32, month: u32) -> Option<NaiveDate> {
        clamped_date(year, month, self.0)
    }

    /// Whether `at` falls on this day, after clamping to `at`'s month.
    pub fn contains(self, at: Instant) -> bool {
        self.in_month(at.year(), at.month())
            .is_some_and(|date| date == at.date())
    }

    /// End of the nearest day at or after `at` matching this day of month.
    pub fn next_occurrence(self, at: Instant) -> Option<Instant> {
        let today = at.date();
        let candidate = self.in_month(today.year(), today.month())?;
        if candidate >= today {
            return Some(end_of_day(candidate));
        }
        let (year, month) = following_month(today.year(), today.month());
        self.in_month(year, month).map(end_of_day)
    }
}

impl TryFrom<u32> for Day {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Day> for u32 {
    fn from(value: Day) -> Self {
        value.0
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Month and day pair (`mm-dd`) recurring every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self, ValidationError> {
        // 2024 is a leap year, so Feb 29 is accepted here.
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(ValidationError::InvalidMonthDay {
                input: format!("{month:02}-{day:02}"),
            });
        }
        Ok(Self { month, day })
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn day(self) -> u32 {
        self.day
    }

    fn in_year(self, year: i32) -> Option<NaiveDate> {
        clamped_date(year, self.month, self.day)
    }

    pub fn contains(self, at: Instant) -> bool {
        self.in_year(at.year()).is_some_and(|date| date == at.date())
    }

    pub fn next_occurrence(self, at: Instant) -> Option<Instant> {
        let today = at.date();
        let candidate = self.in_year(today.year())?;
        if candidate >= today {
            return Some(end_of_day(candidate));
        }
        self.in_year(today.year() + 1).map(end_of_day)
    }
}

impl FromStr for MonthDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonthDay {
            input: s.to_string(),
        };
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        let day = day.parse::<u32>().map_err(|_| invalid())?;
        Self::new(month, day).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

impl Display for MonthDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Specific calendar date (`yyyy-mm-dd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn get(self) -> NaiveDate {
        self.0
    }

    /// Whether `at` lies between the start and the end of this date.
    pub fn contains(self, at: Instant) -> bool {
        at.date() == self.0
    }

    /// The instant a task due on this date becomes overdue after.
    pub fn occurrence(self) -> Instant {
        end_of_day(self.0)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl FromStr for CalendarDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT).map(Self)
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

/// Earliest configured time strictly after `at`.
pub fn next_time(times: &[Instant], at: Instant) -> Option<Instant> {
    times.iter().copied().filter(|time| *time > at).min()
}

/// Earliest configured date whose end-of-day is strictly after `at`.
pub fn next_date(dates: &[CalendarDate], at: Instant) -> Option<Instant> {
    dates
        .iter()
        .map(|date| date.occurrence())
        .filter(|occurrence| *occurrence > at)
        .min()
}

/// Earliest occurrence of any configured day of month at or after `at`.
pub fn next_day(days: &[Day], at: Instant) -> Option<Instant> {
    days.iter().filter_map(|day| day.next_occurrence(at)).min()
}

/// Earliest occurrence of any configured weekday at or after `at`.
pub fn next_weekday(weekdays: &[Weekday], at: Instant) -> Option<Instant> {
    weekdays
        .iter()
        .filter_map(|weekday| weekday.next_occurrence(at))
        .min()
}

//! Recurrence rules.
//!
//! # Responsibility
//! - Model the six rule kinds as one closed sum type.
//! - Compute next and last occurrences from a start instant and the most
//!   recent completion.
//! - Convert from and to the all-collections `RuleDraft` used for editing,
//!   serialization and storage.
//!
//! # Invariants
//! - The payload of the selected kind is non-empty; `None` carries nothing.
//! - `ByTimes` and `InDates` are one-shot: once completed they have no next
//!   occurrence, and `last_occurrence` keeps the fixed deadline visible.

use crate::model::calendar::{
    next_date, next_day, next_time, next_weekday, CalendarDate, Day, Instant, MonthDay, Weekday,
};
use crate::model::error::ValidationError;
use crate::model::period::{next_period, Period, PeriodUnit};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const TIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Discriminant of `RecurrenceRule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Periodic,
    ByTimes,
    InDaysEveryMonth,
    InDates,
    InWeekdays,
    None,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        Self::Periodic,
        Self::ByTimes,
        Self::InDaysEveryMonth,
        Self::InDates,
        Self::InWeekdays,
        Self::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::ByTimes => "byTimes",
            Self::InDaysEveryMonth => "inDaysEveryMonth",
            Self::InDates => "inDates",
            Self::InWeekdays => "inWeekdays",
            Self::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for RuleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence rule owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleDraft", into = "RuleDraft")]
pub enum RecurrenceRule {
    Periodic(Vec<Period>),
    /// One-shot deadlines at absolute times.
    ByTimes(Vec<Instant>),
    InDaysEveryMonth(Vec<Day>),
    /// One-shot deadlines on whole dates.
    InDates(Vec<CalendarDate>),
    InWeekdays(Vec<Weekday>),
    None,
}

impl Default for RecurrenceRule {
    /// Once per day.
    fn default() -> Self {
        Self::Periodic(vec![Period {
            count: 1,
            unit: PeriodUnit::Day,
        }])
    }
}

impl RecurrenceRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Periodic(_) => RuleKind::Periodic,
            Self::ByTimes(_) => RuleKind::ByTimes,
            Self::InDaysEveryMonth(_) => RuleKind::InDaysEveryMonth,
            Self::InDates(_) => RuleKind::InDates,
            Self::InWeekdays(_) => RuleKind::InWeekdays,
            Self::None => RuleKind::None,
        }
    }

    /// Forward-looking deadline.
    pub fn next_occurrence(
        &self,
        start_at: Instant,
        last_done_at: Option<Instant>,
    ) -> Option<Instant> {
        match self {
            Self::Periodic(periods) => next_period(periods, last_done_at.unwrap_or(start_at)),
            Self::ByTimes(times) => match last_done_at {
                Some(_) => None,
                None => next_time(times, start_at),
            },
            Self::InDates(dates) => match last_done_at {
                Some(_) => None,
                None => next_date(dates, start_at),
            },
            Self::InDaysEveryMonth(days) => next_day(days, last_done_at.unwrap_or(start_at)),
            Self::InWeekdays(weekdays) => next_weekday(weekdays, last_done_at.unwrap_or(start_at)),
            Self::None => None,
        }
    }

    /// Fallback reference deadline used when `next_occurrence` is `None`.
    pub fn last_occurrence(
        &self,
        start_at: Instant,
        last_done_at: Option<Instant>,
    ) -> Option<Instant> {
        match self {
            Self::Periodic(_) | Self::None => None,
            Self::ByTimes(times) => next_time(times, start_at),
            Self::InDates(dates) => next_date(dates, start_at),
            Self::InDaysEveryMonth(days) => next_day(days, last_done_at.unwrap_or(start_at)),
            Self::InWeekdays(weekdays) => next_weekday(weekdays, last_done_at.unwrap_or(start_at)),
        }
    }

    /// Checks the payload required by the selected kind.
    ///
    /// # Errors
    /// - `EmptyCollection` naming the field when the active payload is empty.
    /// - `InvalidPeriodCount` for a zero period count.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        match self {
            Self::Periodic(periods) => {
                require_non_empty(kind, "periods", periods)?;
                periods.iter().try_for_each(Period::validate)
            }
            Self::ByTimes(times) => require_non_empty(kind, "times", times),
            Self::InDaysEveryMonth(days) => require_non_empty(kind, "days", days),
            Self::InDates(dates) => require_non_empty(kind, "dates", dates),
            Self::InWeekdays(weekdays) => require_non_empty(kind, "weekdays", weekdays),
            Self::None => Ok(()),
        }
    }

    /// One-line summary for display.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

fn require_non_empty<T>(
    kind: RuleKind,
    field: &'static str,
    values: &[T],
) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::EmptyCollection { kind, field });
    }
    Ok(())
}

impl Display for RecurrenceRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = self.kind();
        match self {
            Self::Periodic(periods) => match periods.first() {
                Some(period) => write!(f, "once per {period}"),
                None => write!(f, "{kind} (empty)"),
            },
            Self::ByTimes(times) => match times.first() {
                Some(time) => write!(f, "by {}", time.format(TIME_DISPLAY_FORMAT)),
                None => write!(f, "{kind} (empty)"),
            },
            Self::InDates(dates) => match dates.first() {
                Some(date) => write!(f, "in {date}"),
                None => write!(f, "{kind} (empty)"),
            },
            Self::InDaysEveryMonth(days) => match days.first() {
                Some(day) => write!(f, "in {day} every month"),
                None => write!(f, "{kind} (empty)"),
            },
            Self::InWeekdays(weekdays) => match weekdays.first() {
                Some(weekday) => write!(f, "in {weekday}"),
                None => write!(f, "{kind} (empty)"),
            },
            Self::None => f.write_str("None"),
        }
    }
}

/// Rule as edited in forms and stored as rule lines: every collection is
/// present, and `kind` selects which one is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub times: Vec<Instant>,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub dates: Vec<CalendarDate>,
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub month_days: Vec<MonthDay>,
}

impl RuleDraft {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            periods: Vec::new(),
            times: Vec::new(),
            days: Vec::new(),
            dates: Vec::new(),
            weekdays: Vec::new(),
            month_days: Vec::new(),
        }
    }

    fn field_for(kind: RuleKind) -> Option<&'static str> {
        match kind {
            RuleKind::Periodic => Some("periods"),
            RuleKind::ByTimes => Some("times"),
            RuleKind::InDaysEveryMonth => Some("days"),
            RuleKind::InDates => Some("dates"),
            RuleKind::InWeekdays => Some("weekdays"),
            RuleKind::None => None,
        }
    }

    fn populated_fields(&self) -> [(&'static str, bool); 6] {
        [
            ("periods", !self.periods.is_empty()),
            ("times", !self.times.is_empty()),
            ("days", !self.days.is_empty()),
            ("dates", !self.dates.is_empty()),
            ("weekdays", !self.weekdays.is_empty()),
            ("monthDays", !self.month_days.is_empty()),
        ]
    }
}

impl TryFrom<RuleDraft> for RecurrenceRule {
    type Error = ValidationError;

    /// Enforces mutual exclusivity: only the selected collection may carry
    /// values, and it must carry at least one.
    fn try_from(draft: RuleDraft) -> Result<Self, Self::Error> {
        let kind = draft.kind;
        let expected = RuleDraft::field_for(kind);
        for (field, populated) in draft.populated_fields() {
            if populated && Some(field) != expected {
                return Err(ValidationError::UnexpectedCollection { kind, field });
            }
        }

        let rule = match kind {
            RuleKind::Periodic => Self::Periodic(draft.periods),
            RuleKind::ByTimes => Self::ByTimes(draft.times),
            RuleKind::InDaysEveryMonth => Self::InDaysEveryMonth(draft.days),
            RuleKind::InDates => Self::InDates(draft.dates),
            RuleKind::InWeekdays => Self::InWeekdays(draft.weekdays),
            RuleKind::None => Self::None,
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl From<RecurrenceRule> for RuleDraft {
    fn from(rule: RecurrenceRule) -> Self {
        let mut draft = RuleDraft::new(rule.kind());
        match rule {
            RecurrenceRule::Periodic(periods) => draft.periods = periods,
            RecurrenceRule::ByTimes(times) => draft.times = times,
            RecurrenceRule::InDaysEveryMonth(days) => draft.days = days,
            RecurrenceRule::InDates(dates) => draft.dates = dates,
            RecurrenceRule::InWeekdays(weekdays) => draft.weekdays = weekdays,
            RecurrenceRule::None => {}
        }
        draft
    }
}

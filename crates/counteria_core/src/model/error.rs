//! Validation errors shared by rules and tasks.

use crate::model::rule::RuleKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Recoverable, user-facing validation failure.
///
/// Variants name both the offending field and the rule kind it was checked
/// against, so callers can point at the exact form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload collection required by `kind` is empty.
    EmptyCollection {
        kind: RuleKind,
        field: &'static str,
    },
    /// A payload collection not belonging to `kind` carries values.
    UnexpectedCollection {
        kind: RuleKind,
        field: &'static str,
    },
    /// Period counts must be natural numbers.
    InvalidPeriodCount { count: u32 },
    /// Period text could not be parsed as `<count> <unit>`.
    MalformedPeriod { input: String },
    /// Day of month outside `1..=31`.
    DayOutOfRange { day: u32 },
    /// Month-day text is not a valid `mm-dd`.
    InvalidMonthDay { input: String },
    /// Task name is empty or whitespace.
    EmptyTaskName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCollection { kind, field } => {
                write!(f, "rule: empty {field} for `{kind}` rule")
            }
            Self::UnexpectedCollection { kind, field } => {
                write!(f, "rule: {field} should be empty for `{kind}` rule")
            }
            Self::InvalidPeriodCount { count } => {
                write!(f, "rule: period count must be > 0, got {count}")
            }
            Self::MalformedPeriod { input } => {
                write!(f, "rule: invalid period `{input}`; expected `<count> <unit>`")
            }
            Self::DayOutOfRange { day } => {
                write!(f, "rule: day of month must be in 1..=31, got {day}")
            }
            Self::InvalidMonthDay { input } => {
                write!(f, "rule: invalid month-day `{input}`; expected `mm-dd`")
            }
            Self::EmptyTaskName => write!(f, "task: name must not be empty"),
        }
    }
}

impl Error for ValidationError {}

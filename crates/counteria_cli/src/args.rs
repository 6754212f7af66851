//! Command-line surface.

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use counteria_core::{
    CalendarDate, Day, Instant, ListSortBy, Period, RecurrenceRule, SortOrder, TaskId, Weekday,
};
use std::path::PathBuf;

const INSTANT_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Track recurring tasks and their deadlines.
#[derive(Debug, Parser)]
#[command(name = "counteria", version)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/counteria/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tasks with their remaining time.
    List {
        #[arg(long, value_enum, default_value_t = SortArg::Remains)]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one task in detail.
    Show { id: TaskId },
    /// Add a task; without a rule it repeats once per day.
    Add {
        name: String,
        /// Start instant, e.g. 2024-01-01T09:00 (defaults to now).
        #[arg(long, value_parser = parse_instant)]
        start: Option<Instant>,
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// Edit name, start instant or rule of a task.
    Edit {
        id: TaskId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_instant)]
        start: Option<Instant>,
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// Mark a task as done now.
    Done { id: TaskId },
    /// Delete a task and its history.
    Delete { id: TaskId },
    /// Show completion history, newest first.
    History { id: TaskId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Remains,
    DoneAt,
    Id,
}

impl SortArg {
    pub fn sort_by(self) -> ListSortBy {
        match self {
            Self::Remains => ListSortBy::Remains,
            Self::DoneAt => ListSortBy::LastDoneAt,
            Self::Id => ListSortBy::Id,
        }
    }
}

pub fn sort_order(desc: bool) -> SortOrder {
    if desc {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    }
}

/// Rule flags; only one kind may be given, repeated as often as needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
#[group(id = "rule", multiple = false)]
pub struct RuleArgs {
    /// Repeat after a period, e.g. "2 weeks".
    #[arg(long, value_name = "N UNIT", value_parser = parse_period)]
    pub every: Vec<Period>,
    /// Fixed deadline instant.
    #[arg(long, value_name = "TIME", value_parser = parse_instant)]
    pub by: Vec<Instant>,
    /// Day of month (1-31); clamped to short months.
    #[arg(long, value_name = "D", value_parser = parse_day)]
    pub day: Vec<Day>,
    /// Specific date.
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: Vec<CalendarDate>,
    /// Day of week, e.g. mon or Monday.
    #[arg(long, value_name = "NAME", value_parser = parse_weekday)]
    pub weekday: Vec<Weekday>,
    /// No deadline.
    #[arg(long)]
    pub none: bool,
}

impl RuleArgs {
    /// The rule the flags describe, or `None` when no rule flag was given.
    pub fn into_rule(self) -> Option<RecurrenceRule> {
        if self.none {
            Some(RecurrenceRule::None)
        } else if !self.every.is_empty() {
            Some(RecurrenceRule::Periodic(self.every))
        } else if !self.by.is_empty() {
            Some(RecurrenceRule::ByTimes(self.by))
        } else if !self.day.is_empty() {
            Some(RecurrenceRule::InDaysEveryMonth(self.day))
        } else if !self.date.is_empty() {
            Some(RecurrenceRule::InDates(self.date))
        } else if !self.weekday.is_empty() {
            Some(RecurrenceRule::InWeekdays(self.weekday))
        } else {
            None
        }
    }
}

/// Accepts date-times with or without seconds, or a bare date (midnight).
pub fn parse_instant(value: &str) -> Result<Instant, String> {
    let value = value.trim();
    INSTANT_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("invalid time `{value}`; expected YYYY-MM-DD[THH:MM[:SS]]"))
}

fn parse_period(value: &str) -> Result<Period, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn parse_day(value: &str) -> Result<Day, String> {
    let day: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid day `{value}`"))?;
    Day::new(day).map_err(|err| err.to_string())
}

fn parse_date(value: &str) -> Result<CalendarDate, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid date `{value}`; expected YYYY-MM-DD"))
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid weekday `{value}`"))
}

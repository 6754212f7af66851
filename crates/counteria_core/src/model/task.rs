//! Task aggregate and completion records.
//!
//! # Responsibility
//! - Aggregate identity, name, start instant, rule and last completion.
//! - Answer "active now?" and "done for this cycle?" by delegating to the rule.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one.
//! - `name` is non-empty after trimming; checked identically in memory and
//!   by the storage `CHECK` constraint.
//! - `last_done` is the most recent completion by instant, resolved by the
//!   repository rather than stored inline.

use crate::model::calendar::Instant;
use crate::model::deadline::Deadline;
use crate::model::error::ValidationError;
use crate::model::rule::RecurrenceRule;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Store-assigned task identity.
pub type TaskId = i64;

/// Immutable "done" event for one task cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: i64,
    pub task_id: TaskId,
    /// Denormalized for history views after renames.
    pub task_name: String,
    pub done_at: Instant,
}

/// Recurring task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<TaskId>,
    pub name: String,
    pub start_at: Instant,
    pub rule: RecurrenceRule,
    #[serde(skip)]
    pub last_done: Option<CompletionRecord>,
}

impl Task {
    pub fn new(name: impl Into<String>, start_at: Instant, rule: RecurrenceRule) -> Self {
        Self {
            id: None,
            name: name.into(),
            start_at,
            rule,
            last_done: None,
        }
    }

    /// Editing defaults: no id, starts now, once per day.
    pub fn temporary(now: Instant) -> Self {
        Self::new("untitled", now, RecurrenceRule::default())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyTaskName);
        }
        self.rule.validate()
    }

    pub fn last_done_at(&self) -> Option<Instant> {
        self.last_done.as_ref().map(|record| record.done_at)
    }

    pub fn is_done_for_current_cycle(&self, now: Instant) -> bool {
        match &self.rule {
            RecurrenceRule::Periodic(_) => false,
            RecurrenceRule::ByTimes(_) | RecurrenceRule::InDates(_) | RecurrenceRule::None => {
                self.last_done.is_some()
            }
            RecurrenceRule::InDaysEveryMonth(days) => self.last_done_at().is_some_and(|done_at| {
                done_at.year() == now.year()
                    && done_at.month() == now.month()
                    && days.iter().any(|day| day.contains(done_at))
            }),
            RecurrenceRule::InWeekdays(weekdays) => self
                .last_done_at()
                .is_some_and(|done_at| weekdays.iter().any(|weekday| weekday.contains(done_at))),
        }
    }

    /// Whether a completion may be recorded at `now`.
    pub fn is_active_at(&self, now: Instant) -> bool {
        match &self.rule {
            RecurrenceRule::Periodic(_) | RecurrenceRule::ByTimes(_) | RecurrenceRule::None => true,
            RecurrenceRule::InDaysEveryMonth(days) => days.iter().any(|day| day.contains(now)),
            RecurrenceRule::InDates(dates) => dates.iter().any(|date| date.contains(now)),
            RecurrenceRule::InWeekdays(weekdays) => {
                weekdays.iter().any(|weekday| weekday.contains(now))
            }
        }
    }

    pub fn deadline(&self, now: Instant) -> Deadline<'_> {
        Deadline::new(
            &self.rule,
            self.start_at,
            self.last_done.as_ref(),
            self.is_done_for_current_cycle(now),
            now,
        )
    }
}

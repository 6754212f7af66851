//! Deadline and remaining-time computation.
//!
//! # Invariants
//! - The target is the rule's next occurrence, falling back to its last
//!   occurrence for completed one-shot rules.
//! - Remaining magnitudes are non-negative; the sign lives in `exists`.
//! - `exists` holds at `target == now` (not yet overdue).

use crate::model::calendar::Instant;
use crate::model::rule::RecurrenceRule;
use crate::model::task::CompletionRecord;
use chrono::Duration;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Single target instant a task should be completed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline<'a> {
    rule: &'a RecurrenceRule,
    start_at: Instant,
    last_done_at: Option<Instant>,
    done: bool,
    now: Instant,
}

impl<'a> Deadline<'a> {
    pub fn new(
        rule: &'a RecurrenceRule,
        start_at: Instant,
        last_done: Option<&CompletionRecord>,
        done: bool,
        now: Instant,
    ) -> Self {
        Self {
            rule,
            start_at,
            last_done_at: last_done.map(|record| record.done_at),
            done,
            now,
        }
    }

    pub fn target_instant(&self) -> Option<Instant> {
        self.rule
            .next_occurrence(self.start_at, self.last_done_at)
            .or_else(|| self.rule.last_occurrence(self.start_at, self.last_done_at))
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn remaining_time(&self) -> RemainingTime {
        let countdown = self
            .target_instant()
            .map(|target| Countdown::from_duration(target - self.now));
        RemainingTime {
            done: self.done,
            countdown,
        }
    }
}

/// Remaining time before a deadline, plus the current-cycle done flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemainingTime {
    pub done: bool,
    /// `None` when the rule has no target at all.
    pub countdown: Option<Countdown>,
}

impl RemainingTime {
    pub fn is_overdue(&self) -> bool {
        self.countdown.is_some_and(|countdown| !countdown.exists)
    }
}

/// Magnitude of `target - now`, split into days, hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    /// `target - now >= 0`.
    pub exists: bool,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    pub fn from_duration(duration: Duration) -> Self {
        let exists = duration >= Duration::zero();
        let magnitude = duration.abs();
        let total_hours = magnitude.num_hours();
        Self {
            exists,
            days: total_hours / 24,
            hours: total_hours % 24,
            minutes: magnitude.num_minutes() % 60,
        }
    }
}

impl Display for Countdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.exists {
            f.write_str("- ")?;
        }
        let mut parts = Vec::with_capacity(3);
        if self.days != 0 {
            parts.push(format!("{} days", self.days));
        }
        if !parts.is_empty() || self.hours != 0 {
            parts.push(format!("{} hours", self.hours));
        }
        parts.push(format!("{} minutes", self.minutes));
        f.write_str(&parts.join(" "))
    }
}

impl Display for RemainingTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.countdown, self.done) {
            (Some(countdown), _) => write!(f, "{countdown}"),
            (None, true) => f.write_str("done"),
            (None, false) => f.write_str("-"),
        }
    }
}

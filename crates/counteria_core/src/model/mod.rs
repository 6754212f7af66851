//! Recurring-task domain model.
//!
//! # Responsibility
//! - Define calendar primitives, recurrence rules and task aggregates.
//! - Compute deadlines and remaining time as pure functions of instants.
//!
//! # Invariants
//! - Instants are local wall-clock date-times (`chrono::NaiveDateTime`).
//! - Rule kinds form a closed sum type; every dispatch is an exhaustive match.
//! - No model operation performs I/O or reads the system clock.

pub mod calendar;
pub mod deadline;
pub mod error;
pub mod period;
pub mod rule;
pub mod task;

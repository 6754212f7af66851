//! Core domain logic for Counteria, a recurring-task tracker.
//! This crate is the single source of truth for recurrence and deadline rules.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::calendar::{CalendarDate, Day, Instant, MonthDay, Weekday};
pub use model::deadline::{Countdown, Deadline, RemainingTime};
pub use model::error::ValidationError;
pub use model::period::{Period, PeriodUnit};
pub use model::rule::{RecurrenceRule, RuleDraft, RuleKind};
pub use model::task::{CompletionRecord, Task, TaskId};
pub use repo::task_repo::{
    RepoError, RepoResult, SortOrder, SqliteTaskRepository, TaskListQuery, TaskRepository,
    TaskSortBy,
};
pub use service::task_service::{
    ListSortBy, ListTasksRequest, ServiceResult, TaskOverview, TaskService, TaskServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

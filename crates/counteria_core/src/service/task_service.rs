//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/list/mark-done entry points for callers.
//! - Read "now" from an injected clock and compute deadlines for views.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - A completion is only recorded for a task active at the current instant;
//!   otherwise nothing is written and the call is rejected with a warning.
//! - Service layer remains storage-agnostic.

use crate::clock::Clock;
use crate::model::calendar::Instant;
use crate::model::deadline::RemainingTime;
use crate::model::task::{CompletionRecord, Task, TaskId};
use crate::repo::task_repo::{RepoError, SortOrder, TaskListQuery, TaskRepository, TaskSortBy};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Completion refused because the task is not active now.
    TaskInactive { id: TaskId, name: String },
    /// Validation or persistence failure.
    Repo(RepoError),
}

impl TaskServiceError {
    /// Whether the caller should surface this as a warning, not a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::TaskInactive { .. })
    }
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskInactive { id, name } => {
                write!(f, "task {id} `{name}` is not active now; not marked as done")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Ordering offered to list callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSortBy {
    #[default]
    Id,
    LastDoneAt,
    /// Nearest deadline first (for `Asc`); tasks without a target last.
    Remains,
}

/// List request with sort and pagination options.
#[derive(Debug, Clone, Default)]
pub struct ListTasksRequest {
    pub sort_by: ListSortBy,
    pub order: SortOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Task with its deadline state evaluated at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOverview {
    pub task: Task,
    pub evaluated_at: Instant,
    pub target: Option<Instant>,
    pub remaining: RemainingTime,
    pub is_active: bool,
    pub is_done: bool,
}

impl TaskOverview {
    pub fn evaluate(task: Task, now: Instant) -> Self {
        let deadline = task.deadline(now);
        let target = deadline.target_instant();
        let remaining = deadline.remaining_time();
        let is_active = task.is_active_at(now);
        let is_done = deadline.is_done();
        Self {
            task,
            evaluated_at: now,
            target,
            remaining,
            is_active,
            is_done,
        }
    }
}

/// Use-case service over a task repository and a clock.
pub struct TaskService<R: TaskRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: TaskRepository, C: Clock> TaskService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Editing defaults for a new task, starting now.
    pub fn temporary_task(&self) -> Task {
        Task::temporary(self.clock.now())
    }

    pub fn create_task(&self, task: &Task) -> ServiceResult<TaskId> {
        match self.repo.create_task(task) {
            Ok(id) => {
                info!(
                    "event=task_create module=service status=ok task_id={id} rule_type={}",
                    task.rule.kind()
                );
                Ok(id)
            }
            Err(err) => {
                warn!("event=task_create module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Replaces name, start instant and the whole rule of a stored task.
    pub fn update_task(&self, task: &Task) -> ServiceResult<()> {
        match self.repo.update_task(task) {
            Ok(()) => {
                info!(
                    "event=task_update module=service status=ok task_id={} rule_type={}",
                    task.id.unwrap_or_default(),
                    task.rule.kind()
                );
                Ok(())
            }
            Err(err) => {
                warn!("event=task_update module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    pub fn list_tasks(&self, request: &ListTasksRequest) -> ServiceResult<Vec<Task>> {
        let stored_sort = match request.sort_by {
            ListSortBy::Id => Some(TaskSortBy::Id),
            ListSortBy::LastDoneAt => Some(TaskSortBy::LastDoneAt),
            ListSortBy::Remains => None,
        };

        if let Some(sort_by) = stored_sort {
            let query = TaskListQuery {
                sort_by,
                order: request.order,
                limit: request.limit,
                offset: request.offset,
            };
            return Ok(self.repo.list_tasks(&query)?);
        }

        let now = self.clock.now();
        let mut keyed: Vec<(Option<Instant>, Task)> = self
            .repo
            .list_tasks(&TaskListQuery::default())?
            .into_iter()
            .map(|task| (task.deadline(now).target_instant(), task))
            .collect();
        keyed.sort_by(|(left, _), (right, _)| match (left, right) {
            (Some(left), Some(right)) => match request.order {
                SortOrder::Asc => left.cmp(right),
                SortOrder::Desc => right.cmp(left),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let limit = request.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(keyed
            .into_iter()
            .map(|(_, task)| task)
            .skip(request.offset as usize)
            .take(limit)
            .collect())
    }

    /// Evaluates deadline, activity and done state at the clock's now.
    pub fn overview(&self, task: Task) -> TaskOverview {
        TaskOverview::evaluate(task, self.clock.now())
    }

    pub fn list_overviews(&self, request: &ListTasksRequest) -> ServiceResult<Vec<TaskOverview>> {
        let now = self.clock.now();
        Ok(self
            .list_tasks(request)?
            .into_iter()
            .map(|task| TaskOverview::evaluate(task, now))
            .collect())
    }

    /// Records a completion at the clock's now.
    ///
    /// # Errors
    /// - `TaskNotFound` when `id` is unknown.
    /// - `TaskInactive` when the rule does not allow completion now; nothing
    ///   is written.
    pub fn mark_done(&self, id: TaskId) -> ServiceResult<CompletionRecord> {
        let task = self.get_task(id)?;
        let now = self.clock.now();

        if !task.is_active_at(now) {
            warn!(
                "event=task_done module=service status=rejected reason=inactive task_id={id} rule_type={}",
                task.rule.kind()
            );
            return Err(TaskServiceError::TaskInactive {
                id,
                name: task.name,
            });
        }

        let record = self.repo.record_completion(id, &task.name, now)?;
        info!(
            "event=task_done module=service status=ok task_id={id} done_id={}",
            record.id
        );
        Ok(record)
    }

    /// Completion history of one task, newest first.
    pub fn history(&self, id: TaskId) -> ServiceResult<Vec<CompletionRecord>> {
        self.get_task(id)?;
        Ok(self.repo.list_completions(id)?)
    }
}

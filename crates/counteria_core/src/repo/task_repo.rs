//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks, their rule lines and completion history.
//! - Resolve each task's most recent completion on read.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Create/update/delete touch several tables inside one transaction.
//! - Rule payloads are replaced wholesale on update.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::calendar::{CalendarDate, Day, Instant, MonthDay, Weekday};
use crate::model::error::ValidationError;
use crate::model::period::{Period, PeriodUnit};
use crate::model::rule::{RecurrenceRule, RuleDraft, RuleKind};
use crate::model::task::{CompletionRecord, Task, TaskId};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed-width text encoding for instants; sorts lexicographically.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

const TASK_SELECT_SQL: &str = "SELECT
    t.id,
    t.name,
    t.start_at,
    t.rule_type,
    done.id AS done_id,
    done.name AS done_name,
    done.at AS done_at
FROM tasks t
LEFT JOIN done_tasks done ON done.id = (
    SELECT d.id
    FROM done_tasks d
    WHERE d.task_id = t.id
    ORDER BY d.at DESC, d.id DESC
    LIMIT 1
)";

const RULE_LINE_SELECT_SQL: &str = "SELECT
    task_id,
    weekday,
    day,
    month_day,
    date_time,
    rule_date,
    period_number,
    period_unit
FROM task_rule_lines";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(TaskId),
    /// Write requested for a task the store never assigned an id to.
    MissingId,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::MissingId => write!(f, "task has not been saved yet"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::MissingId | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column a task list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortBy {
    #[default]
    Id,
    /// Most recent completion; never-completed tasks sort last.
    LastDoneAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub sort_by: TaskSortBy,
    pub order: SortOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Removes the task with its rule lines and completion history.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn record_completion(
        &self,
        task_id: TaskId,
        task_name: &str,
        at: Instant,
    ) -> RepoResult<CompletionRecord>;
    /// Completion history, newest first.
    fn list_completions(&self, task_id: TaskId) -> RepoResult<Vec<CompletionRecord>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn task_exists(&self, id: TaskId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Loads rule lines for `rows` and assembles full tasks in row order.
    fn assemble(&self, rows: Vec<TaskRow>) -> RepoResult<Vec<Task>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut drafts: HashMap<TaskId, RuleDraft> = rows
            .iter()
            .map(|row| (row.id, RuleDraft::new(row.kind)))
            .collect();

        let placeholders = vec!["?"; rows.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "{RULE_LINE_SELECT_SQL} WHERE task_id IN ({placeholders}) ORDER BY id ASC"
        ))?;
        let mut lines = stmt.query(params_from_iter(rows.iter().map(|row| row.id)))?;
        while let Some(line) = lines.next()? {
            let task_id: TaskId = line.get("task_id")?;
            let draft = drafts.get_mut(&task_id).ok_or_else(|| {
                RepoError::InvalidData(format!("rule line for unexpected task {task_id}"))
            })?;
            push_rule_line(draft, task_id, line)?;
        }

        rows.into_iter()
            .map(|row| {
                let draft = drafts
                    .remove(&row.id)
                    .unwrap_or_else(|| RuleDraft::new(row.kind));
                let rule = RecurrenceRule::try_from(draft).map_err(|err| {
                    RepoError::InvalidData(format!("task {} has an invalid rule: {err}", row.id))
                })?;
                Ok(row.into_task(rule))
            })
            .collect()
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (name, start_at, rule_type) VALUES (?1, ?2, ?3);",
            params![
                task.name.as_str(),
                format_instant(task.start_at),
                task.rule.kind().as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_rule_lines(&tx, id, &task.rule)?;
        tx.commit()?;

        Ok(id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        let id = task.id.ok_or(RepoError::MissingId)?;
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks
             SET
                name = ?2,
                start_at = ?3,
                rule_type = ?4
             WHERE id = ?1;",
            params![
                id,
                task.name.as_str(),
                format_instant(task.start_at),
                task.rule.kind().as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute("DELETE FROM task_rule_lines WHERE task_id = ?1;", [id])?;
        insert_rule_lines(&tx, id, &task.rule)?;
        tx.commit()?;

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE t.id = ?1;"))?;
        let row = stmt.query_row([id], parse_task_row).optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row?])?.pop())
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = TASK_SELECT_SQL.to_string();
        let mut bind_values: Vec<Value> = Vec::new();

        match query.sort_by {
            TaskSortBy::Id => {
                sql.push_str(&format!(" ORDER BY t.id {}", query.order.as_sql()));
            }
            TaskSortBy::LastDoneAt => {
                sql.push_str(&format!(
                    " ORDER BY done.at {} NULLS LAST, t.id ASC",
                    query.order.as_sql()
                ));
            }
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut task_rows = Vec::new();
        while let Some(row) = rows.next()? {
            task_rows.push(parse_task_row(row)??);
        }

        self.assemble(task_rows)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM done_tasks WHERE task_id = ?1;", [id])?;
        tx.execute("DELETE FROM task_rule_lines WHERE task_id = ?1;", [id])?;
        let changed = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn record_completion(
        &self,
        task_id: TaskId,
        task_name: &str,
        at: Instant,
    ) -> RepoResult<CompletionRecord> {
        if task_name.trim().is_empty() {
            return Err(ValidationError::EmptyTaskName.into());
        }
        if !self.task_exists(task_id)? {
            return Err(RepoError::NotFound(task_id));
        }

        self.conn.execute(
            "INSERT INTO done_tasks (task_id, name, at) VALUES (?1, ?2, ?3);",
            params![task_id, task_name, format_instant(at)],
        )?;

        Ok(CompletionRecord {
            id: self.conn.last_insert_rowid(),
            task_id,
            task_name: task_name.to_string(),
            done_at: at,
        })
    }

    fn list_completions(&self, task_id: TaskId) -> RepoResult<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, name, at
             FROM done_tasks
             WHERE task_id = ?1
             ORDER BY at DESC, id DESC;",
        )?;
        let mut rows = stmt.query([task_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let at: String = row.get("at")?;
            records.push(CompletionRecord {
                id: row.get("id")?,
                task_id: row.get("task_id")?,
                task_name: row.get("name")?,
                done_at: parse_instant(&at, "done_tasks.at")?,
            });
        }
        Ok(records)
    }
}

struct TaskRow {
    id: TaskId,
    name: String,
    start_at: Instant,
    kind: RuleKind,
    last_done: Option<CompletionRecord>,
}

impl TaskRow {
    fn into_task(self, rule: RecurrenceRule) -> Task {
        Task {
            id: Some(self.id),
            name: self.name,
            start_at: self.start_at,
            rule,
            last_done: self.last_done,
        }
    }
}

/// Outer result carries SQLite access errors so the function fits
/// `query_row`; inner result carries decoding errors.
fn parse_task_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<TaskRow>> {
    let raw = RawTaskRow {
        id: row.get("id")?,
        name: row.get("name")?,
        start_at: row.get("start_at")?,
        rule_type: row.get("rule_type")?,
        done_id: row.get("done_id")?,
        done_name: row.get("done_name")?,
        done_at: row.get("done_at")?,
    };
    Ok(decode_task_row(raw))
}

struct RawTaskRow {
    id: TaskId,
    name: String,
    start_at: String,
    rule_type: String,
    done_id: Option<i64>,
    done_name: Option<String>,
    done_at: Option<String>,
}

fn decode_task_row(raw: RawTaskRow) -> RepoResult<TaskRow> {
    let kind = RuleKind::parse(&raw.rule_type).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid rule type `{}` in tasks.rule_type",
            raw.rule_type
        ))
    })?;

    let last_done = match (raw.done_id, raw.done_at) {
        (Some(done_id), Some(done_at)) => Some(CompletionRecord {
            id: done_id,
            task_id: raw.id,
            task_name: raw.done_name.unwrap_or_else(|| raw.name.clone()),
            done_at: parse_instant(&done_at, "done_tasks.at")?,
        }),
        _ => None,
    };

    Ok(TaskRow {
        id: raw.id,
        start_at: parse_instant(&raw.start_at, "tasks.start_at")?,
        name: raw.name,
        kind,
        last_done,
    })
}

fn push_rule_line(draft: &mut RuleDraft, task_id: TaskId, line: &Row<'_>) -> RepoResult<()> {
    let kind = draft.kind;
    let missing = |column: &str| {
        RepoError::InvalidData(format!(
            "task {task_id}: `{kind}` rule line without task_rule_lines.{column}"
        ))
    };

    match kind {
        RuleKind::Periodic => {
            let count: Option<u32> = line.get("period_number")?;
            let unit: Option<String> = line.get("period_unit")?;
            let count = count.ok_or_else(|| missing("period_number"))?;
            let unit = unit.ok_or_else(|| missing("period_unit"))?;
            let unit = PeriodUnit::parse(&unit).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid period unit `{unit}` in task_rule_lines.period_unit"
                ))
            })?;
            draft.periods.push(Period { count, unit });
        }
        RuleKind::ByTimes => {
            let time: Option<String> = line.get("date_time")?;
            let time = time.ok_or_else(|| missing("date_time"))?;
            draft
                .times
                .push(parse_instant(&time, "task_rule_lines.date_time")?);
        }
        RuleKind::InDaysEveryMonth => {
            let day: Option<u32> = line.get("day")?;
            let day = day.ok_or_else(|| missing("day"))?;
            draft.days.push(Day::new(day).map_err(|err| {
                RepoError::InvalidData(format!("{err} in task_rule_lines.day"))
            })?);
        }
        RuleKind::InDates => {
            let date: Option<String> = line.get("rule_date")?;
            let date = date.ok_or_else(|| missing("rule_date"))?;
            let date = date.parse::<CalendarDate>().map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid date `{date}` in task_rule_lines.rule_date"
                ))
            })?;
            draft.dates.push(date);
        }
        RuleKind::InWeekdays => {
            let weekday: Option<u32> = line.get("weekday")?;
            let weekday = weekday.ok_or_else(|| missing("weekday"))?;
            let weekday = Weekday::from_number_from_sunday(weekday).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid weekday `{weekday}` in task_rule_lines.weekday"
                ))
            })?;
            draft.weekdays.push(weekday);
        }
        RuleKind::None => {
            let month_day: Option<String> = line.get("month_day")?;
            if let Some(month_day) = month_day {
                let month_day = month_day.parse::<MonthDay>().map_err(|err| {
                    RepoError::InvalidData(format!("{err} in task_rule_lines.month_day"))
                })?;
                draft.month_days.push(month_day);
            }
        }
    }

    Ok(())
}

fn insert_rule_lines(conn: &Connection, task_id: TaskId, rule: &RecurrenceRule) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO task_rule_lines (
            task_id,
            weekday,
            day,
            date_time,
            rule_date,
            period_number,
            period_unit
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
    )?;

    let mut insert = |line: RuleLine| -> RepoResult<()> {
        stmt.execute(params![
            task_id,
            line.weekday,
            line.day,
            line.date_time,
            line.rule_date,
            line.period_number,
            line.period_unit,
        ])?;
        Ok(())
    };

    match rule {
        RecurrenceRule::Periodic(periods) => periods.iter().try_for_each(|period| {
            insert(RuleLine {
                period_number: Some(period.count),
                period_unit: Some(period.unit.as_str()),
                ..RuleLine::default()
            })
        }),
        RecurrenceRule::ByTimes(times) => times.iter().try_for_each(|time| {
            insert(RuleLine {
                date_time: Some(format_instant(*time)),
                ..RuleLine::default()
            })
        }),
        RecurrenceRule::InDaysEveryMonth(days) => days.iter().try_for_each(|day| {
            insert(RuleLine {
                day: Some(day.get()),
                ..RuleLine::default()
            })
        }),
        RecurrenceRule::InDates(dates) => dates.iter().try_for_each(|date| {
            insert(RuleLine {
                rule_date: Some(date.to_string()),
                ..RuleLine::default()
            })
        }),
        RecurrenceRule::InWeekdays(weekdays) => weekdays.iter().try_for_each(|weekday| {
            insert(RuleLine {
                weekday: Some(weekday.number_from_sunday()),
                ..RuleLine::default()
            })
        }),
        RecurrenceRule::None => Ok(()),
    }
}

/// One row of `task_rule_lines`; exactly one payload column is set.
#[derive(Default)]
struct RuleLine {
    weekday: Option<u32>,
    day: Option<u32>,
    date_time: Option<String>,
    rule_date: Option<String>,
    period_number: Option<u32>,
    period_unit: Option<&'static str>,
}

pub fn format_instant(at: Instant) -> String {
    at.format(INSTANT_FORMAT).to_string()
}

fn parse_instant(value: &str, column: &str) -> RepoResult<Instant> {
    NaiveDateTime::parse_from_str(value, INSTANT_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid instant `{value}` in {column}")))
}

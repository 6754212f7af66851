use chrono::{NaiveDate, NaiveDateTime};
use counteria_core::db::open_db_in_memory;
use counteria_core::{
    CalendarDate, Day, Period, PeriodUnit, RecurrenceRule, RepoError, SortOrder,
    SqliteTaskRepository, Task, TaskListQuery, TaskRepository, TaskSortBy, ValidationError,
    Weekday,
};
use rusqlite::params;

#[test]
fn every_rule_kind_round_trips_through_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let rules = [
        RecurrenceRule::Periodic(vec![
            Period::new(2, PeriodUnit::Week).unwrap(),
            Period::new(1, PeriodUnit::Year).unwrap(),
        ]),
        RecurrenceRule::ByTimes(vec![
            at(2024, 3, 1, 9, 0),
            NaiveDate::from_ymd_opt(2024, 3, 2)
                .unwrap()
                .and_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap(),
        ]),
        RecurrenceRule::InDaysEveryMonth(vec![Day::new(31).unwrap(), Day::new(1).unwrap()]),
        RecurrenceRule::InDates(vec![CalendarDate::from_ymd(2024, 12, 24).unwrap()]),
        RecurrenceRule::InWeekdays(vec![
            Weekday::new(chrono::Weekday::Sun),
            Weekday::new(chrono::Weekday::Sat),
        ]),
        RecurrenceRule::None,
    ];

    for rule in rules {
        let task = Task::new("round trip", at(2024, 1, 1, 8, 30), rule);
        let id = repo.create_task(&task).unwrap();

        let loaded = repo.get_task(id).unwrap().unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.name, task.name);
        assert_eq!(loaded.start_at, task.start_at);
        assert_eq!(loaded.rule, task.rule);
        assert_eq!(loaded.last_done, None);
    }
}

#[test]
fn get_task_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    assert!(repo.get_task(42).unwrap().is_none());
}

#[test]
fn create_rejects_invalid_task_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let blank = Task::new(" ", at(2024, 1, 1, 0, 0), RecurrenceRule::None);
    assert!(matches!(
        repo.create_task(&blank),
        Err(RepoError::Validation(ValidationError::EmptyTaskName))
    ));

    let empty_rule = Task::new("x", at(2024, 1, 1, 0, 0), RecurrenceRule::InWeekdays(Vec::new()));
    assert!(matches!(
        repo.create_task(&empty_rule),
        Err(RepoError::Validation(ValidationError::EmptyCollection { .. }))
    ));

    assert_eq!(count_rows(&conn, "tasks"), 0);
    assert_eq!(count_rows(&conn, "task_rule_lines"), 0);
}

#[test]
fn update_replaces_rule_lines_wholesale() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let task = Task::new(
        "gym",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InWeekdays(vec![
            Weekday::new(chrono::Weekday::Mon),
            Weekday::new(chrono::Weekday::Thu),
        ]),
    );
    let id = repo.create_task(&task).unwrap();
    assert_eq!(count_rows(&conn, "task_rule_lines"), 2);

    let mut edited = repo.get_task(id).unwrap().unwrap();
    edited.name = "gym (monthly)".to_string();
    edited.rule = RecurrenceRule::InDaysEveryMonth(vec![Day::new(10).unwrap()]);
    repo.update_task(&edited).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded.name, "gym (monthly)");
    assert_eq!(loaded.rule, edited.rule);
    assert_eq!(count_rows(&conn, "task_rule_lines"), 1);

    edited.rule = RecurrenceRule::None;
    repo.update_task(&edited).unwrap();
    assert_eq!(repo.get_task(id).unwrap().unwrap().rule, RecurrenceRule::None);
    assert_eq!(count_rows(&conn, "task_rule_lines"), 0);
}

#[test]
fn update_requires_saved_existing_task() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let unsaved = Task::new("draft", at(2024, 1, 1, 0, 0), RecurrenceRule::None);
    assert!(matches!(
        repo.update_task(&unsaved),
        Err(RepoError::MissingId)
    ));

    let mut ghost = unsaved.clone();
    ghost.id = Some(77);
    assert!(matches!(
        repo.update_task(&ghost),
        Err(RepoError::NotFound(77))
    ));
}

#[test]
fn latest_completion_is_resolved_by_instant() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let id = repo
        .create_task(&Task::new("stretch", at(2024, 1, 1, 0, 0), RecurrenceRule::default()))
        .unwrap();

    repo.record_completion(id, "stretch", at(2024, 1, 5, 8, 0))
        .unwrap();
    // Recorded later but happened earlier.
    repo.record_completion(id, "stretch", at(2024, 1, 3, 8, 0))
        .unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    let last = loaded.last_done.unwrap();
    assert_eq!(last.done_at, at(2024, 1, 5, 8, 0));
    assert_eq!(last.task_id, id);
    assert_eq!(last.task_name, "stretch");

    let history = repo.list_completions(id).unwrap();
    let instants: Vec<_> = history.iter().map(|record| record.done_at).collect();
    assert_eq!(instants, vec![at(2024, 1, 5, 8, 0), at(2024, 1, 3, 8, 0)]);
}

#[test]
fn completion_keeps_name_at_time_of_completion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let id = repo
        .create_task(&Task::new("old name", at(2024, 1, 1, 0, 0), RecurrenceRule::None))
        .unwrap();
    repo.record_completion(id, "old name", at(2024, 1, 2, 0, 0))
        .unwrap();

    let mut task = repo.get_task(id).unwrap().unwrap();
    task.name = "new name".to_string();
    repo.update_task(&task).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded.name, "new name");
    assert_eq!(loaded.last_done.unwrap().task_name, "old name");
}

#[test]
fn record_completion_for_unknown_task_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    assert!(matches!(
        repo.record_completion(5, "ghost", at(2024, 1, 1, 0, 0)),
        Err(RepoError::NotFound(5))
    ));
    assert_eq!(count_rows(&conn, "done_tasks"), 0);
}

#[test]
fn delete_removes_task_lines_and_history() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let id = repo
        .create_task(&Task::new(
            "monthly",
            at(2024, 1, 1, 0, 0),
            RecurrenceRule::InDaysEveryMonth(vec![Day::new(1).unwrap(), Day::new(15).unwrap()]),
        ))
        .unwrap();
    repo.record_completion(id, "monthly", at(2024, 1, 15, 0, 0))
        .unwrap();

    repo.delete_task(id).unwrap();

    assert!(repo.get_task(id).unwrap().is_none());
    assert_eq!(count_rows(&conn, "tasks"), 0);
    assert_eq!(count_rows(&conn, "task_rule_lines"), 0);
    assert_eq!(count_rows(&conn, "done_tasks"), 0);

    assert!(matches!(repo.delete_task(id), Err(RepoError::NotFound(_))));
}

#[test]
fn list_by_last_done_puts_never_completed_tasks_last() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let never = create_named(&repo, "never");
    let early = create_named(&repo, "early");
    let late = create_named(&repo, "late");
    repo.record_completion(early, "early", at(2024, 1, 2, 0, 0))
        .unwrap();
    repo.record_completion(late, "late", at(2024, 1, 9, 0, 0))
        .unwrap();

    let desc = repo
        .list_tasks(&TaskListQuery {
            sort_by: TaskSortBy::LastDoneAt,
            order: SortOrder::Desc,
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&desc), vec![late, early, never]);

    let asc = repo
        .list_tasks(&TaskListQuery {
            sort_by: TaskSortBy::LastDoneAt,
            order: SortOrder::Asc,
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&asc), vec![early, late, never]);
}

#[test]
fn list_supports_id_order_and_paging() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let created: Vec<_> = (0..5)
        .map(|index| create_named(&repo, &format!("task {index}")))
        .collect();

    let all = repo.list_tasks(&TaskListQuery::default()).unwrap();
    assert_eq!(ids(&all), created);

    let page = repo
        .list_tasks(&TaskListQuery {
            limit: Some(2),
            offset: 1,
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&page), created[1..3].to_vec());

    let tail = repo
        .list_tasks(&TaskListQuery {
            order: SortOrder::Desc,
            offset: 3,
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&tail), vec![created[1], created[0]]);
}

#[test]
fn corrupt_instant_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let id = create_named(&repo, "corrupt");

    conn.execute(
        "UPDATE tasks SET start_at = 'yesterday' WHERE id = ?1;",
        params![id],
    )
    .unwrap();

    match repo.get_task(id) {
        Err(RepoError::InvalidData(message)) => assert!(message.contains("tasks.start_at")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn rule_without_lines_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let id = create_named(&repo, "periodic");

    conn.execute("DELETE FROM task_rule_lines WHERE task_id = ?1;", params![id])
        .unwrap();

    match repo.list_tasks(&TaskListQuery::default()) {
        Err(RepoError::InvalidData(message)) => assert!(message.contains("periods")),
        other => panic!("unexpected result: {other:?}"),
    }
}

fn create_named(repo: &SqliteTaskRepository<'_>, name: &str) -> i64 {
    repo.create_task(&Task::new(
        name,
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::default(),
    ))
    .unwrap()
}

fn ids(tasks: &[Task]) -> Vec<i64> {
    tasks.iter().filter_map(|task| task.id).collect()
}

fn count_rows(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

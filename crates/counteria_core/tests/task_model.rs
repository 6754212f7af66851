use chrono::{NaiveDate, NaiveDateTime};
use counteria_core::model::calendar::end_of_day;
use counteria_core::{
    CalendarDate, CompletionRecord, Day, Period, PeriodUnit, RecurrenceRule, RuleKind, Task,
    ValidationError, Weekday,
};

#[test]
fn temporary_task_has_editing_defaults() {
    let now = at(2024, 6, 1, 10, 0);
    let task = Task::temporary(now);

    assert_eq!(task.id, None);
    assert_eq!(task.start_at, now);
    assert_eq!(task.last_done, None);
    assert_eq!(
        task.rule,
        RecurrenceRule::Periodic(vec![Period::new(1, PeriodUnit::Day).unwrap()])
    );
    assert!(task.validate().is_ok());
}

#[test]
fn validate_rejects_blank_name_before_rule() {
    let task = Task::new("   ", at(2024, 1, 1, 0, 0), RecurrenceRule::InDates(Vec::new()));
    assert_eq!(task.validate().unwrap_err(), ValidationError::EmptyTaskName);

    let task = Task::new("trip", at(2024, 1, 1, 0, 0), RecurrenceRule::InDates(Vec::new()));
    assert_eq!(
        task.validate().unwrap_err(),
        ValidationError::EmptyCollection {
            kind: RuleKind::InDates,
            field: "dates",
        }
    );
}

#[test]
fn weekday_task_is_done_when_completion_weekday_matches() {
    let mut task = Task::new(
        "gym",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InWeekdays(vec![Weekday::new(chrono::Weekday::Mon)]),
    );
    // 2024-01-08 and 2024-01-15 are Mondays.
    let this_monday = at(2024, 1, 15, 9, 0);

    task.last_done = Some(completion(at(2024, 1, 8, 18, 0)));
    assert!(task.is_done_for_current_cycle(this_monday));

    task.last_done = Some(completion(at(2024, 1, 9, 18, 0)));
    assert!(!task.is_done_for_current_cycle(this_monday));
}

#[test]
fn monthly_task_is_done_only_within_completion_month() {
    let mut task = Task::new(
        "pay rent",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InDaysEveryMonth(vec![Day::new(15).unwrap()]),
    );

    task.last_done = Some(completion(at(2024, 1, 15, 8, 0)));
    assert!(task.is_done_for_current_cycle(at(2024, 1, 20, 0, 0)));
    assert!(!task.is_done_for_current_cycle(at(2024, 2, 15, 0, 0)));
    assert!(!task.is_done_for_current_cycle(at(2025, 1, 15, 0, 0)));

    task.last_done = Some(completion(at(2024, 1, 16, 8, 0)));
    assert!(!task.is_done_for_current_cycle(at(2024, 1, 20, 0, 0)));
}

#[test]
fn one_shot_and_none_tasks_are_done_once_completed() {
    let rules = [
        RecurrenceRule::ByTimes(vec![at(2024, 3, 1, 9, 0)]),
        RecurrenceRule::InDates(vec![CalendarDate::from_ymd(2024, 3, 1).unwrap()]),
        RecurrenceRule::None,
    ];
    let now = at(2024, 3, 10, 0, 0);

    for rule in rules {
        let mut task = Task::new("one shot", at(2024, 1, 1, 0, 0), rule);
        assert!(!task.is_done_for_current_cycle(now));
        task.last_done = Some(completion(at(2024, 2, 1, 0, 0)));
        assert!(task.is_done_for_current_cycle(now));
    }
}

#[test]
fn periodic_task_is_never_done() {
    let mut task = Task::new("stretch", at(2024, 1, 1, 0, 0), RecurrenceRule::default());
    task.last_done = Some(completion(at(2024, 1, 1, 9, 0)));
    assert!(!task.is_done_for_current_cycle(at(2024, 1, 1, 10, 0)));
}

#[test]
fn always_active_kinds() {
    let now = at(2024, 7, 4, 3, 0);
    for rule in [
        RecurrenceRule::default(),
        RecurrenceRule::ByTimes(vec![at(2023, 1, 1, 0, 0)]),
        RecurrenceRule::None,
    ] {
        assert!(Task::new("any", at(2024, 1, 1, 0, 0), rule).is_active_at(now));
    }
}

#[test]
fn in_dates_task_is_active_only_on_configured_dates() {
    let task = Task::new(
        "conference",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InDates(vec![
            CalendarDate::from_ymd(2024, 5, 1).unwrap(),
            CalendarDate::from_ymd(2024, 5, 3).unwrap(),
        ]),
    );

    assert!(task.is_active_at(at(2024, 5, 1, 0, 0)));
    assert!(task.is_active_at(at(2024, 5, 3, 23, 59)));
    assert!(!task.is_active_at(at(2024, 5, 2, 12, 0)));
    assert!(!task.is_active_at(at(2024, 4, 30, 23, 59)));
}

#[test]
fn monthly_and_weekday_tasks_follow_calendar() {
    let monthly = Task::new(
        "backup",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InDaysEveryMonth(vec![Day::new(31).unwrap()]),
    );
    assert!(monthly.is_active_at(at(2024, 4, 30, 12, 0)));
    assert!(monthly.is_active_at(at(2024, 5, 31, 12, 0)));
    assert!(!monthly.is_active_at(at(2024, 5, 30, 12, 0)));

    let weekly = Task::new(
        "laundry",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InWeekdays(vec![
            Weekday::new(chrono::Weekday::Sat),
            Weekday::new(chrono::Weekday::Sun),
        ]),
    );
    // 2024-01-06 is a Saturday.
    assert!(weekly.is_active_at(at(2024, 1, 6, 9, 0)));
    assert!(weekly.is_active_at(at(2024, 1, 7, 9, 0)));
    assert!(!weekly.is_active_at(at(2024, 1, 8, 9, 0)));
}

#[test]
fn deadline_reports_done_cycle_for_weekday_task() {
    let mut task = Task::new(
        "gym",
        at(2024, 1, 1, 0, 0),
        RecurrenceRule::InWeekdays(vec![Weekday::new(chrono::Weekday::Mon)]),
    );
    task.last_done = Some(completion(at(2024, 1, 15, 7, 0)));

    let deadline = task.deadline(at(2024, 1, 15, 8, 0));
    assert!(deadline.is_done());
    assert_eq!(
        deadline.target_instant(),
        Some(end_of_day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
    );
    assert!(deadline.remaining_time().done);
}

#[test]
fn task_deserializes_from_editing_form() {
    let value = serde_json::json!({
        "name": "water plants",
        "startAt": "2024-01-01T08:00:00",
        "rule": {
            "type": "periodic",
            "periods": [{ "count": 3, "unit": "day" }]
        }
    });

    let task: Task = serde_json::from_value(value).unwrap();
    assert_eq!(task.id, None);
    assert_eq!(task.name, "water plants");
    assert_eq!(task.start_at, at(2024, 1, 1, 8, 0));
    assert_eq!(
        task.rule,
        RecurrenceRule::Periodic(vec![Period::new(3, PeriodUnit::Day).unwrap()])
    );
    assert_eq!(task.last_done, None);
}

#[test]
fn task_serialization_omits_last_completion() {
    let mut task = Task::new("x", at(2024, 1, 1, 0, 0), RecurrenceRule::None);
    task.id = Some(4);
    task.last_done = Some(completion(at(2024, 1, 2, 0, 0)));

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], 4);
    assert_eq!(json["rule"]["type"], "none");
    assert!(json.get("lastDone").is_none());
}

fn completion(done_at: NaiveDateTime) -> CompletionRecord {
    CompletionRecord {
        id: 1,
        task_id: 1,
        task_name: "task".to_string(),
        done_at,
    }
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

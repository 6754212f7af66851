//! Plain-text views of tasks for the terminal.

use counteria_core::{CompletionRecord, Instant, TaskOverview};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn format_time(at: Instant) -> String {
    at.format(TIME_FORMAT).to_string()
}

fn status_mark(overview: &TaskOverview) -> &'static str {
    if overview.is_done {
        "[x]"
    } else if overview.is_active {
        "[ ]"
    } else {
        "[-]"
    }
}

pub fn overview_line(overview: &TaskOverview) -> String {
    format!(
        "{:>4} {} {:<24} {:<28} {}",
        overview.task.id.unwrap_or_default(),
        status_mark(overview),
        overview.task.name,
        overview.remaining.to_string(),
        overview.task.rule.describe()
    )
}

pub fn overview_table(overviews: &[TaskOverview]) -> String {
    if overviews.is_empty() {
        return "no tasks".to_string();
    }
    overviews
        .iter()
        .map(overview_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn overview_detail(overview: &TaskOverview) -> String {
    let task = &overview.task;
    let mut lines = vec![
        format!("id:        {}", task.id.unwrap_or_default()),
        format!("name:      {}", task.name),
        format!("start:     {}", format_time(task.start_at)),
        format!("rule:      {}", task.rule.describe()),
        format!(
            "deadline:  {}",
            overview.target.map_or_else(|| "-".to_string(), format_time)
        ),
        format!("remaining: {}", overview.remaining),
        format!("active:    {}", if overview.is_active { "yes" } else { "no" }),
    ];
    lines.push(match &task.last_done {
        Some(record) => format!("last done: {}", format_time(record.done_at)),
        None => "last done: never".to_string(),
    });
    lines.join("\n")
}

pub fn history_table(records: &[CompletionRecord]) -> String {
    if records.is_empty() {
        return "never done".to_string();
    }
    records
        .iter()
        .map(|record| format!("{}  {}", format_time(record.done_at), record.task_name))
        .collect::<Vec<_>>()
        .join("\n")
}

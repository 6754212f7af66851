//! `counteria` command-line entry point.
//!
//! # Responsibility
//! - Resolve config, start logging, open the store and dispatch commands.
//! - Report inactive-task completions as warnings, not failures.

mod args;
mod config;
mod render;

use args::{sort_order, Cli, Command, RuleArgs};
use clap::Parser as _;
use config::{Config, ConfigError, Settings};
use counteria_core::db::{open_db, DbError};
use counteria_core::{
    init_logging, Instant, ListTasksRequest, SqliteTaskRepository, SystemClock, TaskId,
    TaskService, TaskServiceError,
};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

type Service<'conn> = TaskService<SqliteTaskRepository<'conn>, SystemClock>;

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Db(DbError),
    Service(TaskServiceError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Service(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<TaskServiceError> for CliError {
    fn from(value: TaskServiceError) -> Self {
        Self::Service(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Service(err)) if err.is_warning() => {
            eprintln!("warning: {err}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Config::load(cli.config.as_deref())?.resolve()?;
    start_logging(&settings);

    let conn = open_db(&settings.database_path)?;
    let service = TaskService::new(SqliteTaskRepository::new(&conn), SystemClock);
    info!(
        "event=cli_run module=cli status=start db={}",
        settings.database_path.display()
    );

    let output = execute(&service, cli.command)?;
    println!("{output}");
    Ok(())
}

/// Logging is best effort; the command still runs without it.
fn start_logging(settings: &Settings) {
    if let Err(err) = init_logging(&settings.log_level, &settings.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn execute(service: &Service<'_>, command: Command) -> Result<String, CliError> {
    match command {
        Command::List {
            sort,
            desc,
            limit,
            offset,
        } => {
            let request = ListTasksRequest {
                sort_by: sort.sort_by(),
                order: sort_order(desc),
                limit,
                offset,
            };
            Ok(render::overview_table(&service.list_overviews(&request)?))
        }
        Command::Show { id } => {
            let task = service.get_task(id)?;
            Ok(render::overview_detail(&service.overview(task)))
        }
        Command::Add { name, start, rule } => add(service, name, start, rule),
        Command::Edit {
            id,
            name,
            start,
            rule,
        } => edit(service, id, name, start, rule),
        Command::Done { id } => {
            let record = service.mark_done(id)?;
            Ok(format!(
                "marked `{}` done at {}",
                record.task_name,
                record.done_at.format("%Y-%m-%d %H:%M")
            ))
        }
        Command::Delete { id } => {
            service.delete_task(id)?;
            Ok(format!("deleted task {id}"))
        }
        Command::History { id } => Ok(render::history_table(&service.history(id)?)),
    }
}

fn add(
    service: &Service<'_>,
    name: String,
    start: Option<Instant>,
    rule: RuleArgs,
) -> Result<String, CliError> {
    let mut task = service.temporary_task();
    task.name = name;
    if let Some(start) = start {
        task.start_at = start;
    }
    if let Some(rule) = rule.into_rule() {
        task.rule = rule;
    }

    let id = service.create_task(&task)?;
    let stored = service.get_task(id)?;
    Ok(render::overview_line(&service.overview(stored)))
}

fn edit(
    service: &Service<'_>,
    id: TaskId,
    name: Option<String>,
    start: Option<Instant>,
    rule: RuleArgs,
) -> Result<String, CliError> {
    let mut task = service.get_task(id)?;
    if let Some(name) = name {
        task.name = name;
    }
    if let Some(start) = start {
        task.start_at = start;
    }
    if let Some(rule) = rule.into_rule() {
        task.rule = rule;
    }

    service.update_task(&task)?;
    let stored = service.get_task(id)?;
    Ok(render::overview_detail(&service.overview(stored)))
}

#[cfg(test)]
mod tests {
    use super::{execute, CliError};
    use crate::args::Cli;
    use clap::Parser;
    use counteria_core::db::open_db_in_memory;
    use counteria_core::{SqliteTaskRepository, SystemClock, TaskService, TaskServiceError};

    fn command(argv: &[&str]) -> crate::args::Command {
        let mut full = vec!["counteria"];
        full.extend_from_slice(argv);
        Cli::try_parse_from(full).unwrap().command
    }

    #[test]
    fn add_then_list_and_history() {
        let conn = open_db_in_memory().unwrap();
        let service = TaskService::new(SqliteTaskRepository::new(&conn), SystemClock);

        let added = execute(&service, command(&["add", "water plants", "--every", "3 days"]))
            .unwrap();
        assert!(added.contains("water plants"));
        assert!(added.ends_with("once per 3 day"));

        let listed = execute(&service, command(&["list"])).unwrap();
        assert_eq!(listed.lines().count(), 1);

        execute(&service, command(&["done", "1"])).unwrap();
        let history = execute(&service, command(&["history", "1"])).unwrap();
        assert!(history.ends_with("water plants"));
    }

    #[test]
    fn edit_keeps_rule_when_no_rule_flags_given() {
        let conn = open_db_in_memory().unwrap();
        let service = TaskService::new(SqliteTaskRepository::new(&conn), SystemClock);
        execute(&service, command(&["add", "backup", "--day", "31"])).unwrap();

        let detail = execute(&service, command(&["edit", "1", "--name", "offsite backup"]))
            .unwrap();
        assert!(detail.contains("name:      offsite backup"));
        assert!(detail.contains("rule:      in 31 every month"));
    }

    #[test]
    fn missing_task_is_an_error_not_a_warning() {
        let conn = open_db_in_memory().unwrap();
        let service = TaskService::new(SqliteTaskRepository::new(&conn), SystemClock);

        let err = execute(&service, command(&["show", "5"])).unwrap_err();
        assert!(matches!(
            err,
            CliError::Service(TaskServiceError::TaskNotFound(5))
        ));
    }
}

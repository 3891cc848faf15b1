use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklog_cli::cli::{Cli, Command, collect_config_overrides};
use tasklog_core::completion;
use tasklog_core::config::{self, Config, Palette, merge_overrides, palette_for_theme};
use tasklog_core::dispatch::{self, Channel, LoggingBackend};
use tasklog_core::error::AppError;
use tasklog_core::filter::TaskFilter;
use tasklog_core::insights::{self, Coach, HeuristicCoach};
use tasklog_core::model::{LogEntry, NotifyChannels, Task};
use tasklog_core::notify;
use tasklog_core::reminder::{self, ReminderScanner, ScanOutcome, Ticker};
use tasklog_core::task_api::{self, TaskDraft};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const LOG_ENV_VAR: &str = "TASKLOG_LOG";

struct Runtime {
    config: Config,
    offset: UtcOffset,
}

impl Runtime {
    fn palette(&self) -> Palette {
        palette_for_theme(self.config.theme.as_deref())
    }
}

fn format_local(at: OffsetDateTime, offset: UtcOffset) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    at.to_offset(offset)
        .format(&format)
        .unwrap_or_else(|_| at.to_string())
}

#[derive(Tabled)]
struct TaskRow {
    id: String,
    title: String,
    category: String,
    scheduled: String,
    estimate: String,
    repeat: String,
    status: String,
}

impl TaskRow {
    fn new(task: &Task, offset: UtcOffset) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            category: task.category.to_string(),
            scheduled: format_local(task.scheduled_at, offset),
            estimate: format!("{}m", task.estimate_minutes),
            repeat: task.repeat.to_string(),
            status: if task.completed { "done" } else { "pending" }.to_string(),
        }
    }
}

#[derive(Tabled)]
struct LogRow {
    logged: String,
    task: String,
    scheduled: String,
    status: String,
    late: String,
    note: String,
}

impl LogRow {
    fn new(entry: &LogEntry, offset: UtcOffset) -> Self {
        Self {
            logged: format_local(entry.logged_at, offset),
            task: format!("{} ({})", entry.title, entry.task_id),
            scheduled: format_local(entry.scheduled_at, offset),
            status: entry.outcome.status.as_str().to_string(),
            late: format!("{}m", entry.outcome.late_minutes),
            note: entry.outcome.note.clone(),
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_tasks_plain(tasks: &[Task], runtime: &Runtime) {
    if tasks.is_empty() {
        println!("{}", runtime.palette().mutedize("No tasks."));
        return;
    }

    let rows = tasks.iter().map(|task| TaskRow::new(task, runtime.offset));
    println!("{}", Table::new(rows).with(Style::psql()));
}

fn print_logs_plain(logs: &[LogEntry], runtime: &Runtime) {
    if logs.is_empty() {
        println!("{}", runtime.palette().mutedize("No log entries."));
        return;
    }

    let rows = logs.iter().map(|entry| LogRow::new(entry, runtime.offset));
    println!("{}", Table::new(rows).with(Style::psql()));
}

fn print_scan_plain(outcome: &ScanOutcome, runtime: &Runtime) {
    let palette = runtime.palette();
    for task in &outcome.due {
        println!(
            "{} {} ({})",
            palette.accentize("Reminder:"),
            reminder::reminder_body(task, runtime.offset),
            task.id
        );
    }
    for failure in &outcome.failures {
        eprintln!(
            "WARN: notification for {} failed: {}",
            failure.task_id, failure.error
        );
    }
}

fn print_scan_json(tick: u64, outcome: &ScanOutcome) -> Result<(), AppError> {
    let failures: Vec<_> = outcome
        .failures
        .iter()
        .map(|failure| {
            serde_json::json!({
                "task_id": failure.task_id,
                "error": failure.error.to_string(),
            })
        })
        .collect();
    print_json(&serde_json::json!({
        "tick": tick,
        "due": outcome.due,
        "notified": outcome.notified,
        "failures": failures,
    }))
}

/// Asks for a lateness reason on stdin. End of input counts as declining.
fn prompt_reason(late_minutes: u64) -> Result<Option<String>, AppError> {
    eprint!("Task is {late_minutes} minute(s) late. Reason (leave empty to skip): ");
    io::stderr().flush()?;

    let mut line = String::new();
    let bytes = io::stdin().read_line(&mut line)?;
    if bytes == 0 {
        return Ok(None);
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn runtime_for(cli: &Cli, base: &Config, offset: UtcOffset) -> Result<Runtime, AppError> {
    let overrides = collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    Ok(Runtime {
        config: merge_overrides(base, &overrides),
        offset,
    })
}

fn run_command(cli: Cli, runtime: &Runtime) -> Result<(), AppError> {
    let offset = runtime.offset;

    match cli.command {
        Command::Add {
            title,
            at,
            category,
            estimate,
            repeat,
            email,
            messaging,
            push,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };
            let scheduled_at = task_api::parse_datetime(&at, offset)?;

            let mut store = task_api::open_store(&runtime.config)?;
            let draft = TaskDraft {
                title,
                category,
                scheduled_at,
                estimate_minutes: estimate,
                repeat,
                channels: NotifyChannels {
                    email,
                    messaging,
                    push,
                },
            };
            let task = task_api::add_task(&mut store, draft, task_api::now_local(offset))?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!(
                    "Added task: {} ({}) at {}",
                    task.title,
                    task.id,
                    format_local(task.scheduled_at, offset)
                );
            }
        }
        Command::List { category, search } => {
            let store = task_api::open_store(&runtime.config)?;
            let tasks = task_api::list_tasks(&store, &TaskFilter { category, search });
            if cli.json {
                print_json(&tasks)?;
            } else {
                print_tasks_plain(&tasks, runtime);
            }
        }
        Command::Done { id, reason } => {
            let mut store = task_api::open_store(&runtime.config)?;
            let pending = completion::begin_completion(&store, &id, task_api::now_local(offset))?;
            let reason = match reason {
                Some(value) => Some(value),
                None if pending.needs_reason() && !cli.json => prompt_reason(pending.late_minutes)?,
                None => None,
            };

            let entry = completion::finish_completion(&mut store, pending, reason.as_deref())?;
            if cli.json {
                print_json(&entry)?;
            } else if entry.outcome.late_minutes > 0 {
                println!(
                    "Completed task: {} ({}), {} min late",
                    entry.title, entry.task_id, entry.outcome.late_minutes
                );
            } else {
                println!("Completed task: {} ({}) on time", entry.title, entry.task_id);
            }
        }
        Command::Reopen { id } => {
            let mut store = task_api::open_store(&runtime.config)?;
            let task = completion::reopen_task(&mut store, &id)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        Command::Remove { id } => {
            let mut store = task_api::open_store(&runtime.config)?;
            let task = task_api::remove_task(&mut store, &id)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("Removed task: {} ({})", task.title, task.id);
            }
        }
        Command::Log => {
            let store = task_api::open_store(&runtime.config)?;
            if cli.json {
                print_json(&store.logs())?;
            } else {
                print_logs_plain(store.logs(), runtime);
            }
        }
        Command::Insights => {
            let store = task_api::open_store(&runtime.config)?;
            let today = task_api::now_local(offset).date();
            let summary = insights::day_summary(store.tasks(), store.logs(), today, offset);
            let suggestion = HeuristicCoach.suggest(insights::recent_logs(store.logs()));

            if cli.json {
                print_json(&serde_json::json!({
                    "scheduled_today": summary.scheduled_today,
                    "completed_today": summary.completed_today,
                    "late_minutes": summary.late_minutes,
                    "suggestion": suggestion,
                }))?;
            } else {
                let palette = runtime.palette();
                println!(
                    "Today: {} scheduled, {} completed",
                    summary.scheduled_today, summary.completed_today
                );
                println!(
                    "Late minutes (last {} late entries): {}",
                    insights::RECENT_LOG_WINDOW,
                    summary.late_minutes
                );
                println!("{} {}", palette.accentize("Suggestion:"), suggestion);
            }
        }
        Command::Remind { id, channel } => {
            let store = task_api::open_store(&runtime.config)?;
            let task = task_api::get_task_by_id(&store, &id)?;
            let acks = match channel {
                Some(channel) => vec![dispatch::send_reminder(&LoggingBackend, &task, channel)?],
                None => {
                    if Channel::enabled_for(&task).is_empty() {
                        return Err(AppError::invalid_input(
                            "no reminder channels enabled for task",
                        ));
                    }
                    dispatch::send_enabled_reminders(&LoggingBackend, &task)?
                }
            };

            if cli.json {
                print_json(&acks)?;
            } else {
                for ack in &acks {
                    let state = if ack.delivered { "sent" } else { "not sent" };
                    println!("Reminder via {} {}: {}", ack.channel, state, ack.detail);
                }
            }
        }
        Command::Watch { ticks } => run_watch(ticks, cli.json, runtime)?,
    }

    Ok(())
}

fn run_watch(ticks: Option<u64>, json: bool, runtime: &Runtime) -> Result<(), AppError> {
    let mut store = task_api::open_store(&runtime.config)?;
    let scanner = ReminderScanner::new(notify::notifier_from_env()?, runtime.config.lookahead());
    let interval = runtime.config.scan_interval();
    let ticker = Ticker::start(interval)?;

    tracing::info!(
        interval_secs = interval.as_secs(),
        permission = ?scanner.permission(),
        "watching for reminders"
    );
    if !json {
        println!("Watching for reminders every {}s", interval.as_secs());
    }

    let mut tick: u64 = 0;
    while ticks.is_none_or(|limit| tick < limit) {
        if !ticker.wait() {
            break;
        }
        tick += 1;

        store.reload();
        let outcome = scanner.scan(store.tasks(), task_api::now_local(runtime.offset));
        if json {
            print_scan_json(tick, &outcome)?;
        } else {
            print_scan_plain(&outcome, runtime);
        }
    }

    Ok(())
}

fn run_interactive(base: &Config, offset: UtcOffset) -> Result<(), AppError> {
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        input.clear();
        // The lock is released between reads so `done` can prompt for a reason.
        let bytes = stdin.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasklog".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        let result = runtime_for(&cli, base, offset).and_then(|runtime| run_command(cli, &runtime));
        if let Err(err) = result {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<(), AppError> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| AppError::io(format!("failed to initialize logging: {err}")))
}

fn load_base_config() -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "config could not be loaded, using defaults");
    }
    loaded.config
}

fn main() {
    // Read before any thread exists; the local offset is unavailable afterwards on unix.
    let offset = task_api::local_offset();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = init_tracing(false) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        let base = load_base_config();
        if let Err(err) = run_interactive(&base, offset) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if !err.use_stderr() {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
    let base = load_base_config();

    let result = runtime_for(&cli, &base, offset).and_then(|runtime| run_command(cli, &runtime));
    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

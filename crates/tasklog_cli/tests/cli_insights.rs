use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasklog-{nanos}-{name}"))
}

fn tasklog(data_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tasklog"));
    command
        .env("TASKLOG_DATA_DIR", data_dir)
        .env("TASKLOG_CONFIG_PATH", data_dir.join("config.json"))
        .env("TASKLOG_DISABLE_NOTIFICATIONS", "1");
    command
}

fn log_entry(id: &str, late_minutes: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "task_id": "task-old",
        "title": "Old task",
        "scheduled_at": "2025-01-01T09:00:00Z",
        "outcome": { "status": "done", "late_minutes": late_minutes, "note": "" },
        "logged_at": "2025-01-01T09:30:00Z"
    })
}

fn seed_logs(data_dir: &Path, logs: Vec<serde_json::Value>) {
    std::fs::create_dir_all(data_dir).unwrap();
    std::fs::write(
        data_dir.join("logs.json"),
        serde_json::Value::Array(logs).to_string(),
    )
    .unwrap();
}

fn insights_json(data_dir: &Path) -> serde_json::Value {
    let output = tasklog(data_dir)
        .args(["--json", "insights"])
        .output()
        .expect("failed to run insights command");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("json output")
}

#[test]
fn insights_without_history_asks_for_completions() {
    let dir = temp_dir("cli-insights-empty");

    let parsed = insights_json(&dir);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(parsed["scheduled_today"], 0);
    assert_eq!(parsed["completed_today"], 0);
    assert_eq!(parsed["late_minutes"], 0);
    assert!(parsed["suggestion"].as_str().unwrap().contains("Complete a few tasks"));
}

#[test]
fn insights_suggests_rescheduling_after_three_late_entries() {
    let dir = temp_dir("cli-insights-late");
    seed_logs(
        &dir,
        vec![
            log_entry("log-1", 10),
            log_entry("log-2", 0),
            log_entry("log-3", 5),
            log_entry("log-4", 7),
        ],
    );

    let parsed = insights_json(&dir);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(parsed["late_minutes"], 22);
    assert!(parsed["suggestion"].as_str().unwrap().contains("15 minutes later"));
}

#[test]
fn insights_encourages_when_mostly_on_time() {
    let dir = temp_dir("cli-insights-on-time");
    seed_logs(&dir, vec![log_entry("log-1", 0), log_entry("log-2", 4)]);

    let output = tasklog(&dir)
        .args(["insights"])
        .output()
        .expect("failed to run insights command");
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Today: 0 scheduled, 0 completed"));
    assert!(stdout.contains("Late minutes (last 30 late entries): 4"));
    assert!(stdout.contains("Keep it up!"));
}

#[test]
fn insights_sums_late_entries_beyond_on_time_ones() {
    let dir = temp_dir("cli-insights-late-window");
    let mut logs: Vec<serde_json::Value> = (0..30)
        .map(|index| log_entry(&format!("log-{index}"), 0))
        .collect();
    logs.push(log_entry("log-old", 90));
    seed_logs(&dir, logs);

    let parsed = insights_json(&dir);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(parsed["late_minutes"], 90);
    assert!(parsed["suggestion"].as_str().unwrap().contains("Keep it up!"));
}

#[test]
fn insights_caps_late_sum_at_thirty_late_entries() {
    let dir = temp_dir("cli-insights-late-cap");
    let logs: Vec<serde_json::Value> = (0..31)
        .map(|index| log_entry(&format!("log-{index}"), 1))
        .collect();
    seed_logs(&dir, logs);

    let parsed = insights_json(&dir);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(parsed["late_minutes"], 30);
}

#[test]
fn insights_counts_todays_tasks() {
    let dir = temp_dir("cli-insights-today");
    let now = OffsetDateTime::now_utc();

    let added = tasklog(&dir)
        .args(["add", "Stretch", "--at", &now.format(&Rfc3339).unwrap()])
        .output()
        .expect("failed to run add command");
    assert!(added.status.success());

    let parsed = insights_json(&dir);
    let log = tasklog(&dir)
        .args(["log"])
        .output()
        .expect("failed to run log command");
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(parsed["scheduled_today"], 1);
    assert_eq!(parsed["completed_today"], 0);
    assert!(String::from_utf8_lossy(&log.stdout).contains("No log entries."));
}

//! Local stand-ins for an analytics/coaching backend.

use crate::model::{LogEntry, Task};
use serde::Serialize;
use time::{Date, UtcOffset};

pub const RECENT_LOG_WINDOW: usize = 30;
pub const LATE_ENTRY_THRESHOLD: usize = 3;

pub const NO_HISTORY_SUGGESTION: &str =
    "Complete a few tasks and tips based on your history will show up here.";
pub const SCHEDULING_SUGGESTION: &str =
    "Several recent tasks ran late. Try scheduling them 15 minutes later or shortening the estimate.";
pub const ENCOURAGEMENT_SUGGESTION: &str = "You're keeping to your schedule. Keep it up!";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub scheduled_today: usize,
    pub completed_today: usize,
    /// Sum over the most recent late entries, at most
    /// [`RECENT_LOG_WINDOW`] of them, not limited to today.
    pub late_minutes: u64,
}

/// Most recent entries first, at most [`RECENT_LOG_WINDOW`] of them.
pub fn recent_logs(logs: &[LogEntry]) -> &[LogEntry] {
    &logs[..logs.len().min(RECENT_LOG_WINDOW)]
}

pub fn day_summary(tasks: &[Task], logs: &[LogEntry], today: Date, offset: UtcOffset) -> DaySummary {
    let scheduled: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.scheduled_at.to_offset(offset).date() == today)
        .collect();

    let late_minutes = logs
        .iter()
        .filter(|entry| entry.is_late())
        .take(RECENT_LOG_WINDOW)
        .map(|entry| entry.outcome.late_minutes)
        .sum();

    DaySummary {
        scheduled_today: scheduled.len(),
        completed_today: scheduled.iter().filter(|task| task.completed).count(),
        late_minutes,
    }
}

/// Produces a short coaching line from recent completions.
pub trait Coach {
    fn suggest(&self, recent_logs: &[LogEntry]) -> String;
}

/// Threshold rules over the log history.
pub struct HeuristicCoach;

impl Coach for HeuristicCoach {
    fn suggest(&self, recent_logs: &[LogEntry]) -> String {
        if recent_logs.is_empty() {
            return NO_HISTORY_SUGGESTION.to_string();
        }

        let late_entries = recent_logs.iter().filter(|entry| entry.is_late()).count();
        if late_entries >= LATE_ENTRY_THRESHOLD {
            SCHEDULING_SUGGESTION.to_string()
        } else {
            ENCOURAGEMENT_SUGGESTION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Coach, DaySummary, ENCOURAGEMENT_SUGGESTION, HeuristicCoach, NO_HISTORY_SUGGESTION,
        RECENT_LOG_WINDOW, SCHEDULING_SUGGESTION, day_summary, recent_logs,
    };
    use crate::model::{
        Category, LogEntry, NotifyChannels, Outcome, OutcomeStatus, RepeatMode, Task,
    };
    use time::macros::{date, datetime, offset};
    use time::OffsetDateTime;

    fn task(id: &str, scheduled_at: OffsetDateTime, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            category: Category::Work,
            scheduled_at,
            estimate_minutes: 30,
            repeat: RepeatMode::Weekdays,
            channels: NotifyChannels::default(),
            completed,
            created_at: scheduled_at,
        }
    }

    fn log(late_minutes: u64) -> LogEntry {
        LogEntry {
            id: format!("log-{late_minutes}"),
            task_id: "task-1".to_string(),
            title: "demo".to_string(),
            scheduled_at: datetime!(2025-12-20 09:00 UTC),
            outcome: Outcome {
                status: OutcomeStatus::Done,
                late_minutes,
                note: String::new(),
            },
            logged_at: datetime!(2025-12-20 09:00 UTC),
        }
    }

    #[test]
    fn summary_counts_only_todays_tasks() {
        let tasks = vec![
            task("morning", datetime!(2025-12-20 08:00 +01:00), true),
            task("evening", datetime!(2025-12-20 20:00 +01:00), false),
            task("tomorrow", datetime!(2025-12-21 08:00 +01:00), true),
            // 23:30 UTC on the 19th is already the 20th at +01:00.
            task("late-utc", datetime!(2025-12-19 23:30 UTC), true),
        ];

        let summary = day_summary(&tasks, &[], date!(2025 - 12 - 20), offset!(+1));

        assert_eq!(
            summary,
            DaySummary {
                scheduled_today: 3,
                completed_today: 2,
                late_minutes: 0,
            }
        );
    }

    #[test]
    fn summary_sums_lateness_over_recent_late_entries() {
        let mut logs: Vec<LogEntry> = (0..RECENT_LOG_WINDOW).map(|_| log(2)).collect();
        logs.push(log(100));

        let summary = day_summary(&[], &logs, date!(2025 - 12 - 20), offset!(UTC));

        assert_eq!(summary.late_minutes, 2 * RECENT_LOG_WINDOW as u64);
    }

    #[test]
    fn on_time_entries_do_not_push_late_ones_out_of_the_window() {
        let mut logs: Vec<LogEntry> = (0..RECENT_LOG_WINDOW).map(|_| log(0)).collect();
        logs.push(log(10));

        let summary = day_summary(&[], &logs, date!(2025 - 12 - 20), offset!(UTC));

        assert_eq!(summary.late_minutes, 10);
    }

    #[test]
    fn recent_logs_caps_window() {
        let logs: Vec<LogEntry> = (0..40).map(|_| log(0)).collect();
        assert_eq!(recent_logs(&logs).len(), RECENT_LOG_WINDOW);
        assert_eq!(recent_logs(&logs[..3]).len(), 3);
    }

    #[test]
    fn coach_thresholds() {
        let coach = HeuristicCoach;

        assert_eq!(coach.suggest(&[]), NO_HISTORY_SUGGESTION);
        assert_eq!(
            coach.suggest(&[log(0), log(4), log(7)]),
            ENCOURAGEMENT_SUGGESTION
        );
        assert_eq!(
            coach.suggest(&[log(1), log(4), log(0), log(7)]),
            SCHEDULING_SUGGESTION
        );
    }
}

//! Marking tasks complete.
//!
//! Completion is split in two steps so the caller can collect a lateness
//! reason between them: [`begin_completion`] measures lateness without
//! touching the store, [`finish_completion`] toggles the task and records the
//! log entry.

use crate::error::AppError;
use crate::model::{LogEntry, Outcome, OutcomeStatus, Task};
use crate::storage::Storage;
use crate::store::Store;
use time::OffsetDateTime;

/// Note recorded when a task is completed at or before its scheduled time.
pub const ON_TIME_NOTE: &str = "on time";

const MILLIS_PER_MINUTE: i128 = 60_000;

/// Whole minutes between `scheduled_at` and `completed_at`, rounded half up
/// and floored at zero.
pub fn lateness_minutes(scheduled_at: OffsetDateTime, completed_at: OffsetDateTime) -> u64 {
    let elapsed_ms = (completed_at - scheduled_at).whole_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }

    let minutes = (elapsed_ms + MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE;
    u64::try_from(minutes).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCompletion {
    pub task: Task,
    pub completed_at: OffsetDateTime,
    pub late_minutes: u64,
}

impl PendingCompletion {
    /// A reason is only asked for when the task is late.
    pub fn needs_reason(&self) -> bool {
        self.late_minutes > 0
    }
}

pub fn begin_completion<S: Storage>(
    store: &Store<S>,
    id: &str,
    now: OffsetDateTime,
) -> Result<PendingCompletion, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let task = store
        .task(trimmed_id)
        .ok_or_else(|| AppError::not_found(format!("task not found: {trimmed_id}")))?;
    if task.completed {
        return Err(AppError::invalid_input("task already completed"));
    }

    Ok(PendingCompletion {
        task: task.clone(),
        completed_at: now,
        late_minutes: lateness_minutes(task.scheduled_at, now),
    })
}

/// Toggles the task to completed, then prepends its log entry. `reason` is
/// ignored for on-time completions; a late completion without a reason gets
/// an empty note.
pub fn finish_completion<S: Storage>(
    store: &mut Store<S>,
    pending: PendingCompletion,
    reason: Option<&str>,
) -> Result<LogEntry, AppError> {
    let note = if pending.needs_reason() {
        reason.map(str::trim).unwrap_or_default().to_string()
    } else {
        ON_TIME_NOTE.to_string()
    };

    let toggled = store.toggle_completion(&pending.task.id)?;
    if !toggled.completed {
        // Completed in between the two steps; put it back and refuse.
        store.toggle_completion(&pending.task.id)?;
        return Err(AppError::invalid_input("task already completed"));
    }

    let entry = LogEntry {
        id: format!("log-{}", pending.completed_at.unix_timestamp_nanos()),
        task_id: pending.task.id.clone(),
        title: pending.task.title.clone(),
        scheduled_at: pending.task.scheduled_at,
        outcome: Outcome {
            status: OutcomeStatus::Done,
            late_minutes: pending.late_minutes,
            note,
        },
        logged_at: pending.completed_at,
    };
    store.append_log(entry.clone())?;

    tracing::info!(
        task_id = %entry.task_id,
        late_minutes = entry.outcome.late_minutes,
        "task completed"
    );
    Ok(entry)
}

/// Both steps at once, for callers that already know the reason.
pub fn complete_task<S: Storage>(
    store: &mut Store<S>,
    id: &str,
    now: OffsetDateTime,
    reason: Option<&str>,
) -> Result<LogEntry, AppError> {
    let pending = begin_completion(store, id, now)?;
    finish_completion(store, pending, reason)
}

/// Flips a completed task back to pending. The log keeps its entry.
pub fn reopen_task<S: Storage>(store: &mut Store<S>, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let task = store
        .task(trimmed_id)
        .ok_or_else(|| AppError::not_found(format!("task not found: {trimmed_id}")))?;
    if !task.completed {
        return Err(AppError::invalid_input("task is not completed"));
    }

    store.toggle_completion(trimmed_id)
}

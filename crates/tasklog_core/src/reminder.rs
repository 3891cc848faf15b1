//! Periodic scan for tasks that are about to start.

use crate::error::AppError;
use crate::model::Task;
use crate::notify::{Notifier, Permission};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const DEFAULT_SCAN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(20);
pub const DEFAULT_LOOKAHEAD: time::Duration = time::Duration::minutes(1);

/// Pending tasks scheduled on `now`'s calendar day (in `now`'s offset) and
/// within `[now, now + lookahead]`.
pub fn due_for_reminder(
    tasks: &[Task],
    now: OffsetDateTime,
    lookahead: time::Duration,
) -> Vec<&Task> {
    let today = now.date();
    let window_end = now + lookahead;

    tasks
        .iter()
        .filter(|task| !task.completed)
        .filter(|task| task.scheduled_at.to_offset(now.offset()).date() == today)
        .filter(|task| task.scheduled_at >= now && task.scheduled_at <= window_end)
        .collect()
}

/// `HH:MM` in the given offset.
pub fn format_clock(at: OffsetDateTime, offset: UtcOffset) -> String {
    let format = format_description!("[hour]:[minute]");
    let local = at.to_offset(offset);
    local
        .format(&format)
        .unwrap_or_else(|_| format!("{:02}:{:02}", local.hour(), local.minute()))
}

pub fn reminder_body(task: &Task, offset: UtcOffset) -> String {
    format!("{} at {}", task.title, format_clock(task.scheduled_at, offset))
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: String,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every task inside the window, whether or not it was shown.
    pub due: Vec<Task>,
    pub notified: Vec<String>,
    pub failures: Vec<NotificationFailure>,
}

pub struct ReminderScanner<N: Notifier> {
    notifier: N,
    permission: Permission,
    lookahead: time::Duration,
}

impl<N: Notifier> ReminderScanner<N> {
    /// Asks for permission once if the notifier has not decided yet. The
    /// answer is kept for the scanner's lifetime.
    pub fn new(notifier: N, lookahead: time::Duration) -> Self {
        let permission = match notifier.permission() {
            Permission::Undecided => notifier.request_permission(),
            decided => decided,
        };
        tracing::debug!(?permission, "reminder scanner ready");

        Self {
            notifier,
            permission,
            lookahead,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn scan(&self, tasks: &[Task], now: OffsetDateTime) -> ScanOutcome {
        let due = due_for_reminder(tasks, now, self.lookahead);
        let mut outcome = ScanOutcome {
            due: due.iter().map(|task| (*task).clone()).collect(),
            ..ScanOutcome::default()
        };

        if self.permission != Permission::Granted {
            return outcome;
        }

        for task in due {
            let body = reminder_body(task, now.offset());
            match self.notifier.show(crate::notify::APP_NAME, &body) {
                Ok(()) => outcome.notified.push(task.id.clone()),
                Err(error) => {
                    tracing::warn!(task_id = %task.id, %error, "reminder notification failed");
                    outcome.failures.push(NotificationFailure {
                        task_id: task.id.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }
}

/// Fixed-interval tick source backed by a thread that does nothing but wait.
/// Dropping the ticker stops and joins the thread.
pub struct Ticker {
    ticks: Receiver<()>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(interval: std::time::Duration) -> Result<Self, AppError> {
        let (tick_tx, tick_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("tasklog-ticker".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if tick_tx.send(()).is_err() {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            ticks: tick_rx,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Blocks until the next tick. Returns `false` once the ticker has stopped.
    pub fn wait(&self) -> bool {
        self.ticks.recv().is_ok()
    }

    pub fn stop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            join_ticker(handle);
        }
    }
}

/// Returns `false` when the thread panicked; the panic is logged, not raised.
fn join_ticker(handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!("reminder ticker thread panicked");
            false
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

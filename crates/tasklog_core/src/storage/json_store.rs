use crate::error::AppError;
use crate::model::{LogEntry, Task};
use crate::storage::Storage;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const TASKS_KEY: &str = "tasks";
pub const LOGS_KEY: &str = "logs";

pub fn load_tasks<S: Storage>(storage: &S) -> Vec<Task> {
    load_or_default(storage, TASKS_KEY)
}

pub fn load_logs<S: Storage>(storage: &S) -> Vec<LogEntry> {
    load_or_default(storage, LOGS_KEY)
}

pub fn save_tasks<S: Storage>(storage: &S, tasks: &[Task]) -> Result<(), AppError> {
    save(storage, TASKS_KEY, tasks)
}

pub fn save_logs<S: Storage>(storage: &S, logs: &[LogEntry]) -> Result<(), AppError> {
    save(storage, LOGS_KEY, logs)
}

// Absent, unreadable and corrupt records all read back as an empty list.
fn load_or_default<S, T>(storage: &S, key: &str) -> Vec<T>
where
    S: Storage,
    T: DeserializeOwned,
{
    let content = match storage.read(key) {
        Ok(Some(content)) => content,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::debug!(key, error = %err, "storage read failed, using empty list");
            return Vec::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(err) => {
            tracing::debug!(key, error = %err, "stored record is not valid, using empty list");
            Vec::new()
        }
    }
}

fn save<S, T>(storage: &S, key: &str, items: &[T]) -> Result<(), AppError>
where
    S: Storage,
    T: Serialize,
{
    let content = serde_json::to_string_pretty(items)?;
    storage.write(key, &content)?;
    tracing::debug!(key, count = items.len(), "persisted");
    Ok(())
}

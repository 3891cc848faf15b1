use crate::error::AppError;
use crate::model::{LogEntry, Task};
use crate::storage::Storage;
use crate::storage::json_store;

/// Owns the task list and the completion log. Every mutation writes the
/// affected list back to storage before returning; a failed write leaves
/// the in-memory lists as they were.
#[derive(Debug)]
pub struct Store<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
    logs: Vec<LogEntry>,
}

impl<S: Storage> Store<S> {
    pub fn open(storage: S) -> Self {
        let tasks = json_store::load_tasks(&storage);
        let logs = json_store::load_logs(&storage);
        tracing::debug!(tasks = tasks.len(), logs = logs.len(), "store opened");
        Self {
            storage,
            tasks,
            logs,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Log entries, most recent first.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Re-reads both lists from storage, dropping the in-memory copies.
    pub fn reload(&mut self) {
        self.tasks = json_store::load_tasks(&self.storage);
        self.logs = json_store::load_logs(&self.storage);
    }

    pub fn add(&mut self, task: Task) -> Result<&Task, AppError> {
        if task.title.trim().is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }
        if self.task(&task.id).is_some() {
            return Err(AppError::invalid_input(format!(
                "task id already exists: {}",
                task.id
            )));
        }

        tracing::debug!(id = %task.id, "adding task");
        self.tasks.push(task);
        if let Err(err) = json_store::save_tasks(&self.storage, &self.tasks) {
            self.tasks.pop();
            return Err(err);
        }

        let index = self.tasks.len() - 1;
        Ok(&self.tasks[index])
    }

    pub fn toggle_completion(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task not found: {id}")))?;

        self.tasks[index].completed = !self.tasks[index].completed;
        if let Err(err) = json_store::save_tasks(&self.storage, &self.tasks) {
            self.tasks[index].completed = !self.tasks[index].completed;
            return Err(err);
        }

        let updated = self.tasks[index].clone();
        tracing::debug!(id, completed = updated.completed, "toggled completion");
        Ok(updated)
    }

    /// Removes a task. Log entries that reference it are left untouched.
    pub fn remove(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task not found: {id}")))?;

        let removed = self.tasks.remove(index);
        if let Err(err) = json_store::save_tasks(&self.storage, &self.tasks) {
            self.tasks.insert(index, removed);
            return Err(err);
        }

        tracing::debug!(id, "removed task");
        Ok(removed)
    }

    pub fn append_log(&mut self, entry: LogEntry) -> Result<(), AppError> {
        tracing::debug!(id = %entry.id, task_id = %entry.task_id, "appending log entry");
        self.logs.insert(0, entry);
        if let Err(err) = json_store::save_logs(&self.storage, &self.logs) {
            self.logs.remove(0);
            return Err(err);
        }
        Ok(())
    }
}

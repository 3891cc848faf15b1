use crate::model::{Category, Task};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub category: Option<Category>,
    pub search: String,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(category) = self.category
            && task.category != category
        {
            return false;
        }

        let needle = self.search.to_lowercase();
        needle.is_empty() || task.title.to_lowercase().contains(&needle)
    }
}

/// The visible list: category filter, then title search, then ascending
/// schedule. Ties keep their stored order.
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|task| filter.matches(task)).collect();
    visible.sort_by_key(|task| task.scheduled_at);
    visible
}

use crate::config::Config;
use crate::error::AppError;
use crate::filter::{TaskFilter, visible_tasks};
use crate::model::{Category, NotifyChannels, RepeatMode, Task};
use crate::storage::{self, FileStorage, Storage};
use crate::store::Store;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// User input for a new task, before an id and creation time are assigned.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub category: Category,
    pub scheduled_at: OffsetDateTime,
    pub estimate_minutes: u32,
    pub repeat: RepeatMode,
    pub channels: NotifyChannels,
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn now_local(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

pub fn open_store(config: &Config) -> Result<Store<FileStorage>, AppError> {
    let dir = storage::data_dir(config.data_dir.as_deref())?;
    tracing::debug!(dir = %dir.display(), "opening store");
    Ok(Store::open(FileStorage::new(dir)))
}

/// Accepts RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` / `YYYY-MM-DD` read in
/// `offset`. A bare date means midnight.
pub fn parse_datetime(raw: &str, offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("datetime is required"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    let with_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, &with_seconds) {
        return Ok(parsed.assume_offset(offset));
    }

    let with_minutes = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, &with_minutes) {
        return Ok(parsed.assume_offset(offset));
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(trimmed, &date_only) {
        return Ok(date.midnight().assume_offset(offset));
    }

    Err(AppError::invalid_input(
        "datetime must be RFC3339, YYYY-MM-DD HH:MM[:SS] or YYYY-MM-DD",
    ))
}

pub fn new_task(draft: TaskDraft, now: OffsetDateTime) -> Result<Task, AppError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }

    Ok(Task {
        id: format!("task-{}", now.unix_timestamp_nanos()),
        title: title.to_string(),
        category: draft.category,
        scheduled_at: draft.scheduled_at,
        estimate_minutes: draft.estimate_minutes,
        repeat: draft.repeat,
        channels: draft.channels,
        completed: false,
        created_at: now,
    })
}

pub fn add_task<S: Storage>(
    store: &mut Store<S>,
    draft: TaskDraft,
    now: OffsetDateTime,
) -> Result<Task, AppError> {
    let task = new_task(draft, now)?;
    Ok(store.add(task)?.clone())
}

pub fn list_tasks<S: Storage>(store: &Store<S>, filter: &TaskFilter) -> Vec<Task> {
    visible_tasks(store.tasks(), filter)
        .into_iter()
        .cloned()
        .collect()
}

pub fn remove_task<S: Storage>(store: &mut Store<S>, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    store.remove(trimmed_id)
}

pub fn get_task_by_id<S: Storage>(store: &Store<S>, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    store
        .task(trimmed_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("task not found: {trimmed_id}")))
}

#[cfg(test)]
mod tests {
    use super::{
        TaskDraft, add_task, get_task_by_id, list_tasks, new_task, parse_datetime, remove_task,
    };
    use crate::completion::complete_task;
    use crate::filter::TaskFilter;
    use crate::model::{Category, NotifyChannels, RepeatMode};
    use crate::storage::{MemoryStorage, json_store};
    use crate::store::Store;
    use time::macros::{datetime, offset};
    use time::{Duration, OffsetDateTime};

    fn draft(title: &str, scheduled_at: OffsetDateTime) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            category: Category::Health,
            scheduled_at,
            estimate_minutes: 5,
            repeat: RepeatMode::None,
            channels: NotifyChannels::default(),
        }
    }

    #[test]
    fn parse_datetime_accepts_supported_shapes() {
        let plus_two = offset!(+2);

        assert_eq!(
            parse_datetime("2025-12-20T09:00:00Z", plus_two).unwrap(),
            datetime!(2025-12-20 09:00 UTC)
        );
        assert_eq!(
            parse_datetime("2025-12-20 09:15", plus_two).unwrap(),
            datetime!(2025-12-20 09:15 +02:00)
        );
        assert_eq!(
            parse_datetime(" 2025-12-20 09:15:30 ", plus_two).unwrap(),
            datetime!(2025-12-20 09:15:30 +02:00)
        );
        assert_eq!(
            parse_datetime("2025-12-20", plus_two).unwrap(),
            datetime!(2025-12-20 00:00 +02:00)
        );
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        assert_eq!(
            parse_datetime("tomorrow-ish", offset!(UTC)).unwrap_err().code(),
            "invalid_input"
        );
        assert_eq!(
            parse_datetime("   ", offset!(UTC)).unwrap_err().code(),
            "invalid_input"
        );
    }

    #[test]
    fn new_task_trims_title_and_starts_pending() {
        let now = datetime!(2025-12-20 08:00 UTC);
        let task = new_task(draft("  Drink Water ", now), now).unwrap();

        assert_eq!(task.title, "Drink Water");
        assert!(task.id.starts_with("task-"));
        assert!(!task.completed);
        assert_eq!(task.created_at, now);
    }

    #[test]
    fn add_task_rejects_blank_title_without_writing() {
        let mut store = Store::open(MemoryStorage::new());
        let now = datetime!(2025-12-20 08:00 UTC);

        let err = add_task(&mut store, draft(" ", now), now).unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn drink_water_scenario() {
        let mut store = Store::open(MemoryStorage::new());
        let t = datetime!(2025-12-20 08:00 +01:00);

        let task = add_task(&mut store, draft("Drink Water", t), t - Duration::hours(1)).unwrap();
        let entry = complete_task(&mut store, &task.id, t + Duration::minutes(5), None).unwrap();

        assert_eq!(entry.outcome.late_minutes, 5);
        assert_eq!(entry.outcome.status.as_str(), "done");
        assert_eq!(entry.outcome.note, "");
        assert!(get_task_by_id(&store, &task.id).unwrap().completed);
    }

    #[test]
    fn list_tasks_reflects_adds_and_removals() {
        let mut store = Store::open(MemoryStorage::new());
        let base = datetime!(2025-12-20 08:00 UTC);

        let late = add_task(&mut store, draft("B", base + Duration::hours(2)), base).unwrap();
        let early = add_task(
            &mut store,
            draft("A", base + Duration::hours(1)),
            base + Duration::seconds(1),
        )
        .unwrap();
        let gone = add_task(
            &mut store,
            draft("C", base),
            base + Duration::seconds(2),
        )
        .unwrap();
        remove_task(&mut store, &gone.id).unwrap();

        let listed: Vec<String> = list_tasks(&store, &TaskFilter::default())
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(listed, vec![early.id.clone(), late.id.clone()]);

        let searched = list_tasks(
            &store,
            &TaskFilter {
                category: None,
                search: "a".to_string(),
            },
        );
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].title, "A");

        assert_eq!(json_store::load_tasks(store.storage()).len(), 2);
    }

    #[test]
    fn get_and_remove_reject_blank_or_unknown_ids() {
        let mut store = Store::open(MemoryStorage::new());

        assert_eq!(get_task_by_id(&store, " ").unwrap_err().code(), "invalid_input");
        assert_eq!(get_task_by_id(&store, "task-1").unwrap_err().code(), "not_found");
        assert_eq!(remove_task(&mut store, "").unwrap_err().code(), "invalid_input");
        assert_eq!(remove_task(&mut store, "task-1").unwrap_err().code(), "not_found");
    }
}

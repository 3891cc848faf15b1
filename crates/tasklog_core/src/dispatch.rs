//! Reminder delivery through external channels.
//!
//! Only [`LoggingBackend`] exists: it records what would have been sent and
//! acknowledges without delivering. A real email or messaging service plugs
//! in by implementing [`ReminderBackend`].

use crate::error::AppError;
use crate::model::Task;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Messaging,
    Push,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Messaging => "messaging",
            Self::Push => "push",
        }
    }

    /// Channels switched on for `task`, in a fixed order.
    pub fn enabled_for(task: &Task) -> Vec<Channel> {
        let mut channels = Vec::new();
        if task.channels.email {
            channels.push(Self::Email);
        }
        if task.channels.messaging {
            channels.push(Self::Messaging);
        }
        if task.channels.push {
            channels.push(Self::Push);
        }
        channels
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "messaging" | "message" | "sms" => Ok(Self::Messaging),
            "push" => Ok(Self::Push),
            other => Err(AppError::invalid_input(format!(
                "unknown channel '{other}' (expected email, messaging or push)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderPayload {
    pub task_id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_time: OffsetDateTime,
}

impl From<&Task> for ReminderPayload {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            scheduled_time: task.scheduled_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub channel: Channel,
    pub delivered: bool,
    pub detail: String,
}

pub trait ReminderBackend {
    fn send(&self, channel: Channel, payload: &ReminderPayload) -> Result<Ack, AppError>;
}

pub struct LoggingBackend;

impl ReminderBackend for LoggingBackend {
    fn send(&self, channel: Channel, payload: &ReminderPayload) -> Result<Ack, AppError> {
        let body = serde_json::to_string(payload)?;
        tracing::info!(%channel, %body, "reminder dispatch is not connected, payload logged");
        Ok(Ack {
            channel,
            delivered: false,
            detail: format!("{channel} delivery is not configured; payload {body}"),
        })
    }
}

pub fn send_reminder<B: ReminderBackend + ?Sized>(
    backend: &B,
    task: &Task,
    channel: Channel,
) -> Result<Ack, AppError> {
    backend.send(channel, &ReminderPayload::from(task))
}

pub fn send_enabled_reminders<B: ReminderBackend + ?Sized>(
    backend: &B,
    task: &Task,
) -> Result<Vec<Ack>, AppError> {
    let payload = ReminderPayload::from(task);
    Channel::enabled_for(task)
        .into_iter()
        .map(|channel| backend.send(channel, &payload))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        Ack, Channel, LoggingBackend, ReminderBackend, ReminderPayload, send_enabled_reminders,
        send_reminder,
    };
    use crate::error::AppError;
    use crate::model::{Category, NotifyChannels, RepeatMode, Task};
    use std::cell::RefCell;
    use time::macros::datetime;

    fn task(channels: NotifyChannels) -> Task {
        Task {
            id: "task-1".to_string(),
            title: "Pay rent".to_string(),
            category: Category::Personal,
            scheduled_at: datetime!(2025-12-20 09:00 UTC),
            estimate_minutes: 10,
            repeat: RepeatMode::None,
            channels,
            completed: false,
            created_at: datetime!(2025-12-19 09:00 UTC),
        }
    }

    #[test]
    fn logging_backend_acknowledges_without_delivering() {
        let ack = send_reminder(&LoggingBackend, &task(NotifyChannels::default()), Channel::Email)
            .unwrap();

        assert_eq!(ack.channel, Channel::Email);
        assert!(!ack.delivered);
        assert!(ack.detail.contains("\"task_id\":\"task-1\""));
        assert!(ack.detail.contains("Pay rent"));
    }

    #[derive(Default)]
    struct RecordingBackend {
        sent: RefCell<Vec<(Channel, ReminderPayload)>>,
    }

    impl ReminderBackend for RecordingBackend {
        fn send(&self, channel: Channel, payload: &ReminderPayload) -> Result<Ack, AppError> {
            self.sent.borrow_mut().push((channel, payload.clone()));
            Ok(Ack {
                channel,
                delivered: true,
                detail: String::new(),
            })
        }
    }

    #[test]
    fn enabled_channels_each_get_one_payload() {
        let backend = RecordingBackend::default();
        let task = task(NotifyChannels {
            email: true,
            messaging: false,
            push: true,
        });

        let acks = send_enabled_reminders(&backend, &task).unwrap();

        assert_eq!(acks.len(), 2);
        let sent = backend.sent.borrow();
        assert_eq!(sent[0].0, Channel::Email);
        assert_eq!(sent[1].0, Channel::Push);
        assert_eq!(sent[0].1.task_id, "task-1");
        assert_eq!(sent[0].1.scheduled_time, task.scheduled_at);
    }

    #[test]
    fn channel_parses_aliases() {
        assert_eq!("SMS".parse::<Channel>().unwrap(), Channel::Messaging);
        assert_eq!("email".parse::<Channel>().unwrap(), Channel::Email);
        assert_eq!("fax".parse::<Channel>().unwrap_err().code(), "invalid_input");
    }
}

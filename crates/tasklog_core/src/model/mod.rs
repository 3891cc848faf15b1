mod log;
mod task;

pub use log::{LogEntry, Outcome, OutcomeStatus};
pub use task::{Category, NotifyChannels, RepeatMode, Task};

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasklog_core::config::ConfigOverrides;
use tasklog_core::dispatch::Channel;
use tasklog_core::model::{Category, RepeatMode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Personal task tracker with reminders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasklog add "Drink water" --at "2025-12-20 09:00" --category health
    Add {
        title: Option<String>,
        /// Scheduled time: RFC3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD" (local time)
        #[arg(long, value_name = "DATETIME")]
        at: String,
        #[arg(long, default_value = "personal")]
        category: Category,
        /// Estimated duration in minutes
        #[arg(long, default_value_t = 0)]
        estimate: u32,
        /// Stored with the task; repeating tasks are not expanded
        #[arg(long, default_value = "none")]
        repeat: RepeatMode,
        #[arg(long)]
        email: bool,
        #[arg(long)]
        messaging: bool,
        #[arg(long)]
        push: bool,
    },
    /// List tasks ordered by scheduled time
    ///
    /// Example: tasklog list --category work --search standup
    List {
        #[arg(long)]
        category: Option<Category>,
        /// Case-insensitive title search
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Mark a task as completed
    ///
    /// Late tasks ask for a reason on stdin unless --reason is given.
    /// Example: tasklog done task-1 --reason "bus was late"
    Done {
        id: String,
        #[arg(short, long, value_name = "TEXT")]
        reason: Option<String>,
    },
    /// Mark a completed task as pending again
    ///
    /// Example: tasklog reopen task-1
    Reopen {
        id: String,
    },
    /// Delete a task; its log entries are kept
    ///
    /// Example: tasklog remove task-1
    Remove {
        id: String,
    },
    /// Show completion log, most recent first
    ///
    /// Example: tasklog log
    Log,
    /// Show today's summary and a suggestion
    ///
    /// Example: tasklog insights
    Insights,
    /// Send a reminder for a task through an external channel
    ///
    /// Without --channel every channel enabled on the task is used.
    /// Example: tasklog remind task-1 --channel email
    Remind {
        id: String,
        #[arg(long)]
        channel: Option<Channel>,
    },
    /// Scan for upcoming tasks and show desktop reminders
    ///
    /// Example: tasklog watch
    /// Example: tasklog watch --ticks 3
    Watch {
        /// Stop after this many scans
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    DataDir,
    ScanIntervalSecs,
    LookaheadSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "data_dir" => ConfigOverrideTarget::DataDir,
        "scan_interval_secs" | "scan_interval" => ConfigOverrideTarget::ScanIntervalSecs,
        "lookahead_secs" | "lookahead" => ConfigOverrideTarget::LookaheadSecs,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds raw override arguments into one set; later values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for item in raw {
        let parsed = parse_config_override(item)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::DataDir => {
                if parsed.value.is_empty() {
                    return Err("data_dir override cannot be empty".to_string());
                }
                overrides.data_dir = Some(PathBuf::from(parsed.value));
            }
            ConfigOverrideTarget::ScanIntervalSecs => {
                overrides.scan_interval_secs = Some(parse_seconds(&parsed.value)?);
            }
            ConfigOverrideTarget::LookaheadSecs => {
                overrides.lookahead_secs = Some(parse_seconds(&parsed.value)?);
            }
        }
    }

    Ok(overrides)
}

fn parse_seconds(value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("expected a whole number of seconds, got '{value}'"))
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

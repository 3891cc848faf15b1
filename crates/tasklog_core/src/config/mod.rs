use crate::error::AppError;
use crate::reminder::{DEFAULT_LOOKAHEAD, DEFAULT_SCAN_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "tasklog";
const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKLOG_CONFIG_PATH";

const RESET: &str = "\x1b[0m";

/// ANSI colours used by the plain-text output. Empty codes mean no colour.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
}

impl Palette {
    fn paint(code: &str, text: &str) -> String {
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{code}{text}{RESET}")
        }
    }

    pub fn accentize(&self, text: &str) -> String {
        Self::paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        Self::paint(self.muted, text)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Plain,
    Noir,
    Solarized,
}

impl Theme {
    /// Case, spacing and punctuation are ignored. Unknown names are plain.
    pub fn from_name(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "noir" | "dark" | "darkmode" => Self::Noir,
            "solarized" => Self::Solarized,
            _ => Self::Plain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Noir => "noir",
            Self::Solarized => "solarized",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Plain => Palette {
                accent: "",
                muted: "",
            },
            Self::Noir => Palette {
                accent: "\x1b[38;5;208m",
                muted: "\x1b[38;5;250m",
            },
            Self::Solarized => Palette {
                accent: "\x1b[38;5;108m",
                muted: "\x1b[38;5;246m",
            },
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    theme.map(Theme::from_name).unwrap_or_default().palette()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub scan_interval_secs: Option<u64>,
    #[serde(default)]
    pub lookahead_secs: Option<u64>,
}

impl Config {
    pub fn scan_interval(&self) -> std::time::Duration {
        match self.scan_interval_secs {
            Some(secs) if secs > 0 => std::time::Duration::from_secs(secs),
            _ => DEFAULT_SCAN_INTERVAL,
        }
    }

    pub fn lookahead(&self) -> time::Duration {
        match self.lookahead_secs {
            Some(secs) => time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)),
            None => DEFAULT_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub scan_interval_secs: Option<u64>,
    pub lookahead_secs: Option<u64>,
}

/// Per-user application directory; holds the config file and, unless
/// overridden, the data files.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

/// Never fails: problems are reported in `error` next to default values.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path().and_then(|path| read_config(&path)) {
        Ok(config) => ConfigLoad {
            config: config.unwrap_or_default(),
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

/// `None` when no file exists at `path`.
fn read_config(path: &Path) -> Result<Option<Config>, AppError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(AppError::io(format!("{}: {err}", path.display()))),
    };

    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {err}", path.display()))
    })?;
    config.theme = config
        .theme
        .map(|name| Theme::from_name(&name).as_str().to_string());
    Ok(Some(config))
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref() {
        merged.theme = Some(Theme::from_name(theme).as_str().to_string());
    }
    if let Some(dir) = overrides.data_dir.as_ref() {
        merged.data_dir = Some(dir.clone());
    }
    if let Some(secs) = overrides.scan_interval_secs {
        merged.scan_interval_secs = Some(secs);
    }
    if let Some(secs) = overrides.lookahead_secs {
        merged.lookahead_secs = Some(secs);
    }

    merged
}

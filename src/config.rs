//! Configuration loading.
//!
//! Settings are layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attributes)
//! 3. TOML config file (`~/.config/tasklet/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that cannot be read is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::cli::Cli;
use crate::notify::Permission;
use crate::reminder::DEFAULT_TITLE;
use crate::schedule::DEFAULT_PERIOD;
use crate::sync::STORAGE_KEY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A reminder interval of zero would spin.
    #[error("reminders.check_interval_secs must be at least 1")]
    ZeroInterval,

    /// `ui.timestamp_format` is not a valid chrono format string.
    #[error("ui.timestamp_format {0:?} is not a valid time format")]
    TimestampFormat(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    reminders: RemindersFileConfig,
    ui: UiFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemindersFileConfig {
    check_interval_secs: Option<u64>,
    title: Option<String>,
    permission: Option<Permission>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    timestamp_format: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the task payload.
    pub data_dir: PathBuf,
    /// Storage key for the task list.
    pub storage_key: String,
    /// Time between reminder checks.
    pub check_interval: Duration,
    /// Title used for reminder notifications.
    pub notification_title: String,
    /// Notification permission before any request is made.
    pub permission: Permission,
    /// Input poll timeout for the TUI loop.
    pub poll_timeout: Duration,
    /// chrono format for absolute reminder times.
    pub timestamp_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            storage_key: STORAGE_KEY.to_string(),
            check_interval: DEFAULT_PERIOD,
            notification_title: DEFAULT_TITLE.to_string(),
            permission: Permission::Default,
            poll_timeout: Duration::from_millis(50),
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl Config {
    /// Load the config file named by `cli` (or the default one) and merge.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    fn resolve(cli: &Cli, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let check_interval = file
            .reminders
            .check_interval_secs
            .map_or(defaults.check_interval, Duration::from_secs);
        if check_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        let timestamp_format = file
            .ui
            .timestamp_format
            .clone()
            .unwrap_or(defaults.timestamp_format);
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::TimestampFormat(timestamp_format));
        }

        Ok(Config {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.storage.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            storage_key: file.storage.key.clone().unwrap_or(defaults.storage_key),
            check_interval,
            notification_title: file
                .reminders
                .title
                .clone()
                .unwrap_or(defaults.notification_title),
            permission: cli
                .notifications
                .or(file.reminders.permission)
                .unwrap_or(defaults.permission),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            timestamp_format,
        })
    }
}

/// `~/.local/share/tasklet`, or `./.tasklet` when no data dir is known.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tasklet"))
        .unwrap_or_else(|| PathBuf::from(".tasklet"))
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("tasklet").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["tasklet"];
        argv.extend_from_slice(args);
        argv.push("list");
        Cli::parse_from(argv)
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.storage_key, "todos");
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.notification_title, "Reminder");
        assert_eq!(config.permission, Permission::Default);
        assert_eq!(config.poll_timeout, Duration::from_millis(50));
    }

    #[test]
    fn toml_parsing_full() {
        let toml_str = r#"
[storage]
data_dir = "/tmp/tasks"
key = "work"

[reminders]
check_interval_secs = 30
title = "Heads up"
permission = "denied"

[ui]
poll_timeout_ms = 100
timestamp_format = "%d/%m %H:%M"
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        let config = Config::resolve(&cli(&[]), &file).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/tasks"));
        assert_eq!(config.storage_key, "work");
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.notification_title, "Heads up");
        assert_eq!(config.permission, Permission::Denied);
        assert_eq!(config.poll_timeout, Duration::from_millis(100));
        assert_eq!(config.timestamp_format, "%d/%m %H:%M");
    }

    #[test]
    fn toml_parsing_empty() {
        let file: ConfigFile = toml::from_str("").unwrap();
        let config = Config::resolve(&cli(&[]), &file).unwrap();
        assert_eq!(config.storage_key, "todos");
        assert_eq!(config.check_interval, Duration::from_secs(60));
    }

    #[test]
    fn cli_overrides_file() {
        let file: ConfigFile = toml::from_str(
            r#"
[storage]
data_dir = "/from/file"
[reminders]
permission = "denied"
"#,
        )
        .unwrap();
        let config = Config::resolve(
            &cli(&["--data-dir", "/from/cli", "--notifications", "granted"]),
            &file,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/cli"));
        assert_eq!(config.permission, Permission::Granted);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let file: ConfigFile = toml::from_str("[reminders]\ncheck_interval_secs = 0").unwrap();
        assert!(matches!(
            Config::resolve(&cli(&[]), &file),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn invalid_timestamp_format_is_rejected() {
        let file: ConfigFile = toml::from_str("[ui]\ntimestamp_format = \"%Q %H\"").unwrap();
        assert!(matches!(
            Config::resolve(&cli(&[]), &file),
            Err(ConfigError::TimestampFormat(f)) if f == "%Q %H"
        ));
    }

    #[test]
    fn explicit_missing_config_file_returns_error() {
        let result = load_config_file(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn unparseable_config_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reminders\n").unwrap();
        assert!(matches!(
            load_config_file(Some(&path)),
            Err(ConfigError::ParseToml(_))
        ));
    }
}

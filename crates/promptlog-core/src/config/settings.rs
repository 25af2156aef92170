//! Settings model: the resolved `Config` and the partial layers it is built from

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use super::error::{ConfigError, ConfigResult};
use crate::logging::LogLevel;

/// Default root folder for log files, relative to the working directory
pub const DEFAULT_LOG_DIR: &str = "debug_logs";

/// Message layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single line per record
    Plain,
    /// Message framed by asterisk rules
    Pretty,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Plain
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Plain => "plain",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(LogFormat::Plain),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Effective logging configuration.
///
/// Built once by [`ConfigResolver`](crate::resolver::ConfigResolver) and
/// passed by value into each logger. Never mutated after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Minimum level a logger emits unless overridden at construction
    pub log_level: LogLevel,
    /// Root folder for generated log files
    pub log_dir: PathBuf,
    /// Plain or pretty message layout
    pub format: LogFormat,
    /// Write records to the console
    pub console_enabled: bool,
    /// Write records to a generated log file
    pub file_enabled: bool,
    /// Size cap for the log root, enforced by [`crate::maintenance::prune_to_size`]
    pub max_log_dir_mb: Option<f64>,
    /// Folder count above which log folders move to the overflow folder
    pub max_log_folders: Option<usize>,
    /// Remove empty log files and folders when maintenance runs at startup
    pub cleanup_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            format: LogFormat::Plain,
            console_enabled: true,
            file_enabled: false,
            max_log_dir_mb: None,
            max_log_folders: None,
            cleanup_on_start: false,
        }
    }
}

/// A recognized configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    LogLevel,
    LogDir,
    Format,
    ConsoleEnabled,
    FileEnabled,
    MaxLogDirMb,
    MaxLogFolders,
    CleanupOnStart,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::LogLevel,
        SettingKey::LogDir,
        SettingKey::Format,
        SettingKey::ConsoleEnabled,
        SettingKey::FileEnabled,
        SettingKey::MaxLogDirMb,
        SettingKey::MaxLogFolders,
        SettingKey::CleanupOnStart,
    ];

    /// Key name as written in the YAML file
    pub fn name(&self) -> &'static str {
        match self {
            SettingKey::LogLevel => "log_level",
            SettingKey::LogDir => "log_dir",
            SettingKey::Format => "format",
            SettingKey::ConsoleEnabled => "console_enabled",
            SettingKey::FileEnabled => "file_enabled",
            SettingKey::MaxLogDirMb => "max_log_dir_mb",
            SettingKey::MaxLogFolders => "max_log_folders",
            SettingKey::CleanupOnStart => "cleanup_on_start",
        }
    }

    /// Environment variable that overrides this key
    pub fn env_var(&self) -> &'static str {
        match self {
            SettingKey::LogLevel => "LOG_LEVEL",
            SettingKey::LogDir => "LOG_DIR",
            SettingKey::Format => "LOG_FORMAT",
            SettingKey::ConsoleEnabled => "LOG_CONSOLE_ENABLED",
            SettingKey::FileEnabled => "LOG_FILE_ENABLED",
            SettingKey::MaxLogDirMb => "LOG_MAX_DIR_MB",
            SettingKey::MaxLogFolders => "LOG_MAX_FOLDERS",
            SettingKey::CleanupOnStart => "LOG_CLEANUP_ON_START",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Where a resolved setting came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingSource {
    Default,
    File,
    Env,
}

impl SettingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingSource::Default => "default",
            SettingSource::File => "file",
            SettingSource::Env => "env",
        }
    }
}

/// One layer of configuration: only the keys it defines are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_log_dir_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_log_folders: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_on_start: Option<bool>,
}

impl ConfigLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` for `key` and store it in this layer.
    ///
    /// On error the layer is left unchanged for that key.
    pub fn set(&mut self, key: SettingKey, raw: &str) -> ConfigResult<()> {
        match key {
            SettingKey::LogLevel => self.log_level = Some(raw.parse()?),
            SettingKey::LogDir => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(invalid(key, raw, "path is empty"));
                }
                self.log_dir = Some(PathBuf::from(trimmed));
            }
            SettingKey::Format => self.format = Some(raw.parse()?),
            SettingKey::ConsoleEnabled => self.console_enabled = Some(parse_bool(key, raw)?),
            SettingKey::FileEnabled => self.file_enabled = Some(parse_bool(key, raw)?),
            SettingKey::MaxLogDirMb => {
                let mb: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseFloatError| invalid(key, raw, &e.to_string()))?;
                if !mb.is_finite() || mb <= 0.0 {
                    return Err(invalid(key, raw, "must be a positive number"));
                }
                self.max_log_dir_mb = Some(mb);
            }
            SettingKey::MaxLogFolders => {
                let n: usize = raw
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(key, raw, &e.to_string()))?;
                self.max_log_folders = Some(n);
            }
            SettingKey::CleanupOnStart => self.cleanup_on_start = Some(parse_bool(key, raw)?),
        }
        Ok(())
    }

    /// Whether this layer defines `key`
    pub fn is_set(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::LogLevel => self.log_level.is_some(),
            SettingKey::LogDir => self.log_dir.is_some(),
            SettingKey::Format => self.format.is_some(),
            SettingKey::ConsoleEnabled => self.console_enabled.is_some(),
            SettingKey::FileEnabled => self.file_enabled.is_some(),
            SettingKey::MaxLogDirMb => self.max_log_dir_mb.is_some(),
            SettingKey::MaxLogFolders => self.max_log_folders.is_some(),
            SettingKey::CleanupOnStart => self.cleanup_on_start.is_some(),
        }
    }

    /// Overwrite the keys this layer defines, leaving the rest of `config` alone
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(enabled) = self.console_enabled {
            config.console_enabled = enabled;
        }
        if let Some(enabled) = self.file_enabled {
            config.file_enabled = enabled;
        }
        if let Some(mb) = self.max_log_dir_mb {
            config.max_log_dir_mb = Some(mb);
        }
        if let Some(n) = self.max_log_folders {
            config.max_log_folders = Some(n);
        }
        if let Some(cleanup) = self.cleanup_on_start {
            config.cleanup_on_start = cleanup;
        }
    }
}

fn parse_bool(key: SettingKey, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected a boolean")),
    }
}

fn invalid(key: SettingKey, raw: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.name(),
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

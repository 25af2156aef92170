//! Configuration errors and load warnings

use std::path::PathBuf;

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level '{0}' (expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL)")]
    InvalidLevel(String),

    #[error("Invalid log format '{0}' (expected plain or pretty)")]
    InvalidFormat(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Recoverable problems met while loading configuration.
///
/// These never fail resolution; the affected key (or the whole file) falls
/// back to the previous layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("could not read config file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("config file {path} is not a YAML mapping: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("ignoring {origin} value for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        origin: &'static str,
        reason: String,
    },

    #[error("ignoring unknown config key '{0}'")]
    UnknownKey(String),
}

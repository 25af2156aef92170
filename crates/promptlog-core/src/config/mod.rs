//! Configuration model and sources
//!
//! Sources, lowest precedence first:
//! - built-in defaults (`Config::default()`)
//! - `FileConfigProvider`: YAML file (workspace, user or explicit path)
//! - `EnvOverrides`: `LOG_*` environment variables

mod error;
mod settings;
mod file;
mod env;

pub use error::{ConfigError, ConfigResult, ConfigWarning};
pub use settings::{Config, ConfigLayer, LogFormat, SettingKey, SettingSource, DEFAULT_LOG_DIR};
pub use file::{FileConfigProvider, FileLoad, ConfigLevel, WORKSPACE_FILE_NAMES};
pub use env::{EnvOverrides, CONFIG_PATH_ENV};

//! File-based configuration (YAML)
//!
//! Supports a workspace-level file (`./promptlog.yaml` or `./config.yaml`)
//! and a user-level file (`~/.config/promptlog/config.yaml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use super::error::{ConfigResult, ConfigWarning};
use super::settings::{ConfigLayer, SettingKey};

/// File names probed in the working directory, in order
pub const WORKSPACE_FILE_NAMES: [&str; 2] = ["promptlog.yaml", "config.yaml"];

/// Mapping key under which settings may be nested
const NESTED_SECTION: &str = "logging";

/// Config level (user, workspace or an explicitly named file)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/promptlog/config.yaml)
    User,
    /// Workspace-level config in the working directory
    Workspace,
    /// A path handed in by the caller or `PROMPTLOG_CONFIG`
    Explicit,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
            ConfigLevel::Explicit => "explicit",
        }
    }
}

/// Result of reading a config file
#[derive(Debug, Clone, Default)]
pub struct FileLoad {
    /// Keys the file defined with valid values
    pub layer: ConfigLayer,
    /// Problems met while reading; the affected keys are absent from `layer`
    pub warnings: Vec<ConfigWarning>,
}

/// File-based configuration provider
///
/// # Example
///
/// ```no_run
/// use promptlog_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
        }
    }

    /// Create a user-level config provider (~/.config/promptlog/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("promptlog").join("config.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider rooted at `workspace_root`.
    ///
    /// Picks the first existing file among [`WORKSPACE_FILE_NAMES`], or the
    /// first name if none exists yet.
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let root = workspace_root.as_ref();
        let path = WORKSPACE_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|p| p.is_file())
            .unwrap_or_else(|| root.join(WORKSPACE_FILE_NAMES[0]));
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the file into a layer.
    ///
    /// Never fails: an absent file yields an empty layer, an unreadable or
    /// unparsable file yields an empty layer plus a warning, and each bad key
    /// is dropped on its own.
    pub fn load(&self) -> FileLoad {
        if !self.exists() {
            return FileLoad::default();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                return FileLoad {
                    layer: ConfigLayer::default(),
                    warnings: vec![ConfigWarning::Unreadable {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    }],
                };
            }
        };

        match serde_yaml::from_str::<Value>(&content) {
            Ok(Value::Mapping(map)) => parse_mapping(&map),
            // An empty file parses as null
            Ok(Value::Null) => FileLoad::default(),
            Ok(other) => FileLoad {
                layer: ConfigLayer::default(),
                warnings: vec![ConfigWarning::Malformed {
                    path: self.path.clone(),
                    reason: format!("top level is {}", value_kind(&other)),
                }],
            },
            Err(e) => FileLoad {
                layer: ConfigLayer::default(),
                warnings: vec![ConfigWarning::Malformed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                }],
            },
        }
    }

    /// Write a layer to the file, creating parent folders
    pub fn save(&self, layer: &ConfigLayer) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(layer)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

fn parse_mapping(map: &Mapping) -> FileLoad {
    let mut load = FileLoad::default();

    for (key, value) in map {
        let Some(name) = key.as_str() else {
            load.warnings.push(ConfigWarning::UnknownKey(format!("{:?}", key)));
            continue;
        };

        if name == NESTED_SECTION {
            match value {
                Value::Mapping(nested) => {
                    let inner = parse_mapping(nested);
                    merge_layer(&mut load.layer, &inner.layer);
                    load.warnings.extend(inner.warnings);
                }
                other => load.warnings.push(ConfigWarning::InvalidValue {
                    key: NESTED_SECTION,
                    origin: "file",
                    reason: format!("expected a mapping, found {}", value_kind(other)),
                }),
            }
            continue;
        }

        let Some(setting) = SettingKey::from_name(name) else {
            load.warnings.push(ConfigWarning::UnknownKey(name.to_string()));
            continue;
        };

        let raw = match scalar_to_string(value) {
            Some(raw) => raw,
            None => {
                load.warnings.push(ConfigWarning::InvalidValue {
                    key: setting.name(),
                    origin: "file",
                    reason: format!("expected a scalar, found {}", value_kind(value)),
                });
                continue;
            }
        };

        if let Err(e) = load.layer.set(setting, &raw) {
            load.warnings.push(ConfigWarning::InvalidValue {
                key: setting.name(),
                origin: "file",
                reason: e.to_string(),
            });
        }
    }

    load
}

/// Copy keys defined in `from` into `into`; nested sections win over top-level keys
fn merge_layer(into: &mut ConfigLayer, from: &ConfigLayer) {
    into.log_level = from.log_level.or(into.log_level);
    into.log_dir = from.log_dir.clone().or_else(|| into.log_dir.take());
    into.format = from.format.or(into.format);
    into.console_enabled = from.console_enabled.or(into.console_enabled);
    into.file_enabled = from.file_enabled.or(into.file_enabled);
    into.max_log_dir_mb = from.max_log_dir_mb.or(into.max_log_dir_mb);
    into.max_log_folders = from.max_log_folders.or(into.max_log_folders);
    into.cleanup_on_start = from.cleanup_on_start.or(into.cleanup_on_start);
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_layer() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::Explicit);
        assert!(!provider.exists());

        let load = provider.load();
        assert_eq!(load.layer, ConfigLayer::default());
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn test_reads_all_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "log_level: WARNING\nlog_dir: /var/log/app\nformat: pretty\nconsole_enabled: false\nfile_enabled: true\nmax_log_dir_mb: 12.5\nmax_log_folders: 7\ncleanup_on_start: yes\n",
        )
        .unwrap();

        let load = FileConfigProvider::new(&path, ConfigLevel::Explicit).load();
        assert!(load.warnings.is_empty(), "{:?}", load.warnings);
        assert_eq!(load.layer.log_level, Some(LogLevel::Warning));
        assert_eq!(load.layer.log_dir, Some(PathBuf::from("/var/log/app")));
        assert_eq!(load.layer.format, Some(LogFormat::Pretty));
        assert_eq!(load.layer.console_enabled, Some(false));
        assert_eq!(load.layer.file_enabled, Some(true));
        assert_eq!(load.layer.max_log_dir_mb, Some(12.5));
        assert_eq!(load.layer.max_log_folders, Some(7));
        // YAML 1.2 keeps `yes` as a string; the bool parser accepts it
        assert_eq!(load.layer.cleanup_on_start, Some(true));
    }

    #[test]
    fn test_bad_key_falls_back_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "log_level: LOUD\nformat: pretty\ncolour: red\nfile_enabled: [1, 2]\n").unwrap();

        let load = FileConfigProvider::new(&path, ConfigLevel::Explicit).load();
        assert_eq!(load.layer.log_level, None);
        assert_eq!(load.layer.file_enabled, None);
        assert_eq!(load.layer.format, Some(LogFormat::Pretty));
        assert_eq!(load.warnings.len(), 3);
        assert!(load.warnings.contains(&ConfigWarning::UnknownKey("colour".into())));
    }

    #[test]
    fn test_nested_logging_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "app: demo\nlogging:\n  log_level: debug\n  console_enabled: false\n").unwrap();

        let load = FileConfigProvider::new(&path, ConfigLevel::Explicit).load();
        assert_eq!(load.layer.log_level, Some(LogLevel::Debug));
        assert_eq!(load.layer.console_enabled, Some(false));
        // `app` is unknown but harmless
        assert_eq!(load.warnings, vec![ConfigWarning::UnknownKey("app".into())]);
    }

    #[test]
    fn test_malformed_yaml_warns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "log_level: [unclosed\n").unwrap();

        let load = FileConfigProvider::new(&path, ConfigLevel::Explicit).load();
        assert_eq!(load.layer, ConfigLayer::default());
        assert!(matches!(load.warnings.as_slice(), [ConfigWarning::Malformed { .. }]));
    }

    #[test]
    fn test_empty_file_is_empty_layer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        let load = FileConfigProvider::new(&path, ConfigLevel::Explicit).load();
        assert_eq!(load.layer, ConfigLayer::default());
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("nested").join("config.yaml"), ConfigLevel::User);

        let mut layer = ConfigLayer::new();
        layer.set(SettingKey::LogLevel, "critical").unwrap();
        layer.set(SettingKey::Format, "pretty").unwrap();
        provider.save(&layer).unwrap();

        assert!(provider.exists());
        let content = fs::read_to_string(provider.path()).unwrap();
        assert!(content.contains("log_level: CRITICAL"));
        assert_eq!(provider.load().layer, layer);
    }

    #[test]
    fn test_workspace_prefers_existing_file() {
        let dir = tempdir().unwrap();
        assert!(FileConfigProvider::workspace(dir.path()).path().ends_with("promptlog.yaml"));

        fs::write(dir.path().join("config.yaml"), "log_level: ERROR\n").unwrap();
        let provider = FileConfigProvider::workspace(dir.path());
        assert!(provider.path().ends_with("config.yaml"));
        assert_eq!(provider.level(), ConfigLevel::Workspace);
    }
}

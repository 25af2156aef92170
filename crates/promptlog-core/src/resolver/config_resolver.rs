//! Layered configuration resolution
//!
//! Layers, later ones overriding earlier ones key by key:
//! 1. Built-in defaults
//! 2. YAML config file (explicit path, `PROMPTLOG_CONFIG`, workspace file, user file)
//! 3. `LOG_*` environment variables
//!
//! Resolution reads the filesystem and the environment and nothing else.
//! The result is an immutable [`Config`] handed to each logger.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::config::{
    Config, ConfigLevel, ConfigWarning, EnvOverrides, FileConfigProvider, SettingKey,
    SettingSource, CONFIG_PATH_ENV,
};
use crate::logging::diag;

static GLOBAL_CONFIG: OnceCell<Config> = OnceCell::new();

/// Resolved configuration with source tracking
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Effective settings
    pub config: Config,
    /// Which layer supplied each key
    pub sources: BTreeMap<SettingKey, SettingSource>,
    /// Config file that was read, if any
    pub file: Option<PathBuf>,
    /// Recoverable problems met during resolution
    pub warnings: Vec<ConfigWarning>,
}

impl ResolvedConfig {
    /// Layer that supplied `key`
    pub fn source_of(&self, key: SettingKey) -> SettingSource {
        self.sources.get(&key).copied().unwrap_or(SettingSource::Default)
    }

    /// Emit each warning once through the diagnostics channel
    pub fn report_warnings(&self) {
        for warning in &self.warnings {
            diag::warn("config", &warning.to_string());
        }
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Where the resolver looks for a config file
#[derive(Debug, Clone)]
enum FileSource {
    /// `PROMPTLOG_CONFIG`, then the workspace file, then the user file
    Search { workspace_root: PathBuf },
    /// Exactly this file
    Explicit(PathBuf),
    /// Skip the file layer
    None,
}

/// Resolves [`Config`] from defaults, a YAML file and the environment
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    file_source: FileSource,
    env: EnvOverrides,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Search the working directory and user config dir, read the process environment
    pub fn new() -> Self {
        Self {
            file_source: FileSource::Search {
                workspace_root: PathBuf::from("."),
            },
            env: EnvOverrides::process(),
        }
    }

    /// Search for the workspace file under `root` instead of the working directory
    pub fn with_workspace(mut self, root: impl Into<PathBuf>) -> Self {
        self.file_source = FileSource::Search {
            workspace_root: root.into(),
        };
        self
    }

    /// Read exactly this config file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_source = FileSource::Explicit(path.into());
        self
    }

    /// Skip the file layer entirely
    pub fn without_file(mut self) -> Self {
        self.file_source = FileSource::None;
        self
    }

    /// Replace the environment the resolver reads from
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    /// Pick the config file to read, if any
    fn locate_file(&self) -> Option<FileConfigProvider> {
        match &self.file_source {
            FileSource::None => None,
            FileSource::Explicit(path) => Some(FileConfigProvider::new(path, ConfigLevel::Explicit)),
            FileSource::Search { workspace_root } => {
                if let Some(path) = self.env.get(CONFIG_PATH_ENV) {
                    return Some(FileConfigProvider::new(path, ConfigLevel::Explicit));
                }
                [
                    FileConfigProvider::workspace(workspace_root),
                    FileConfigProvider::user(),
                ]
                .into_iter()
                .find(|p| p.exists())
            }
        }
    }

    /// Resolve defaults, then file values, then environment values
    pub fn resolve(&self) -> ResolvedConfig {
        let mut config = Config::default();
        let mut sources: BTreeMap<SettingKey, SettingSource> = SettingKey::ALL
            .into_iter()
            .map(|k| (k, SettingSource::Default))
            .collect();
        let mut warnings = Vec::new();
        let mut file = None;

        if let Some(provider) = self.locate_file() {
            if !provider.exists() && provider.level() == ConfigLevel::Explicit {
                warnings.push(ConfigWarning::Unreadable {
                    path: provider.path().to_path_buf(),
                    reason: "file does not exist".to_string(),
                });
            }
            let load = provider.load();
            mark_sources(&mut sources, &load.layer, SettingSource::File);
            load.layer.apply_to(&mut config);
            warnings.extend(load.warnings);
            if provider.exists() {
                file = Some(provider.path().to_path_buf());
            }
        }

        let (env_layer, env_warnings) = self.env.layer();
        mark_sources(&mut sources, &env_layer, SettingSource::Env);
        env_layer.apply_to(&mut config);
        warnings.extend(env_warnings);

        ResolvedConfig {
            config,
            sources,
            file,
            warnings,
        }
    }
}

fn mark_sources(
    sources: &mut BTreeMap<SettingKey, SettingSource>,
    layer: &crate::config::ConfigLayer,
    source: SettingSource,
) {
    for key in SettingKey::ALL {
        if layer.is_set(key) {
            sources.insert(key, source);
        }
    }
}

impl Config {
    /// Resolve with the default resolver
    pub fn resolve() -> Config {
        ConfigResolver::new().resolve().into_config()
    }

    /// Resolve a specific config file plus the process environment
    pub fn from_file(path: impl AsRef<Path>) -> Config {
        ConfigResolver::new().with_file(path.as_ref()).resolve().into_config()
    }

    /// Process-wide configuration, resolved on first use.
    ///
    /// Warnings are reported once, on that first resolution.
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(|| {
            let resolved = ConfigResolver::new().resolve();
            resolved.report_warnings();
            resolved.into_config()
        })
    }
}

//! Environment variable overrides

use std::env;
use std::sync::Arc;

use super::error::ConfigWarning;
use super::settings::{ConfigLayer, SettingKey};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PROMPTLOG_CONFIG";

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads `LOG_*` overrides for every [`SettingKey`].
///
/// The lookup is injectable so resolution can be tested without touching
/// the process environment.
///
/// # Example
///
/// ```
/// use promptlog_core::config::EnvOverrides;
///
/// let env = EnvOverrides::from_pairs([("LOG_LEVEL", "error")]);
/// let (layer, warnings) = env.layer();
/// assert!(warnings.is_empty());
/// assert!(layer.log_level.is_some());
/// ```
#[derive(Clone)]
pub struct EnvOverrides {
    lookup: Lookup,
}

impl Default for EnvOverrides {
    fn default() -> Self {
        Self::process()
    }
}

impl EnvOverrides {
    /// Read from the process environment
    pub fn process() -> Self {
        Self::with_lookup(|key| env::var(key).ok())
    }

    /// Read through a custom lookup
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Read from a fixed set of pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: std::collections::HashMap<String, String> =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::with_lookup(move |key| map.get(key).cloned())
    }

    /// An environment with nothing set
    pub fn empty() -> Self {
        Self::with_lookup(|_| None)
    }

    /// Look up a raw variable; empty values count as unset
    pub fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Build the override layer.
    ///
    /// Malformed values are skipped with a warning so the file or default
    /// value for that key stays in effect.
    pub fn layer(&self) -> (ConfigLayer, Vec<ConfigWarning>) {
        let mut layer = ConfigLayer::new();
        let mut warnings = Vec::new();

        for key in SettingKey::ALL {
            let Some(raw) = self.get(key.env_var()) else {
                continue;
            };
            if let Err(e) = layer.set(key, &raw) {
                warnings.push(ConfigWarning::InvalidValue {
                    key: key.name(),
                    origin: key.env_var(),
                    reason: e.to_string(),
                });
            }
        }

        (layer, warnings)
    }
}

impl std::fmt::Debug for EnvOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvOverrides").finish_non_exhaustive()
    }
}

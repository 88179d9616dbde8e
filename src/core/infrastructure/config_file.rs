//! File-backed `key=value` configuration and backend address resolution.

use crate::core::domain::error::{TelemetryError, TelemetryResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding a direct backend address.
pub const PROMETHEUS_ADDRESS_ENV: &str = "PROMETHEUS_ADDRESS";
/// Config-file key holding a direct backend address.
pub const PROMETHEUS_ADDRESS_KEY: &str = "prometheus_address";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "ARENA_CONFIG";

/// A flat `key=value` configuration map.
///
/// Blank lines and lines starting with `#` are skipped; keys and values are
/// trimmed; a line without `=` is ignored. Later duplicates win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    entries: HashMap<String, String>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { entries }
    }

    /// Loads a config file. A missing file yields an empty map.
    ///
    /// # Errors
    /// Returns `TelemetryError::Configuration` if the file exists but cannot be read.
    pub async fn load(path: &Path) -> TelemetryResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                debug!(path = %path.display(), "loaded config file");
                Ok(Self::parse(&content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, skipping");
                Ok(Self::default())
            }
            Err(e) => Err(TelemetryError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Loads the file named by `ARENA_CONFIG`, falling back to `~/.arena/config`.
    pub async fn load_default() -> TelemetryResult<Self> {
        match default_config_path(std::env::var(CONFIG_PATH_ENV).ok()) {
            Some(path) => Self::load(&path).await,
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Picks the config file path: an existing file named by the override wins,
/// else `~/.arena/config`.
pub(crate) fn default_config_path(env_override: Option<String>) -> Option<PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.is_empty()).map(PathBuf::from) {
        if path.is_file() {
            return Some(path);
        }
        debug!(path = %path.display(), "config path from environment is not a file");
    }
    dirs::home_dir().map(|home| home.join(".arena").join("config"))
}

/// Resolves a direct backend address: the environment value first, then
/// the config file key. Empty values count as unset.
pub fn resolve_prometheus_address(env_value: Option<String>, config: &ConfigFile) -> Option<String> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            config
                .get(PROMETHEUS_ADDRESS_KEY)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
}

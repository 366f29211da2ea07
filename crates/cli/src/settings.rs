//! Resolution of the store URI and HTTP options.
//!
//! Precedence, highest first: command-line flag, environment variable,
//! settings file, built-in default.

use std::path::Path;
use std::time::Duration;

use provstore_http::HttpOptions;
use serde::Deserialize;

pub const DEFAULT_STORE: &str = ".provstore/records.json";

pub const ENV_STORE: &str = "PROVSTORE_URI";
pub const ENV_CONFIG: &str = "PROVSTORE_CONFIG";
pub const ENV_ENVELOPE_HOSTS: &str = "PROVSTORE_ENVELOPE_HOSTS";
pub const ENV_HTTP_TIMEOUT: &str = "PROVSTORE_HTTP_TIMEOUT";

/// Optional TOML settings file.
///
/// ```toml
/// store = "https://records.example.org/"
/// timeout_secs = 30
/// envelope_hosts = ["managed.example.org"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub store: Option<String>,
    pub timeout_secs: Option<u64>,
    pub envelope_hosts: Vec<String>,
}

pub fn read_settings_file(path: &Path) -> Result<SettingsFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: String,
    pub http: HttpOptions,
}

impl Settings {
    /// Resolve settings from flags and an environment lookup.
    pub fn resolve(
        store_flag: Option<String>,
        config_flag: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let env_config = env(ENV_CONFIG);
        let file = match config_flag.or(env_config.as_deref().map(Path::new)) {
            Some(path) => read_settings_file(path)?,
            None => SettingsFile::default(),
        };

        let store = store_flag
            .or_else(|| env(ENV_STORE))
            .or(file.store)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE.to_string());

        let timeout_secs = match env(ENV_HTTP_TIMEOUT) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                format!("{} must be a whole number of seconds, got '{}'", ENV_HTTP_TIMEOUT, raw)
            })?),
            None => file.timeout_secs,
        };

        let mut envelope_hosts = file.envelope_hosts;
        if let Some(raw) = env(ENV_ENVELOPE_HOSTS) {
            envelope_hosts.extend(
                raw.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string),
            );
        }

        Ok(Settings {
            store,
            http: HttpOptions {
                timeout: timeout_secs.map(Duration::from_secs),
                envelope_hosts,
            },
        })
    }

    pub fn from_env(store_flag: Option<String>, config_flag: Option<&Path>) -> Result<Self, String> {
        Self::resolve(store_flag, config_flag, |key| std::env::var(key).ok())
    }
}

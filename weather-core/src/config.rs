use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Coordinates;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OWM_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000/api";

/// How outgoing requests reach the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// Talk to the provider directly, attaching the API key to every request.
    #[default]
    Direct,
    /// Go through the relay, which attaches the key server-side.
    Relay,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Direct => "direct",
            ApiMode::Relay => "relay",
        }
    }
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// mode = "direct"
/// api_key = "..."
///
/// [home]
/// lat = 51.5
/// lon = -0.12
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: ApiMode,

    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Coordinates used for "my location" queries.
    pub home: Option<Coordinates>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ApiMode::default(),
            api_key: None,
            base_url: default_base_url(),
            relay_url: default_relay_url(),
            timeout_secs: default_timeout_secs(),
            home: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding persisted preferences and history.
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// API key from the environment, falling back to the stored one.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    /// Key resolution given an explicit environment value.
    pub fn api_key_with(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    /// Switch to direct mode with the given key.
    pub fn use_direct(&mut self, api_key: String) {
        self.mode = ApiMode::Direct;
        self.api_key = Some(api_key);
    }

    /// Switch to relay mode. Any stored key is dropped since it is never sent.
    pub fn use_relay(&mut self, relay_url: String) {
        self.mode = ApiMode::Relay;
        self.relay_url = relay_url;
        self.api_key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_provider_in_direct_mode() {
        let cfg = Config::default();

        assert_eq!(cfg.mode, ApiMode::Direct);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.relay_url, DEFAULT_RELAY_URL);
        assert!(cfg.home.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str("mode = \"relay\"\n").expect("valid toml");

        assert_eq!(cfg.mode, ApiMode::Relay);
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn use_relay_drops_stored_key() {
        let mut cfg = Config::default();
        cfg.use_direct("KEY".into());
        assert_eq!(cfg.api_key.as_deref(), Some("KEY"));

        cfg.use_relay("http://relay.local/api".into());
        assert_eq!(cfg.mode, ApiMode::Relay);
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.relay_url, "http://relay.local/api");
    }

    #[test]
    fn environment_key_overrides_stored_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.api_key_with(None), None);
        assert_eq!(cfg.api_key_with(Some("ENV_KEY".into())).as_deref(), Some("ENV_KEY"));

        cfg.use_direct("STORED".into());
        assert_eq!(cfg.api_key_with(None).as_deref(), Some("STORED"));
        assert_eq!(cfg.api_key_with(Some("ENV_KEY".into())).as_deref(), Some("ENV_KEY"));
        assert_eq!(cfg.api_key_with(Some("  ".into())).as_deref(), Some("STORED"));
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.use_direct("OPEN_KEY".into());
        cfg.home = Some(Coordinates::new(48.85, 2.35));
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.mode, ApiMode::Direct);
        assert_eq!(loaded.api_key.as_deref(), Some("OPEN_KEY"));
        assert_eq!(loaded.home, Some(Coordinates::new(48.85, 2.35)));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(cfg.mode, ApiMode::Direct);
    }
}

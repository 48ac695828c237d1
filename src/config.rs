//! Finboard Configuration Module
//!
//! Tunables for the cache, pollers, HTTP client and widget storage.
//! Config is stored in `~/.config/finboard/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`FINBOARD_FRESHNESS_SECS`, `FINBOARD_DATA_DIR`, ...)
//! 2. Config file (`~/.config/finboard/config.toml`, or `FINBOARD_CONFIG`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FinboardError, Result};
use crate::util::constants::{
    CONNECT_TIMEOUT, FETCH_TIMEOUT, FRESHNESS_WINDOW, POLL_INTERVAL, STORAGE_NAME, USER_AGENT,
};

pub const ENV_FRESHNESS_SECS: &str = "FINBOARD_FRESHNESS_SECS";
pub const ENV_POLL_INTERVAL_SECS: &str = "FINBOARD_POLL_INTERVAL_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FINBOARD_HTTP_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "FINBOARD_DATA_DIR";
pub const ENV_CONFIG: &str = "FINBOARD_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinboardConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshots younger than this are served without a request (0 disables)
    pub freshness_window_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: FRESHNESS_WINDOW.as_secs(),
        }
    }
}

/// Widget polling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: POLL_INTERVAL.as_secs(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: FETCH_TIMEOUT.as_secs(),
            connect_timeout_secs: CONNECT_TIMEOUT.as_secs(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Widget storage location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory holding `finboard-storage.json` (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
}

impl FinboardConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/finboard/` on Unix, `%APPDATA%/finboard/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("finboard")
    }

    /// Get the config file path (`FINBOARD_CONFIG` wins when set)
    pub fn config_path() -> PathBuf {
        match std::env::var(ENV_CONFIG) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::config_dir().join("config.toml"),
        }
    }

    /// Load from the default location, apply env overrides, validate
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path())?.with_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| FinboardError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| FinboardError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| FinboardError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| FinboardError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| FinboardError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    /// Empty values are ignored, unparsable ones are ignored with a warning.
    pub fn with_env(mut self) -> Self {
        if let Some(secs) = env_secs(ENV_FRESHNESS_SECS) {
            self.cache.freshness_window_secs = secs;
        }
        if let Some(secs) = env_secs(ENV_POLL_INTERVAL_SECS) {
            self.polling.interval_secs = secs;
        }
        if let Some(secs) = env_secs(ENV_HTTP_TIMEOUT_SECS) {
            self.http.timeout_secs = secs;
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.is_empty() {
                self.storage.data_dir = Some(PathBuf::from(dir));
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            return Err(FinboardError::ConfigError {
                reason: "polling.interval_secs must be greater than 0".into(),
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(FinboardError::ConfigError {
                reason: "http.timeout_secs must be greater than 0".into(),
            });
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(FinboardError::ConfigError {
                reason: "http.connect_timeout_secs must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_window_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    /// Effective data directory
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("finboard")
        })
    }

    /// `<data_dir>/finboard-storage.json`
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join(format!("{STORAGE_NAME}.json"))
    }
}

fn env_secs(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok().filter(|v| !v.is_empty())?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparsable duration");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        for var in [
            ENV_FRESHNESS_SECS,
            ENV_POLL_INTERVAL_SECS,
            ENV_HTTP_TIMEOUT_SECS,
            ENV_DATA_DIR,
            ENV_CONFIG,
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_match_constants() {
        let config = FinboardConfig::default();
        assert_eq!(config.freshness_window(), FRESHNESS_WINDOW);
        assert_eq!(config.poll_interval(), POLL_INTERVAL);
        assert_eq!(config.http.user_agent, USER_AGENT);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = FinboardConfig {
            cache: CacheConfig {
                freshness_window_secs: 3,
            },
            storage: StorageConfig {
                data_dir: Some(temp_dir.path().to_path_buf()),
            },
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(FinboardConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[polling]\ninterval_secs = 5\n").unwrap();

        let config = FinboardConfig::load_from(&path).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.freshness_window(), FRESHNESS_WINDOW);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[cache\nfreshness").unwrap();

        let err = FinboardConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, FinboardError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = FinboardConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FinboardConfig::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_config() {
        clear_env();
        env::set_var(ENV_FRESHNESS_SECS, "0");
        env::set_var(ENV_POLL_INTERVAL_SECS, "7");
        env::set_var(ENV_DATA_DIR, "/tmp/finboard-test");

        let config = FinboardConfig::default().with_env();
        assert_eq!(config.freshness_window(), Duration::ZERO);
        assert_eq!(config.poll_interval(), Duration::from_secs(7));
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/finboard-test/finboard-storage.json")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_ignores_empty_and_garbage() {
        clear_env();
        env::set_var(ENV_FRESHNESS_SECS, "");
        env::set_var(ENV_POLL_INTERVAL_SECS, "soon");

        let config = FinboardConfig::default().with_env();
        assert_eq!(config, FinboardConfig::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        clear_env();
        assert!(FinboardConfig::config_path().ends_with("config.toml"));

        env::set_var(ENV_CONFIG, "/etc/finboard.toml");
        assert_eq!(
            FinboardConfig::config_path(),
            PathBuf::from("/etc/finboard.toml")
        );

        clear_env();
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = FinboardConfig {
            polling: PollingConfig { interval_secs: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let zero_freshness = FinboardConfig {
            cache: CacheConfig {
                freshness_window_secs: 0,
            },
            ..Default::default()
        };
        assert!(zero_freshness.validate().is_ok());
    }

    #[test]
    fn test_zero_http_timeouts_rejected() {
        let mut config = FinboardConfig::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = FinboardConfig::default();
        config.http.connect_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_toml_format() {
        let toml_str = toml::to_string_pretty(&FinboardConfig::default()).unwrap();
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("freshness_window_secs = 10"));
        assert!(toml_str.contains("[polling]"));
        assert!(toml_str.contains("[http]"));
    }
}

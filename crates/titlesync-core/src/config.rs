use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Refresh and tap-counter configuration.
///
/// Read from the `[refresh]` section of `~/.titlesync/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Deadline for one remote fetch, in milliseconds.
    /// Default: 5000
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Tap counter interval in milliseconds.
    /// Default: 1000
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Background refresh period in seconds.
    /// Default: 1800 (30 minutes)
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Stop the tap counter on its own after this many ticks. None = run until stopped.
    #[serde(default)]
    pub tick_limit: Option<u64>,

    /// Runtime worker threads. Work is bound by the remote call, not CPU.
    /// Default: 2
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Title the cache starts with.
    /// Default: "initial"
    #[serde(default = "default_initial_title")]
    pub initial_title: String,
}

impl RefreshConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_ms == 0 {
            return Err(invalid("fetch_timeout_ms must be > 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be > 0"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs must be > 0"));
        }
        if self.tick_limit == Some(0) {
            return Err(invalid("tick_limit must be > 0 when set"));
        }
        if self.worker_threads == 0 {
            return Err(invalid("worker_threads must be > 0"));
        }
        if self.initial_title.trim().is_empty() {
            return Err(invalid("initial_title must not be empty"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
            tick_limit: None,
            worker_threads: default_worker_threads(),
            initial_title: default_initial_title(),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_refresh_interval_secs() -> u64 {
    30 * 60
}

fn default_worker_threads() -> usize {
    2
}

fn default_initial_title() -> String {
    "initial".to_string()
}

/// Mirrors just enough of the config file to extract the `[refresh]` section.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    refresh: RefreshConfig,
}

/// `~/.titlesync/config.toml`, or None when the home directory is unknown.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".titlesync").join("config.toml"))
}

/// Load configuration from `~/.titlesync/config.toml`.
///
/// Falls back to defaults if the file doesn't exist, can't be read, or can't
/// be parsed. Validation failures are still errors.
pub fn load_config() -> Result<RefreshConfig, ConfigError> {
    let Some(config_path) = user_config_path() else {
        tracing::warn!(
            event = "core.config.home_dir_missing",
            "Home directory not found; using default configuration",
        );
        return Ok(RefreshConfig::default());
    };

    let config = match load_config_file(&config_path) {
        Ok(config) => config,
        Err(ConfigError::IoError { source }) if source.kind() == std::io::ErrorKind::NotFound => {
            RefreshConfig::default()
        }
        Err(ConfigError::InvalidConfiguration { message }) => {
            return Err(ConfigError::InvalidConfiguration { message });
        }
        Err(e) => {
            tracing::warn!(
                event = "core.config.load_failed",
                path = %config_path.display(),
                error = %e,
            );
            RefreshConfig::default()
        }
    };
    Ok(config)
}

/// Load configuration from an explicit path. Every failure is an error.
pub fn load_config_file(path: &Path) -> Result<RefreshConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    file.refresh.validate()?;
    Ok(file.refresh)
}

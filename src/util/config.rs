//! Persistent collector configuration.
//!
//! [`CollectorConfig`] is read from `%LOCALAPPDATA%\EventScope\config.json`
//! (or an explicit path) and serialised via `serde`. Every field has a
//! default from [`crate::util::constants`], so a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::util::constants;
use crate::util::error::{EventScopeError, Result};

/// User-tunable settings for collection cycles.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Program used to query the event log.
    pub tool_path: String,
    /// Seconds the query tool may run before it is killed.
    pub timeout_secs: u64,
    /// Channel used when none is given on the command line.
    pub default_channel: String,
    /// Event count used when none is given on the command line.
    pub default_count: u32,
    /// Seconds between cycles in `watch` mode.
    pub refresh_interval_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            tool_path: constants::QUERY_TOOL.to_owned(),
            timeout_secs: constants::PROCESS_TIMEOUT_SECS,
            default_channel: constants::DEFAULT_CHANNEL.to_owned(),
            default_count: constants::DEFAULT_EVENT_COUNT,
            refresh_interval_secs: constants::AUTO_REFRESH_INTERVAL_SECS,
        }
    }
}

impl CollectorConfig {
    /// Process timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Refresh interval as a [`Duration`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| EventScopeError::Config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from an explicit path. A missing or invalid file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EventScopeError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the config from the default location, falling back to defaults
    /// when no file exists there.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tool_path.trim().is_empty() {
            return Err(EventScopeError::Config("tool_path must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(EventScopeError::Config("timeout_secs must be > 0".into()));
        }
        if self.default_count == 0 {
            return Err(EventScopeError::Config("default_count must be > 0".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(EventScopeError::Config(
                "refresh_interval_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// `%LOCALAPPDATA%\EventScope`, if the environment variable is set.
pub fn app_data_dir() -> Option<PathBuf> {
    let local_app_data = std::env::var("LOCALAPPDATA").ok()?;
    Some(PathBuf::from(local_app_data).join(constants::APP_DATA_DIR))
}

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(constants::CONFIG_FILE_NAME))
}

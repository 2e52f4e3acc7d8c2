//! Watch configuration: TOML file, defaults, validation, CLI overrides.
//!
//! Every key has a default, so an empty file (or no file) is a valid
//! configuration for the NSE watchlist at a 60-second refresh.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use signalwatch_core::clock::parse_timezone;
use signalwatch_core::data::{BarInterval, Watchlist};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 5;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Data-fetch settings (`[data]` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub interval: BarInterval,
    pub lookback_days: u32,
    pub fetch_timeout_secs: u64,
    pub max_retries: u32,
    pub parallel: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            interval: BarInterval::FiveMinutes,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            parallel: false,
        }
    }
}

/// Top-level configuration shared by the CLI and the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub symbols: Watchlist,
    pub refresh_interval_seconds: u64,
    pub timezone: String,
    pub data: DataConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            symbols: Watchlist::default_nse(),
            refresh_interval_seconds: DEFAULT_REFRESH_SECS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            data: DataConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub symbols: Option<Vec<String>>,
    pub interval: Option<BarInterval>,
    pub timezone: Option<String>,
    pub parallel: bool,
}

impl WatchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: WatchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load `path` if given, else the default location; a missing file means defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config_dir>/signalwatch/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("signalwatch").join("config.toml"))
    }

    /// Write this config as TOML, creating parent directories.
    pub fn write_to(&self, path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_seconds must be greater than 0".into(),
            ));
        }
        if self.data.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "data.fetch_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.data.lookback_days == 0 {
            return Err(ConfigError::Invalid(
                "data.lookback_days must be at least 1".into(),
            ));
        }
        if !self.data.interval.accepts_lookback(self.data.lookback_days) {
            let max = self.data.interval.max_lookback_days().unwrap_or(u32::MAX);
            return Err(ConfigError::Invalid(format!(
                "data.lookback_days = {} exceeds the {} maximum of {max} days",
                self.data.lookback_days, self.data.interval
            )));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbols must not be empty".into()));
        }
        self.tz()?;
        Ok(())
    }

    /// Apply command-line overrides, then re-validate.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(symbols) = &overrides.symbols {
            self.symbols = Watchlist::new(symbols).map_err(ConfigError::Invalid)?;
        }
        if let Some(interval) = overrides.interval {
            self.data.interval = interval;
        }
        if let Some(tz) = &overrides.timezone {
            self.timezone = tz.clone();
        }
        if overrides.parallel {
            self.data.parallel = true;
        }
        self.validate()
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.timezone).map_err(ConfigError::Invalid)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.data.fetch_timeout_secs)
    }
}

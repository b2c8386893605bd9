//! Configuration settings for pomo.
//!
//! Settings are loaded from `~/.pomo/config.yaml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::engine::SessionConfig;
use crate::error::PomoError;
use crate::history::{JsonFileLog, MemoryLog, SessionLog, SqliteLog};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Session durations.
    pub timer: TimerConfig,
    /// Session history storage.
    pub storage: StorageConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    pub default_output: OutputFormat,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Session durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Work session length in minutes.
    pub work_minutes: u32,
    /// Short break length in minutes.
    pub short_break_minutes: u32,
    /// Long break length in minutes.
    pub long_break_minutes: u32,
    /// Number of completed sessions between long breaks.
    pub sessions_until_long_break: u32,
}

/// Session history storage settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Where completed sessions are written.
    pub backend: StorageBackend,
}

/// History store selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `SQLite` database (`pomo.db`).
    #[default]
    Sqlite,
    /// Single JSON array file (`sessions.json`).
    Json,
    /// Nothing is kept between runs.
    Memory,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Pretty,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_until_long_break: 4,
        }
    }
}

impl TimerConfig {
    /// Convert to an engine configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns `PomoError::InvalidConfiguration` for zero durations or a
    /// rotation shorter than two sessions.
    pub fn to_session_config(&self) -> Result<SessionConfig, PomoError> {
        let config = SessionConfig::new(
            Duration::minutes(i64::from(self.work_minutes)),
            Duration::minutes(i64::from(self.short_break_minutes)),
            Duration::minutes(i64::from(self.long_break_minutes)),
            self.sessions_until_long_break,
        );
        config.validate()?;
        Ok(config)
    }
}

impl StorageBackend {
    /// Open the history store for this backend under `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open(self, paths: &Paths) -> Result<Box<dyn SessionLog>, PomoError> {
        match self {
            Self::Sqlite => {
                paths.ensure_dirs()?;
                Ok(Box::new(SqliteLog::open(&paths.database)?))
            }
            Self::Json => Ok(Box::new(JsonFileLog::new(paths.sessions_json.clone()))),
            Self::Memory => Ok(Box::new(MemoryLog::new())),
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, PomoError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            PomoError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            PomoError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), PomoError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| PomoError::Config(format!("Failed to serialize config: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents).map_err(|e| {
            PomoError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Serialize to YAML for display.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, PomoError> {
        serde_yaml::to_string(self)
            .map_err(|e| PomoError::Config(format!("Failed to serialize config: {e}")))
    }
}

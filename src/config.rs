//! Application configuration.
//!
//! Read from `$TASKTIDE_CONFIG`, else `config.toml` in the platform config
//! directory. Every field has a default, so a missing file is not an error.

use crate::constants::{DEFAULT_MAX_ALARM_WAIT_SECS, DEFAULT_RETENTION_HOURS, MILLIS_PER_HOUR};
use crate::error::AppError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV_VAR: &str = "TASKTIDE_CONFIG";

/// Fixed content of every reminder notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_id: "daily_reminders".to_string(),
            title: "Tasktide".to_string(),
            body: "Time to check your tasks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub database_file: String,
    pub preferences_file: String,
    /// Completed tasks older than this are purged at startup.
    pub retention_hours: u32,
    pub max_alarm_wait_secs: u64,
    pub notification: NotificationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: "tasktide.db".to_string(),
            preferences_file: "ToDoPrefs.json".to_string(),
            retention_hours: DEFAULT_RETENTION_HOURS,
            max_alarm_wait_secs: DEFAULT_MAX_ALARM_WAIT_SECS,
            notification: NotificationConfig::default(),
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tasktide", "Tasktide")
}

impl AppConfig {
    /// Parse and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text).map_err(|e| {
            AppError::Parse(format!("failed to parse config file '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when no file exists.
    pub fn load() -> Result<Self, AppError> {
        let path = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Some(PathBuf::from(path)),
            None => project_dirs().map(|dirs| dirs.config_dir().join("config.toml")),
        };

        match path {
            Some(path) if path.exists() => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            Some(_) | None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.retention_hours == 0 {
            return Err(AppError::InvalidInput {
                field: "retention_hours",
                reason: "must be positive".into(),
            });
        }
        if self.max_alarm_wait_secs == 0 {
            return Err(AppError::InvalidInput {
                field: "max_alarm_wait_secs",
                reason: "must be positive".into(),
            });
        }
        if self.database_file.trim().is_empty() {
            return Err(AppError::InvalidInput {
                field: "database_file",
                reason: "cannot be empty".into(),
            });
        }
        if self.preferences_file.trim().is_empty() {
            return Err(AppError::InvalidInput {
                field: "preferences_file",
                reason: "cannot be empty".into(),
            });
        }
        Ok(())
    }

    /// Configured data directory, or the platform default.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }

    pub fn retention_millis(&self) -> i64 {
        i64::from(self.retention_hours) * MILLIS_PER_HOUR
    }

    pub fn max_alarm_wait(&self) -> Duration {
        Duration::from_secs(self.max_alarm_wait_secs)
    }
}

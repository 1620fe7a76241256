//! Runtime configuration for embedding the core.
//!
//! # Responsibility
//! - Collect database and logging settings from defaults and environment.
//! - Open connections and start logging from one validated value.
//!
//! # Invariants
//! - `busy_timeout` bounds how long a creation waits on another writer.
//! - Logging is only started when `log_dir` is set.

use crate::db::{open_db_with_timeout, DbResult, DEFAULT_BUSY_TIMEOUT};
use crate::logging::{default_log_level, try_init_logging, LoggingError};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_DATABASE: &str = "ROTAGUARD_DATABASE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "ROTAGUARD_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "ROTAGUARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ROTAGUARD_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "rotaguard.sqlite3";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: expected milliseconds")]
    InvalidBusyTimeout { key: &'static str, value: String },
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads settings from the process environment on top of defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, which returns the raw value of a key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_blank(ENV_DATABASE) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(raw) = non_blank(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidBusyTimeout {
                    key: ENV_BUSY_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        if let Some(level) = non_blank(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_string();
        }
        if let Some(dir) = non_blank(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir.trim()));
        }
        Ok(config)
    }

    /// Opens and migrates the configured database.
    pub fn open_db(&self) -> DbResult<Connection> {
        open_db_with_timeout(&self.db_path, self.busy_timeout)
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(());
        };
        try_init_logging(&self.log_level, &dir.to_string_lossy())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE, "/tmp/rota.db"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, " "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/rota.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn malformed_busy_timeout_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_BUSY_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBusyTimeout { .. }));
    }

    #[test]
    fn relative_log_dir_surfaces_typed_logging_error() {
        let config = CoreConfig {
            log_dir: Some(PathBuf::from("logs/dev")),
            ..CoreConfig::default()
        };
        assert_eq!(
            config.init_logging(),
            Err(ConfigError::Logging(LoggingError::RelativeDir(
                "logs/dev".to_string()
            )))
        );
        assert!(CoreConfig::default().init_logging().is_ok());
    }

    #[test]
    fn opens_configured_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            db_path: dir.path().join("config.db"),
            ..CoreConfig::default()
        };
        let conn = config.open_db().unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::db::migrations::latest_version());
    }
}

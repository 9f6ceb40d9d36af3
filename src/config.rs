//! Configuration module for dashguard.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{AppError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/dashguard.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/dashguard.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Login and lockout policy.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Failed attempts allowed before a username is locked.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// How long a username stays locked, in seconds.
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
    /// Lifetime of a login session, in seconds.
    #[serde(default = "default_session_duration")]
    pub session_duration_secs: u64,
}

/// Upper bound for `lockout_secs` and `session_duration_secs` (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

fn default_max_attempts() -> u32 {
    3
}

fn default_lockout_secs() -> u64 {
    5 * 60
}

fn default_session_duration() -> u64 {
    5 * 60
}

impl AuthConfig {
    /// Lockout duration as a `Duration`.
    pub fn lockout(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }

    /// Session lifetime as a `Duration`.
    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lockout_secs: default_lockout_secs(),
            session_duration_secs: default_session_duration(),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct HashingConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Time cost (iterations).
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    64 * 1024
}

fn default_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

impl HashingConfig {
    /// Minimal cost parameters. Only suitable for tests.
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Legacy user import configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportConfig {
    /// Flat file of `username,password_hash,role` lines imported at startup.
    /// Empty disables the import.
    #[serde(default)]
    pub legacy_users_file: String,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Login and lockout policy.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Password hashing cost.
    #[serde(default)]
    pub hashing: HashingConfig,
    /// Legacy import.
    #[serde(default)]
    pub import: ImportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AppError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AppError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DASHGUARD_DB_PATH`: database file path
    /// - `DASHGUARD_LOG_LEVEL`: log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DASHGUARD_DB_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(level) = std::env::var("DASHGUARD_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.max_attempts == 0 {
            return Err(AppError::Config(
                "auth.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.auth.lockout_secs == 0 {
            return Err(AppError::Config(
                "auth.lockout_secs must be at least 1".to_string(),
            ));
        }
        if self.auth.session_duration_secs == 0 {
            return Err(AppError::Config(
                "auth.session_duration_secs must be at least 1".to_string(),
            ));
        }
        if self.auth.lockout_secs > MAX_DURATION_SECS {
            return Err(AppError::Config(format!(
                "auth.lockout_secs must be at most {MAX_DURATION_SECS}"
            )));
        }
        if self.auth.session_duration_secs > MAX_DURATION_SECS {
            return Err(AppError::Config(format!(
                "auth.session_duration_secs must be at most {MAX_DURATION_SECS}"
            )));
        }
        argon2::Params::new(
            self.hashing.memory_kib,
            self.hashing.iterations,
            self.hashing.parallelism,
            None,
        )
        .map_err(|e| AppError::Config(format!("invalid hashing parameters: {e}")))?;
        Ok(())
    }

    /// Path of the legacy users file, if an import is configured.
    pub fn legacy_users_file(&self) -> Option<&Path> {
        if self.import.legacy_users_file.is_empty() {
            None
        } else {
            Some(Path::new(&self.import.legacy_users_file))
        }
    }
}

//! Server configuration loaded from TOML.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use noughts_engine::{DEFAULT_LEADERBOARD_LIMIT, StoreConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Environment variable that overrides the database path.
pub const DB_PATH_ENV: &str = "NOUGHTS_DB_PATH";

/// Settings for the REST server and its store.
///
/// Every field has a default, so an empty file (or no file at all) is a
/// valid configuration.
///
/// ```toml
/// host = "0.0.0.0"
/// port = 8080
/// leaderboard_limit = 5
///
/// [store]
/// db_path = "/var/lib/noughts/noughts.db"
/// busy_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    host: String,
    /// Port to bind.
    port: u16,
    /// Entries returned by the leaderboard when the request names no limit.
    leaderboard_limit: usize,
    /// Database settings.
    store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise starts from defaults, then applies
    /// the database path from the environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies overrides read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(db_path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            debug!(db_path = %db_path, "Database path taken from environment");
            self.store = self.store.with_db_path(db_path);
        }
        self
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the database path.
    pub fn with_db_path(mut self, db_path: impl Into<String>) -> Self {
        self.store = self.store.with_db_path(db_path);
        self
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty".to_string()));
        }
        if self.leaderboard_limit == 0 {
            return Err(ConfigError::new(
                "leaderboard_limit must be at least 1".to_string(),
            ));
        }
        if self.store.db_path().trim().is_empty() {
            return Err(ConfigError::new("store.db_path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

//! SQLite store configuration.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Connection settings for [`SqliteStore`](crate::SqliteStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the database file (created if missing).
    db_path: String,
    /// How long a writer waits for the database lock before failing.
    busy_timeout_ms: u64,
}

impl StoreConfig {
    /// Default database file name.
    pub const DEFAULT_DB_PATH: &'static str = "noughts.db";
    /// Default writer lock wait.
    pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

    /// Same settings with a different database path.
    pub fn with_db_path(mut self, db_path: impl Into<String>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: Self::DEFAULT_DB_PATH.to_string(),
            busy_timeout_ms: Self::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

//! Connection options for the SQLite-backed store.

use super::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Tunables applied when a store connection is opened.
///
/// Every field has a default, so a partial JSON document such as
/// `{"read_only": true}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Enforces `FOREIGN KEY` constraints declared by the schema owner.
    pub foreign_keys: bool,
    /// Opens file databases read-only. Ignored for in-memory databases.
    pub read_only: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
            read_only: false,
        }
    }
}

impl StoreOptions {
    /// Parses options from a JSON config document.
    pub fn from_json_str(json: &str) -> DbResult<Self> {
        serde_json::from_str(json).map_err(DbError::InvalidOptions)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

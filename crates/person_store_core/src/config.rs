//! Store configuration.
//!
//! # Invariants
//! - Every field has a default, so an empty document is a valid config.
//! - `db_path = None` selects a private in-memory database.

use crate::db::{checked_busy_timeout, DbResult, DEFAULT_BUSY_TIMEOUT_MS};
use crate::notify::DEFAULT_SUBSCRIBER_BUFFER;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// What `put` does with a non-sentinel id that matches no stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIdPolicy {
    /// Insert with a fresh id and overwrite the caller's id. Logged at `warn`.
    #[default]
    Reassign,
    /// Insert the row under the caller's id.
    Preserve,
    /// Fail with `RepoError::UnknownId`; nothing is written.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub unknown_id_policy: UnknownIdPolicy,
    pub subscriber_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            unknown_id_policy: UnknownIdPolicy::default(),
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl StoreConfig {
    /// File-backed config with all other fields defaulted.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Busy timeout as a `Duration`, rejected when SQLite cannot take it.
    pub fn busy_timeout(&self) -> DbResult<Duration> {
        checked_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, UnknownIdPolicy};
    use crate::db::DbError;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.busy_timeout().unwrap(), Duration::from_secs(5));
        assert_eq!(config.unknown_id_policy, UnknownIdPolicy::Reassign);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn fields_deserialize_from_snake_case() {
        let config: StoreConfig = serde_json::from_str(
            r#"{
                "db_path": "/tmp/people.sqlite3",
                "busy_timeout_ms": 250,
                "unknown_id_policy": "reject",
                "subscriber_buffer": 8
            }"#,
        )
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/people.sqlite3")));
        assert_eq!(config.busy_timeout().unwrap(), Duration::from_millis(250));
        assert_eq!(config.unknown_id_policy, UnknownIdPolicy::Reject);
        assert_eq!(config.subscriber_buffer, 8);
    }

    #[test]
    fn unknown_policy_name_is_rejected() {
        let result = serde_json::from_str::<StoreConfig>(r#"{"unknown_id_policy":"merge"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn busy_timeout_beyond_sqlite_range_is_an_error() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"busy_timeout_ms": 3000000000}"#).unwrap();
        assert!(matches!(
            config.busy_timeout(),
            Err(DbError::InvalidBusyTimeout {
                millis: 3_000_000_000
            })
        ));

        let edge = StoreConfig {
            busy_timeout_ms: 2_147_483_647,
            ..StoreConfig::default()
        };
        assert!(edge.busy_timeout().is_ok());
    }
}

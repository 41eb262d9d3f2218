//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the person store.
//! - Create, seed and upgrade the schema in deterministic order.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No person data is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod migrations;
mod open;

pub use open::{
    open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT,
    DEFAULT_BUSY_TIMEOUT_MS,
};

pub type DbResult<T> = Result<T, DbError>;

/// Rejects busy timeouts SQLite cannot represent.
pub fn checked_busy_timeout(busy_timeout: Duration) -> DbResult<Duration> {
    let millis = busy_timeout.as_millis();
    if i32::try_from(millis).is_err() {
        return Err(DbError::InvalidBusyTimeout { millis });
    }
    Ok(busy_timeout)
}

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// SQLite takes the busy timeout as a C `int` of milliseconds.
    InvalidBusyTimeout {
        millis: u128,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidBusyTimeout { millis } => write!(
                f,
                "busy timeout of {millis} ms exceeds the SQLite limit of {} ms",
                i32::MAX
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidBusyTimeout { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

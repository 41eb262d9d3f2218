//! Person domain model.
//!
//! # Responsibility
//! - Describe one row of the `Person` table.
//! - Decode rows in canonical field order and encode writable content.
//!
//! # Invariants
//! - `id == UNSAVED_ID` means the record has never been persisted.
//! - Text fields are never null; absent values are empty strings.
//! - Encoded write content never includes the `_id` column.

use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Sentinel id for records that have not been written yet.
pub const UNSAVED_ID: i64 = -1;

pub const TABLE_NAME: &str = "Person";
pub const COL_ID: &str = "_id";
pub const COL_FIRSTNAME: &str = "firstname";
pub const COL_LASTNAME: &str = "lastname";
pub const COL_BIO: &str = "bio";

/// Projection order for every read. Row decoding depends on it.
pub const PERSON_FIELDS: [&str; 4] = [COL_ID, COL_FIRSTNAME, COL_LASTNAME, COL_BIO];
/// Writable columns: `PERSON_FIELDS` without `_id`.
pub const CONTENT_FIELDS: [&str; 3] = [COL_FIRSTNAME, COL_LASTNAME, COL_BIO];

/// Failure to rebuild a `Person` from a stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Row ended before the column at `index`.
    MissingField { index: usize },
    /// Column at `index` holds a value of the wrong storage type.
    WrongType { column: String, index: usize },
    /// Any other conversion failure reported by SQLite.
    Unreadable { index: Option<usize>, message: String },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { index } => write!(
                f,
                "person row has no column at index {index}; expected {} columns",
                PERSON_FIELDS.len()
            ),
            Self::WrongType { column, index } => {
                write!(f, "person column `{column}` (index {index}) has wrong type")
            }
            Self::Unreadable { index, message } => match index {
                Some(index) => write!(f, "person column {index} unreadable: {message}"),
                None => write!(f, "person row unreadable: {message}"),
            },
        }
    }
}

impl Error for DecodeError {}

impl From<rusqlite::Error> for DecodeError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::InvalidColumnIndex(index) => Self::MissingField { index },
            rusqlite::Error::InvalidColumnType(index, column, _) => {
                Self::WrongType { column, index }
            }
            rusqlite::Error::FromSqlConversionFailure(index, _, err) => Self::Unreadable {
                index: Some(index),
                message: err.to_string(),
            },
            rusqlite::Error::IntegralValueOutOfRange(index, _) => Self::WrongType {
                column: PERSON_FIELDS
                    .get(index)
                    .map_or_else(|| index.to_string(), |name| (*name).to_string()),
                index,
            },
            other => Self::Unreadable {
                index: None,
                message: other.to_string(),
            },
        }
    }
}

/// One Person row.
///
/// Callers own their copies outright; the store hands out clones and takes
/// `&mut Person` only to write back an assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            id: UNSAVED_ID,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
        }
    }
}

impl Person {
    /// Creates an empty, unpersisted person.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unpersisted person with all text fields set.
    pub fn with_names(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        bio: impl Into<String>,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            first_name: first_name.into(),
            last_name: last_name.into(),
            bio: bio.into(),
        }
    }

    /// Rebuilds a person from a row projected in `PERSON_FIELDS` order.
    ///
    /// # Errors
    /// - `DecodeError::MissingField` when the row is narrower than expected.
    /// - `DecodeError::WrongType` when a column has the wrong storage type.
    pub fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        let column_count = row.as_ref().column_count();
        if column_count < PERSON_FIELDS.len() {
            return Err(DecodeError::MissingField {
                index: column_count,
            });
        }

        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            bio: row.get(3)?,
        })
    }

    /// Whether this record carries an id that may exist in storage.
    pub fn is_persisted(&self) -> bool {
        self.id > UNSAVED_ID
    }

    /// Returns the writable column values. `_id` is owned by storage.
    pub fn content(&self) -> PersonContent<'_> {
        PersonContent {
            first_name: self.first_name.as_str(),
            last_name: self.last_name.as_str(),
            bio: self.bio.as_str(),
        }
    }
}

/// Borrowed write payload for one person, without the id column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonContent<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub bio: &'a str,
}

impl<'a> PersonContent<'a> {
    /// Column/value pairs in canonical order.
    pub fn columns(&self) -> [(&'static str, &'a str); 3] {
        let [first_name, last_name, bio] = CONTENT_FIELDS;
        [
            (first_name, self.first_name),
            (last_name, self.last_name),
            (bio, self.bio),
        ]
    }
}

//! Collection and record locators for the person collection.
//!
//! The collection URI is both the notification scope and the address for
//! bulk reads. A record URI appends `/<id>` to it.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const AUTHORITY: &str = "com.example.providerexample.provider";
pub const SCHEME: &str = "content://";
pub const PERSON_COLLECTION_URI: &str = "content://com.example.providerexample.provider/person";

/// Locator for the whole collection.
pub fn person_collection_uri() -> &'static str {
    PERSON_COLLECTION_URI
}

/// Locator for a single record.
pub fn person_uri(id: i64) -> String {
    format!("{PERSON_COLLECTION_URI}/{id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    Unsupported(String),
    InvalidId(String),
}

impl Display for LocatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(uri) => write!(f, "unsupported person locator: {uri}"),
            Self::InvalidId(segment) => write!(f, "invalid person id in locator: `{segment}`"),
        }
    }
}

impl Error for LocatorError {}

/// Resolved target of a person locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonLocator {
    Collection,
    Record(i64),
}

impl PersonLocator {
    pub fn parse(uri: &str) -> Result<Self, LocatorError> {
        let Some(rest) = uri.strip_prefix(PERSON_COLLECTION_URI) else {
            return Err(LocatorError::Unsupported(uri.to_string()));
        };

        if rest.is_empty() {
            return Ok(Self::Collection);
        }

        let Some(segment) = rest.strip_prefix('/') else {
            return Err(LocatorError::Unsupported(uri.to_string()));
        };
        segment
            .parse::<i64>()
            .map(Self::Record)
            .map_err(|_| LocatorError::InvalidId(segment.to_string()))
    }

    pub fn to_uri(self) -> String {
        match self {
            Self::Collection => PERSON_COLLECTION_URI.to_string(),
            Self::Record(id) => person_uri(id),
        }
    }
}

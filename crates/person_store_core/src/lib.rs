//! Core storage and change notification for the Person collection.
//! This crate owns identity assignment, upsert and the change broadcast.

pub mod config;
pub mod db;
pub mod locator;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{StoreConfig, UnknownIdPolicy};
pub use locator::{person_collection_uri, person_uri, LocatorError, PersonLocator};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::person::{DecodeError, Person, PersonContent, UNSAVED_ID};
pub use notify::{ChangeEvent, ChangeNotifier, Subscription, SubscriptionId};
pub use repo::person_repo::{PersonRepository, RepoError, RepoResult, SqlitePersonRepository};
pub use service::person_store::{PersonStore, PutOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

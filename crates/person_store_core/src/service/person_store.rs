//! Person store: serialized access, upsert and change broadcast.
//!
//! # Responsibility
//! - Own the single SQLite connection for the person collection.
//! - Decide insert vs. update atomically and write assigned ids back.
//! - Broadcast one collection event per successful write.
//!
//! # Invariants
//! - Every public operation holds `conn` for its whole duration.
//! - The update-else-insert decision runs in one `IMMEDIATE` transaction.
//! - Broadcast happens after the connection lock is released.
//! - Failed writes broadcast nothing and leave the caller's record untouched.

use crate::config::{StoreConfig, UnknownIdPolicy};
use crate::db::{open_db_in_memory, open_db_with_timeout};
use crate::locator::{PersonLocator, PERSON_COLLECTION_URI};
use crate::model::person::{Person, UNSAVED_ID};
use crate::notify::{ChangeNotifier, Subscription, SubscriptionId};
use crate::repo::person_repo::{PersonRepository, RepoError, RepoResult, SqlitePersonRepository};
use log::{error, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

/// Result of a successful `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// An existing row was overwritten.
    Updated { id: i64 },
    /// A new row was created with a storage-assigned id.
    Inserted { id: i64 },
    /// The caller's id matched no row; a new row got a fresh id instead.
    Reassigned { requested: i64, id: i64 },
}

impl PutOutcome {
    /// Id of the row that now holds the record.
    pub fn id(self) -> i64 {
        match self {
            Self::Updated { id } | Self::Inserted { id } | Self::Reassigned { id, .. } => id,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Inserted { .. } => "inserted",
            Self::Reassigned { .. } => "id_reassigned",
        }
    }
}

/// Person collection store.
///
/// Construct once and share by reference or `Arc`; it is `Send + Sync`.
pub struct PersonStore {
    conn: Mutex<Connection>,
    notifier: ChangeNotifier,
    unknown_id_policy: UnknownIdPolicy,
}

impl PersonStore {
    /// Opens (creating and seeding when needed) the configured database.
    pub fn open(config: &StoreConfig) -> RepoResult<Self> {
        let busy_timeout = config.busy_timeout()?;
        let conn = match &config.db_path {
            Some(path) => open_db_with_timeout(path, busy_timeout)?,
            None => open_db_in_memory()?,
        };

        Ok(Self {
            conn: Mutex::new(conn),
            notifier: ChangeNotifier::new(PERSON_COLLECTION_URI, config.subscriber_buffer),
            unknown_id_policy: config.unknown_id_policy,
        })
    }

    /// Opens a private, freshly seeded in-memory store with default settings.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Collection identity used as notification scope and bulk-read address.
    pub fn collection_uri(&self) -> &'static str {
        self.notifier.collection()
    }

    /// Reads one person. Absence is `Ok(None)`.
    pub fn get(&self, id: i64) -> RepoResult<Option<Person>> {
        let conn = self.conn.lock();
        SqlitePersonRepository::new(&conn).get_person(id)
    }

    /// Reads the whole collection ordered by id.
    pub fn list(&self) -> RepoResult<Vec<Person>> {
        let conn = self.conn.lock();
        SqlitePersonRepository::new(&conn).list_persons()
    }

    /// Resolves a locator to the rows it addresses.
    pub fn query(&self, locator: PersonLocator) -> RepoResult<Vec<Person>> {
        match locator {
            PersonLocator::Collection => self.list(),
            PersonLocator::Record(id) => Ok(self.get(id)?.into_iter().collect()),
        }
    }

    /// Persists `person`, updating when its id exists and inserting otherwise.
    ///
    /// On insert the assigned id is written into `person.id`.
    ///
    /// # Errors
    /// - `RepoError::Db` when storage rejects the write.
    /// - `RepoError::UnknownId` under `UnknownIdPolicy::Reject`.
    pub fn put(&self, person: &mut Person) -> RepoResult<PutOutcome> {
        let started_at = Instant::now();
        let result = {
            let mut conn = self.conn.lock();
            upsert(&mut conn, person, self.unknown_id_policy)
        };

        match result {
            Ok(outcome) => {
                person.id = outcome.id();
                if let PutOutcome::Reassigned { requested, id } = outcome {
                    warn!(
                        "event=person_put module=store status=id_reassigned requested_id={requested} id={id}"
                    );
                }
                info!(
                    "event=person_put module=store status=ok outcome={} id={} duration_ms={}",
                    outcome.label(),
                    outcome.id(),
                    started_at.elapsed().as_millis()
                );
                self.notifier.broadcast();
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=person_put module=store status=error id={} duration_ms={} error={}",
                    person.id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Deletes the row matching `person.id`. Returns the number removed.
    pub fn remove(&self, person: &Person) -> RepoResult<usize> {
        self.remove_id(person.id)
    }

    /// Deletes by id. Broadcasts only when a row was removed.
    pub fn remove_id(&self, id: i64) -> RepoResult<usize> {
        let result = {
            let conn = self.conn.lock();
            SqlitePersonRepository::new(&conn).delete_person(id)
        };

        match result {
            Ok(removed) => {
                info!("event=person_remove module=store status=ok id={id} removed={removed}");
                if removed > 0 {
                    self.notifier.broadcast();
                }
                Ok(removed)
            }
            Err(err) => {
                error!("event=person_remove module=store status=error id={id} error={err}");
                Err(err)
            }
        }
    }

    /// Registers for collection-change events.
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }
}

fn upsert(
    conn: &mut Connection,
    person: &Person,
    policy: UnknownIdPolicy,
) -> RepoResult<PutOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = {
        let repo = SqlitePersonRepository::new(&tx);
        if !person.is_persisted() {
            PutOutcome::Inserted {
                id: repo.insert_person(person)?,
            }
        } else if repo.update_person(person)? > 0 {
            PutOutcome::Updated { id: person.id }
        } else {
            match policy {
                UnknownIdPolicy::Reassign => PutOutcome::Reassigned {
                    requested: person.id,
                    id: repo.insert_person(person)?,
                },
                UnknownIdPolicy::Preserve => PutOutcome::Inserted {
                    id: repo.insert_person_with_id(person)?,
                },
                UnknownIdPolicy::Reject => return Err(RepoError::UnknownId(person.id)),
            }
        }
    };

    if outcome.id() <= UNSAVED_ID {
        return Err(RepoError::InvalidAssignedId(outcome.id()));
    }

    tx.commit()?;
    Ok(outcome)
}

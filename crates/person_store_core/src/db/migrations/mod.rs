//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema versions in strictly increasing order.
//! - Create and seed a fresh database, or upgrade an older one in place.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - Seed rows are written only when the schema is created, never on upgrade.

use crate::db::{DbError, DbResult};
use crate::model::person::Person;
use crate::repo::person_repo::insert_content;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

type CreateHook = fn(&Transaction<'_>) -> DbResult<()>;

/// What `apply_migrations` did to the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    /// Schema was already at the latest version.
    Current { version: u32 },
    /// Schema was created from scratch and seeded.
    Created { version: u32 },
    /// Schema existed at an older version and was upgraded in place.
    Upgraded { from: u32, to: u32 },
}

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    latest_of(MIGRATIONS)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file is newer than this binary.
/// - `DbError::Sqlite` when any step fails; the whole run is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<SchemaChange> {
    run_migrations(conn, MIGRATIONS, seed_examples)
}

/// Rows inserted into a freshly created database.
pub fn seed_people() -> [Person; 2] {
    [
        Person::with_names("Sylvester", "Stallone", "..."),
        Person::with_names("Danny", "DeVito", "..."),
    ]
}

fn latest_of(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn run_migrations(
    conn: &mut Connection,
    migrations: &[Migration],
    on_create: CreateHook,
) -> DbResult<SchemaChange> {
    let current_version = current_user_version(conn)?;
    let latest = latest_of(migrations);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(SchemaChange::Current {
            version: current_version,
        });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let change = if current_version == 0 {
        apply_steps(&tx, migrations, 0)?;
        on_create(&tx)?;
        SchemaChange::Created { version: latest }
    } else {
        upgrade(&tx, migrations, current_version)?;
        SchemaChange::Upgraded {
            from: current_version,
            to: latest,
        }
    };
    tx.commit()?;

    info!("event=db_migrate module=db status=ok change={change:?}");
    Ok(change)
}

/// Upgrade path for existing files. Steps may carry empty SQL; the version
/// stamp still advances.
fn upgrade(tx: &Transaction<'_>, migrations: &[Migration], from: u32) -> DbResult<()> {
    info!(
        "event=db_migrate module=db status=upgrade from={from} to={}",
        latest_of(migrations)
    );
    apply_steps(tx, migrations, from)
}

fn apply_steps(tx: &Transaction<'_>, migrations: &[Migration], from: u32) -> DbResult<()> {
    for migration in migrations {
        if migration.version <= from {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    Ok(())
}

fn seed_examples(tx: &Transaction<'_>) -> DbResult<()> {
    for person in seed_people() {
        insert_content(tx, person.content())?;
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

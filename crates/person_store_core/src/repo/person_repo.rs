//! Person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide exact-match select/update/delete and id-assigning insert.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every read projects `PERSON_FIELDS` in canonical order.
//! - Writes use `Person::content()`, so `_id` is only ever set by SQLite
//!   (or explicitly by `insert_person_with_id`).

use crate::db::DbError;
use crate::model::person::{
    DecodeError, Person, PersonContent, COL_ID, CONTENT_FIELDS, PERSON_FIELDS, TABLE_NAME,
};
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

static PERSON_SELECT_SQL: Lazy<String> =
    Lazy::new(|| format!("SELECT {} FROM {TABLE_NAME}", PERSON_FIELDS.join(", ")));
static GET_PERSON_SQL: Lazy<String> =
    Lazy::new(|| format!("{} WHERE {COL_ID} = ?1;", *PERSON_SELECT_SQL));
static LIST_PERSONS_SQL: Lazy<String> =
    Lazy::new(|| format!("{} ORDER BY {COL_ID} ASC;", *PERSON_SELECT_SQL));
static INSERT_PERSON_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({});",
        CONTENT_FIELDS.join(", "),
        placeholders(CONTENT_FIELDS.len())
    )
});
static INSERT_PERSON_WITH_ID_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({});",
        PERSON_FIELDS.join(", "),
        placeholders(PERSON_FIELDS.len())
    )
});
// Content columns bind ?1..?3, the id binds last.
static UPDATE_PERSON_SQL: Lazy<String> = Lazy::new(|| {
    let assignments = CONTENT_FIELDS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {TABLE_NAME} SET {assignments} WHERE {COL_ID} = ?{};",
        CONTENT_FIELDS.len() + 1
    )
});
static DELETE_PERSON_SQL: Lazy<String> =
    Lazy::new(|| format!("DELETE FROM {TABLE_NAME} WHERE {COL_ID} = ?1;"));

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for person persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Storage rejected the read or write.
    Db(DbError),
    /// A stored row could not be rebuilt into a `Person`.
    Decode(DecodeError),
    /// A non-sentinel id matched no row and the store is configured to reject it.
    UnknownId(i64),
    /// Storage returned an id in the unpersisted range.
    InvalidAssignedId(i64),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "invalid persisted person data: {err}"),
            Self::UnknownId(id) => write!(f, "person not found for update: {id}"),
            Self::InvalidAssignedId(id) => write!(f, "storage assigned invalid person id {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::UnknownId(_) | Self::InvalidAssignedId(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<DecodeError> for RepoError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row-level person storage primitives.
pub trait PersonRepository {
    fn get_person(&self, id: i64) -> RepoResult<Option<Person>>;
    fn list_persons(&self) -> RepoResult<Vec<Person>>;
    /// Returns the number of rows changed (0 when `person.id` is unknown).
    fn update_person(&self, person: &Person) -> RepoResult<usize>;
    /// Inserts content only and returns the id SQLite assigned.
    fn insert_person(&self, person: &Person) -> RepoResult<i64>;
    /// Inserts content under the caller's `person.id`.
    fn insert_person_with_id(&self, person: &Person) -> RepoResult<i64>;
    /// Returns the number of rows removed.
    fn delete_person(&self, id: i64) -> RepoResult<usize>;
}

/// SQLite-backed person repository.
///
/// Borrows a connection; a `Transaction` derefs to one, so the store can run
/// several calls inside a single transaction.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn get_person(&self, id: i64) -> RepoResult<Option<Person>> {
        let mut stmt = self.conn.prepare_cached(GET_PERSON_SQL.as_str())?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn list_persons(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare_cached(LIST_PERSONS_SQL.as_str())?;
        let mut rows = stmt.query([])?;
        let mut persons = Vec::new();

        while let Some(row) = rows.next()? {
            persons.push(parse_person_row(row)?);
        }

        Ok(persons)
    }

    fn update_person(&self, person: &Person) -> RepoResult<usize> {
        let [(_, first_name), (_, last_name), (_, bio)] = person.content().columns();
        let changed = self.conn.execute(
            UPDATE_PERSON_SQL.as_str(),
            params![first_name, last_name, bio, person.id],
        )?;

        Ok(changed)
    }

    fn insert_person(&self, person: &Person) -> RepoResult<i64> {
        Ok(insert_content(self.conn, person.content())?)
    }

    fn insert_person_with_id(&self, person: &Person) -> RepoResult<i64> {
        let [(_, first_name), (_, last_name), (_, bio)] = person.content().columns();
        self.conn.execute(
            INSERT_PERSON_WITH_ID_SQL.as_str(),
            params![person.id, first_name, last_name, bio],
        )?;

        Ok(person.id)
    }

    fn delete_person(&self, id: i64) -> RepoResult<usize> {
        let removed = self.conn.execute(DELETE_PERSON_SQL.as_str(), [id])?;
        Ok(removed)
    }
}

/// Inserts content columns and returns the rowid SQLite assigned.
///
/// Shared with schema seeding, which runs inside the migration transaction.
pub(crate) fn insert_content(
    conn: &Connection,
    content: PersonContent<'_>,
) -> rusqlite::Result<i64> {
    let [(_, first_name), (_, last_name), (_, bio)] = content.columns();
    conn.execute(INSERT_PERSON_SQL.as_str(), params![first_name, last_name, bio])?;
    Ok(conn.last_insert_rowid())
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    Ok(Person::from_row(row)?)
}

#[cfg(test)]
mod tests {
    use super::{
        PersonRepository, RepoError, SqlitePersonRepository, GET_PERSON_SQL, INSERT_PERSON_SQL,
        INSERT_PERSON_WITH_ID_SQL, UPDATE_PERSON_SQL,
    };
    use crate::db::open_db_in_memory;
    use crate::model::person::{DecodeError, Person};

    #[test]
    fn statements_follow_canonical_column_order() {
        assert_eq!(
            GET_PERSON_SQL.as_str(),
            "SELECT _id, firstname, lastname, bio FROM Person WHERE _id = ?1;"
        );
        assert_eq!(
            INSERT_PERSON_SQL.as_str(),
            "INSERT INTO Person (firstname, lastname, bio) VALUES (?1, ?2, ?3);"
        );
        assert_eq!(
            INSERT_PERSON_WITH_ID_SQL.as_str(),
            "INSERT INTO Person (_id, firstname, lastname, bio) VALUES (?1, ?2, ?3, ?4);"
        );
        assert_eq!(
            UPDATE_PERSON_SQL.as_str(),
            "UPDATE Person SET firstname = ?1, lastname = ?2, bio = ?3 WHERE _id = ?4;"
        );
    }

    #[test]
    fn update_of_unknown_id_changes_nothing() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePersonRepository::new(&conn);

        let mut ghost = Person::with_names("No", "One", "");
        ghost.id = 404;
        assert_eq!(repo.update_person(&ghost).unwrap(), 0);
        assert!(repo.get_person(404).unwrap().is_none());
    }

    #[test]
    fn insert_assigns_next_rowid_after_seed_rows() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePersonRepository::new(&conn);

        let id = repo
            .insert_person(&Person::with_names("Ada", "Lovelace", "mathematician"))
            .unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn insert_ignores_caller_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePersonRepository::new(&conn);

        let mut person = Person::with_names("Alan", "Turing", "");
        person.id = 77;
        let id = repo.insert_person(&person).unwrap();
        assert_ne!(id, 77);
        assert!(repo.get_person(77).unwrap().is_none());
    }

    #[test]
    fn insert_with_id_keeps_caller_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePersonRepository::new(&conn);

        let mut person = Person::with_names("Alan", "Turing", "");
        person.id = 77;
        assert_eq!(repo.insert_person_with_id(&person).unwrap(), 77);
        assert_eq!(repo.get_person(77).unwrap(), Some(person));
    }

    #[test]
    fn list_is_ordered_by_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePersonRepository::new(&conn);
        repo.insert_person(&Person::with_names("Ada", "Lovelace", ""))
            .unwrap();

        let ids: Vec<i64> = repo
            .list_persons()
            .unwrap()
            .into_iter()
            .map(|person| person.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn blob_in_text_column_is_a_decode_error() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO Person (_id, firstname) VALUES (50, X'00FF');",
            [],
        )
        .unwrap();
        let repo = SqlitePersonRepository::new(&conn);

        let err = repo.get_person(50).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Decode(DecodeError::WrongType { index: 1, .. })
        ));
        assert!(repo.get_person(1).unwrap().is_some());
    }
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define row-level data access primitives for person storage.
//! - Isolate SQLite statements from the store's upsert/notify orchestration.
//!
//! # Invariants
//! - Repository calls never decide insert vs. update; the store does.
//! - Read paths surface undecodable rows as `RepoError::Decode`.

pub mod person_repo;

//! Person record domain model.
//!
//! # Responsibility
//! - Define the single record shape persisted by the store.
//! - Own the canonical column ordering used for row decoding and writes.
//!
//! # Invariants
//! - A record is identified by one integer id once persisted.
//! - Unpersisted records carry `UNSAVED_ID`.

pub mod person;

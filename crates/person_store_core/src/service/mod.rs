//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the store's public operations.
//! - Own locking and change notification so callers never see SQL.

pub mod person_store;

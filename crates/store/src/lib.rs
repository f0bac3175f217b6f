//! SQLite store for the local game library.
//!
//! The store is the source of truth for what the user owns locally: every
//! game the library knows about, which runner (if any) has it installed, and
//! the catalog metadata last merged into it. The sync engine reads it once per
//! pass and writes back through [`Repository`].

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{BackfillField, EntryFields, EntryId, LibraryEntry, NewEntry};
pub use crate::repo::Repository;

//! Note persistence contracts.
//!
//! # Responsibility
//! - Define the key-value contract the engine persists notes through.
//! - Keep SQLite details behind the trait so scan/sync layers stay
//!   storage-agnostic.
//!
//! # Invariants
//! - A missing key reads back as the empty string, never an error.
//! - `set` overwrites unconditionally; `delete` is idempotent.
//! - For any identifier at most one authoritative value exists at a time
//!   (last writer wins).

use crate::db::DbError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite;
pub mod transfer;

/// Opaque token naming the subject a note is attached to.
///
/// Identifiers are extracted from the host page, never generated locally;
/// the store treats them as plain keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence-layer error for note storage operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value contract for note persistence.
pub trait NoteStore {
    /// Returns the note for `id`, or the empty string when absent.
    fn get(&self, id: &EntityId) -> StoreResult<String>;
    /// Stores `note` under `id`, overwriting any prior value.
    fn set(&mut self, id: &EntityId, note: &str) -> StoreResult<()>;
    /// Removes the note for `id`; removing an absent key succeeds.
    fn delete(&mut self, id: &EntityId) -> StoreResult<()>;
    /// Dumps every entry, ordered by identifier.
    fn export_all(&self) -> StoreResult<BTreeMap<String, String>>;
    /// Writes every entry verbatim, overwriting existing keys.
    fn import_all(&mut self, entries: &BTreeMap<String, String>) -> StoreResult<()>;
}

/// Whether `note` counts as absent for display decisions.
pub fn is_blank(note: &str) -> bool {
    note.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::is_blank;

    #[test]
    fn blank_detection_trims_whitespace() {
        assert!(is_blank(""));
        assert!(is_blank("  \n\t "));
        assert!(!is_blank(" x "));
    }
}

//! Whole-store JSON export and import.
//!
//! # Responsibility
//! - Serialize the full identifier-to-note mapping for file export.
//! - Import a mapping document verbatim, reporting `InvalidFormat` when the
//!   payload does not parse as the mapping shape.
//!
//! # Invariants
//! - A failed parse leaves the store unmodified.
//! - No validation happens beyond the mapping shape; imported entries are
//!   trusted as-is.

use super::{NoteStore, StoreError};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Transfer-layer error for export/import operations.
#[derive(Debug)]
pub enum TransferError {
    /// Payload is not a JSON object of string-to-string entries.
    InvalidFormat(String),
    /// Underlying persistence failure.
    Store(StoreError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(message) => write!(f, "invalid format: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFormat(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Dumps the entire store as a pretty-printed JSON mapping.
pub fn export_json(store: &impl NoteStore) -> Result<String, TransferError> {
    let entries = store.export_all()?;
    serde_json::to_string_pretty(&entries)
        .map_err(|err| TransferError::InvalidFormat(err.to_string()))
}

/// Imports a JSON mapping document, returning the number of entries written.
pub fn import_json(store: &mut impl NoteStore, payload: &str) -> Result<usize, TransferError> {
    let entries: BTreeMap<String, String> = serde_json::from_str(payload)
        .map_err(|err| TransferError::InvalidFormat(err.to_string()))?;
    store.import_all(&entries)?;
    Ok(entries.len())
}

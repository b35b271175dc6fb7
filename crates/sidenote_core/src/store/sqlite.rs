//! SQLite-backed note store.
//!
//! # Responsibility
//! - Implement [`NoteStore`] on top of the migrated `notes` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - The connection handed to `try_new` must already be migrated; readiness
//!   is verified instead of assumed.
//! - `updated_at` is refreshed on every write.

use super::{EntityId, NoteStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite implementation of the note store.
pub struct SqliteNoteStore {
    conn: Connection,
}

impl SqliteNoteStore {
    /// Opens (or creates) a file-backed store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a fresh in-memory store. Used by tests and dry runs.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Wraps an already-migrated connection after a readiness check.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_notes_table_ready(&conn)?;
        Ok(Self { conn })
    }
}

impl NoteStore for SqliteNoteStore {
    fn get(&self, id: &EntityId) -> StoreResult<String> {
        let note: Option<String> = self
            .conn
            .query_row(
                "SELECT content FROM notes WHERE entity_id = ?1;",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(note.unwrap_or_default())
    }

    fn set(&mut self, id: &EntityId, note: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO notes (entity_id, content) VALUES (?1, ?2)
             ON CONFLICT(entity_id) DO UPDATE SET
                content = excluded.content,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![id.as_str(), note],
        )?;
        Ok(())
    }

    fn delete(&mut self, id: &EntityId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM notes WHERE entity_id = ?1;", [id.as_str()])?;
        Ok(())
    }

    fn export_all(&self) -> StoreResult<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT entity_id, content FROM notes ORDER BY entity_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut entries = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let entity_id: String = row.get(0)?;
            let content: String = row.get(1)?;
            entries.insert(entity_id, content);
        }
        Ok(entries)
    }

    fn import_all(&mut self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (entity_id, content) in entries {
            tx.execute(
                "INSERT INTO notes (entity_id, content) VALUES (?1, ?2)
                 ON CONFLICT(entity_id) DO UPDATE SET
                    content = excluded.content,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![entity_id, content],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn ensure_notes_table_ready(conn: &Connection) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::InvalidData(
            "notes table missing; connection was not migrated".to_string(),
        ));
    }
    Ok(())
}

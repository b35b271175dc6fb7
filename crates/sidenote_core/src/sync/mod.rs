//! Per-dialog note synchronization.
//!
//! # Responsibility
//! - Seed the note editor from the store when a dialog opens, migrating any
//!   pre-existing host-side note into local storage first.
//! - Persist edits with an idle debounce, last writer wins.
//!
//! # Invariants
//! - At most one pending write exists per dialog; each edit replaces the
//!   prior deadline.
//! - Dialog removal does not cancel a pending flush; persistence is keyed
//!   by identifier, not by element.
//! - A dialog without an extractable identifier never seeds or persists.

use crate::dom::{NodeId, PageTree};
use crate::store::{is_blank, EntityId, NoteStore};
use log::{debug, warn};

/// Debounce interval between the last edit and its persistence write.
pub const DEBOUNCE_MS: u64 = 400;

/// Lifecycle of one dialog's synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Constructed but not yet seeded.
    Opened,
    /// Store value injected into the editor.
    Seeded,
    /// At least one local edit observed.
    Editing,
}

#[derive(Debug, Clone)]
struct PendingWrite {
    value: String,
    deadline_ms: u64,
}

/// Synchronization controller for one note dialog.
#[derive(Debug)]
pub struct DialogSync {
    dialog: NodeId,
    textarea: NodeId,
    entity: Option<EntityId>,
    state: SyncState,
    pending: Option<PendingWrite>,
}

impl DialogSync {
    /// Wires a detected dialog/textarea pair. `entity` is `None` when
    /// extraction missed; such dialogs stay inert but processed.
    pub fn new(dialog: NodeId, textarea: NodeId, entity: Option<EntityId>) -> Self {
        Self {
            dialog,
            textarea,
            entity,
            state: SyncState::Opened,
            pending: None,
        }
    }

    pub fn dialog(&self) -> NodeId {
        self.dialog
    }

    pub fn textarea(&self) -> NodeId {
        self.textarea
    }

    pub fn entity(&self) -> Option<&EntityId> {
        self.entity.as_ref()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn has_pending_write(&self) -> bool {
        self.pending.is_some()
    }

    /// Seeds the editor from the store.
    ///
    /// When the host's own field already holds non-blank text and the store
    /// is empty for this identifier, that text is migrated into the store
    /// first (one-time import of a pre-existing host-side note). The stored
    /// value is then written into the editor. Returns `true` when the editor
    /// content changed and the host must observe a synthetic input event.
    ///
    /// Store failures are logged and swallowed; a failed seed leaves the
    /// host content alone and never halts the caller.
    pub fn seed(&mut self, tree: &mut PageTree, store: &mut impl NoteStore) -> bool {
        let Some(entity) = self.entity.clone() else {
            return false;
        };
        if self.state != SyncState::Opened {
            return false;
        }
        self.state = SyncState::Seeded;

        let host_text = tree.value(self.textarea).to_string();
        if !is_blank(&host_text) {
            match store.get(&entity) {
                Ok(stored) if stored.is_empty() => {
                    if let Err(err) = store.set(&entity, &host_text) {
                        warn!(
                            "event=note_migrate module=sync status=error id={entity} error={err}"
                        );
                    } else {
                        debug!("event=note_migrate module=sync status=ok id={entity}");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("event=store_get module=sync status=error id={entity} error={err}");
                }
            }
        }

        match store.get(&entity) {
            Ok(stored) => {
                debug!(
                    "event=note_seed module=sync status=ok id={entity} chars={}",
                    stored.len()
                );
                tree.set_value(self.textarea, &stored);
                true
            }
            Err(err) => {
                warn!("event=store_get module=sync status=error id={entity} error={err}");
                false
            }
        }
    }

    /// Records one edit; restarts the idle deadline and replaces any
    /// pending value (last writer wins).
    pub fn record_input(&mut self, value: String, now_ms: u64, debounce_ms: u64) {
        if self.entity.is_none() {
            return;
        }
        self.state = SyncState::Editing;
        self.pending = Some(PendingWrite {
            value,
            deadline_ms: now_ms + debounce_ms,
        });
    }

    /// Persists the pending value when its deadline has passed. Returns the
    /// identifier written, if a write happened.
    ///
    /// A failed write is logged at warn level and dropped; there is no
    /// retry (durability is out of scope).
    pub fn flush_due(&mut self, now_ms: u64, store: &mut impl NoteStore) -> Option<EntityId> {
        let due = matches!(&self.pending, Some(pending) if pending.deadline_ms <= now_ms);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        let entity = self.entity.clone()?;
        match store.set(&entity, &pending.value) {
            Ok(()) => {
                debug!(
                    "event=note_flush module=sync status=ok id={entity} chars={}",
                    pending.value.len()
                );
                Some(entity)
            }
            Err(err) => {
                warn!("event=note_flush module=sync status=error id={entity} error={err}");
                None
            }
        }
    }
}

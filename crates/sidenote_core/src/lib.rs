//! Core engine for sidenote: local note augmentation for a third-party,
//! client-rendered page.
//!
//! The scanner subscribes to an explicit structural-change event source,
//! extracts opaque entity identifiers from ambiguous markup, and keeps
//! free-text notes for those entities synchronized with a local SQLite
//! store — independent of the host page's own size-limited note feature.

pub mod augment;
pub mod db;
pub mod dom;
pub mod extract;
pub mod logging;
pub mod scan;
pub mod store;
pub mod sync;

pub use augment::{place_tooltip, LimitOverride, ObservedSet, Placement};
pub use dom::{MutationBatch, NodeId, PageEvent, PageTree, Rect};
pub use extract::{extract, extract_in_document};
pub use logging::{default_log_level, init_logging, logging_status};
pub use scan::{Effect, PageScanner, ScanConfig, ScannerStatus};
pub use store::sqlite::SqliteNoteStore;
pub use store::transfer::{export_json, import_json, TransferError};
pub use store::{EntityId, NoteStore, StoreError, StoreResult};
pub use sync::{DialogSync, SyncState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

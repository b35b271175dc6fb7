//! Structural-change event contract between host and engine.
//!
//! # Responsibility
//! - Name every signal the engine reacts to: mutation batches, attribute
//!   changes, input edits, interceptable host events and timer ticks.
//!
//! # Invariants
//! - One `Mutations` event per coalescing window; the host must not split a
//!   single structural change across batches.
//! - Between delivery of an event and the engine returning, the tree is
//!   stable (single-threaded cooperative model).

use super::tree::NodeId;

/// One coalesced batch of structural page changes.
///
/// `added` holds the roots of newly inserted subtrees; `removed` holds the
/// roots of subtrees detached since the previous batch.
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationBatch {
    pub fn added(nodes: Vec<NodeId>) -> Self {
        Self {
            added: nodes,
            removed: Vec::new(),
        }
    }

    pub fn removed(nodes: Vec<NodeId>) -> Self {
        Self {
            added: Vec::new(),
            removed: nodes,
        }
    }
}

/// Events the scanner subscribes to.
///
/// Every event is delivered together with the host's monotonic clock value
/// (`now_ms`) so debounce deadlines stay deterministic and testable.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// Structural additions/removals since the last batch.
    Mutations(MutationBatch),
    /// One attribute changed on an element (used to re-strip constraints).
    Attribute { node: NodeId, name: String },
    /// Text edit on an editable element; `value` is the post-edit content.
    Input { node: NodeId, value: String },
    /// Any other host-page event subject to capture-phase interception.
    Host { node: NodeId, event_type: String },
    /// Timer advance; drives debounce flushes.
    Tick,
}

//! Host-page model and structural-change event contract.
//!
//! # Responsibility
//! - Model the client-rendered host page as an explicit element tree.
//! - Define the event source the scanner subscribes to, replacing literal
//!   DOM mutation observation with a batching contract.
//!
//! # Invariants
//! - Node ids are never reused within one `PageTree`.
//! - A removed subtree stays addressable (for late debounce flushes) but is
//!   reported as detached.

pub mod event;
pub mod tree;

pub use event::{MutationBatch, PageEvent};
pub use tree::{NodeId, PageTree, Rect};

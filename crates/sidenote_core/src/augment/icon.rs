//! Trigger icon enhancement with self-healing membership.
//!
//! # Responsibility
//! - Mark triggers that carry a non-empty stored note, once each.
//! - Evict detached triggers so recreated elements are re-evaluated.
//!
//! # Invariants
//! - Membership is the source of truth for "already enhanced"; the marker
//!   attribute is cosmetic.
//! - Eviction is an explicit pass on each mutation batch, not a
//!   garbage-collection side effect.

use crate::dom::{NodeId, PageTree};
use std::collections::BTreeSet;

/// Marker attribute set on enhanced triggers. The decorative icon swap
/// itself is host-side presentation and stays outside the engine.
pub const ENHANCED_ATTR: &str = "data-sidenote-enhanced";

/// Set of triggers already enhanced during their current page lifetime.
#[derive(Debug, Default)]
pub struct ObservedSet {
    members: BTreeSet<NodeId>,
}

impl ObservedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    pub fn insert(&mut self, node: NodeId) -> bool {
        self.members.insert(node)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drops every member no longer attached to the page, returning how
    /// many were evicted.
    pub fn evict_detached(&mut self, tree: &PageTree) -> usize {
        let before = self.members.len();
        self.members.retain(|node| tree.is_attached(*node));
        before - self.members.len()
    }
}

/// Marks one trigger as enhanced. Returns `false` when the marker was
/// already present (no-op).
pub fn enhance_trigger(tree: &mut PageTree, trigger: NodeId) -> bool {
    if tree.attr(trigger, ENHANCED_ATTR).is_some() {
        return false;
    }
    tree.set_attr(trigger, ENHANCED_ATTR, "true");
    true
}

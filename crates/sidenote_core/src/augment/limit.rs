//! Host input-limit neutralization.
//!
//! # Responsibility
//! - Strip maximum-length constraints from the note textarea, and keep
//!   them stripped when the host re-imposes them.
//! - Intercept input-related events at the capture phase so host-side
//!   validation handlers higher in the tree never see them.
//!
//! # Invariants
//! - Applied once per element lifetime; state is dropped when the element
//!   detaches.
//! - Default editing behavior is untouched; only propagation is stopped.

use crate::dom::{NodeId, PageTree};
use log::debug;

/// Event types suppressed from propagating past the overridden element.
pub const BLOCKED_EVENT_TYPES: &[&str] = &[
    "keydown",
    "keypress",
    "keyup",
    "beforeinput",
    "input",
    "paste",
];

const MAXLENGTH_ATTR: &str = "maxlength";

/// Per-element override active for the element's lifetime in the page.
#[derive(Debug)]
pub struct LimitOverride {
    target: NodeId,
}

impl LimitOverride {
    /// Installs the override, stripping any present length limit.
    /// Returns the override together with whether a limit was removed.
    pub fn apply(tree: &mut PageTree, target: NodeId) -> (Self, bool) {
        let stripped = tree.remove_attr(target, MAXLENGTH_ATTR);
        if stripped {
            debug!("event=limit_strip module=augment status=ok phase=install");
        }
        (Self { target }, stripped)
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Reacts to an attribute mutation on the target; re-strips the length
    /// limit the moment it reappears. Returns whether a strip happened.
    pub fn on_attribute(&self, tree: &mut PageTree, name: &str) -> bool {
        if name != MAXLENGTH_ATTR {
            return false;
        }
        let stripped = tree.remove_attr(self.target, MAXLENGTH_ATTR);
        if stripped {
            debug!("event=limit_strip module=augment status=ok phase=reapply");
        }
        stripped
    }

    /// Whether an event of `event_type` targeting the element must be
    /// stopped at the capture phase.
    pub fn intercepts(&self, event_type: &str) -> bool {
        BLOCKED_EVENT_TYPES.contains(&event_type)
    }
}

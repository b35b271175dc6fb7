//! Reactive page augmentations driven by the scanner.
//!
//! # Responsibility
//! - Icon enhancement for triggers with stored notes.
//! - Tooltip content rewrite and repositioning.
//! - Host input-limit neutralization.
//!
//! # Invariants
//! - Every augmentation is applied at most once per element lifetime; a
//!   recreated element re-qualifies from scratch.

pub mod icon;
pub mod limit;
pub mod tooltip;

pub use icon::{enhance_trigger, ObservedSet, ENHANCED_ATTR};
pub use limit::{LimitOverride, BLOCKED_EVENT_TYPES};
pub use tooltip::{place_tooltip, rewrite_tooltip, Placement};

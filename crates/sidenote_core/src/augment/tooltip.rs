//! Tooltip content rewrite and repositioning.
//!
//! # Responsibility
//! - Replace a qualifying tooltip's content text with the stored note.
//! - Recenter the tooltip on its trigger, clamped to the viewport.
//!
//! # Invariants
//! - Line breaks in the note survive via pre-formatted whitespace.
//! - The horizontal position always lands inside
//!   `[padding, viewport_width - tooltip_width - padding]`.
//! - An empty note leaves the tooltip untouched; callers gate on that.

use crate::dom::{NodeId, PageTree, Rect};
use crate::scan::ScanConfig;

/// Fixed-position placement computed for a repositioned tooltip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
}

/// Centers the tooltip horizontally on the trigger, a fixed gap above it,
/// clamping the horizontal position to keep `screen_padding` pixels of
/// breathing room from either viewport edge.
pub fn place_tooltip(
    trigger: Rect,
    tooltip: Rect,
    viewport_width: f64,
    screen_padding: f64,
    gap: f64,
) -> Placement {
    let centered = trigger.left + trigger.width / 2.0 - tooltip.width / 2.0;
    let max_left = (viewport_width - tooltip.width - screen_padding).max(screen_padding);
    Placement {
        left: centered.clamp(screen_padding, max_left),
        top: trigger.top - tooltip.height - gap,
    }
}

/// Rewrites the tooltip's content region with `note` and repositions the
/// tooltip relative to its trigger.
///
/// The tooltip carries no identifier or trigger back-reference, so the
/// trigger is resolved globally by its accessible-label prefix. Returns the
/// placement when both bounding boxes were available; the content rewrite
/// happens regardless.
pub fn rewrite_tooltip(
    tree: &mut PageTree,
    config: &ScanConfig,
    tooltip: NodeId,
    note: &str,
) -> Option<Placement> {
    let content = find_by_class(tree, tooltip, &config.tooltip_content_class)?;
    tree.set_text(content, note);
    tree.set_style(content, "white-space", "pre-wrap");

    let trigger = tree.find(|tree, node| {
        tree.attr(node, "aria-label")
            .map(|label| label.starts_with(&config.trigger_label_prefix))
            .unwrap_or(false)
    })?;
    let trigger_rect = tree.rect(trigger)?;
    let tooltip_rect = tree.rect(tooltip)?;

    let placement = place_tooltip(
        trigger_rect,
        tooltip_rect,
        tree.viewport_width(),
        config.screen_padding,
        config.tooltip_gap,
    );

    tree.set_style(tooltip, "transform", "none");
    tree.set_style(tooltip, "opacity", "1");
    tree.set_style(tooltip, "transition", "none");
    tree.set_style(tooltip, "position", "fixed");
    tree.set_style(tooltip, "z-index", "9999");
    tree.set_style(tooltip, "left", &format!("{}px", placement.left));
    tree.set_style(tooltip, "top", &format!("{}px", placement.top));

    // The caret decoration must track the recentered box.
    for class in [
        config.tooltip_pointer_class.as_str(),
        config.tooltip_pointer_bg_class.as_str(),
    ] {
        if let Some(pointer) = find_by_class(tree, tooltip, class) {
            tree.set_style(pointer, "left", "50%");
        }
    }

    Some(placement)
}

fn find_by_class(tree: &PageTree, scope: NodeId, fragment: &str) -> Option<NodeId> {
    tree.subtree(scope)
        .into_iter()
        .find(|node| tree.class_contains(*node, fragment))
}

#[cfg(test)]
mod tests {
    use super::place_tooltip;
    use crate::dom::Rect;

    const PADDING: f64 = 8.0;
    const GAP: f64 = 6.0;
    const VIEWPORT: f64 = 1280.0;

    fn tooltip(width: f64, height: f64) -> Rect {
        Rect::new(0.0, 0.0, width, height)
    }

    #[test]
    fn centered_placement_above_trigger() {
        let trigger = Rect::new(600.0, 300.0, 40.0, 40.0);
        let placement = place_tooltip(trigger, tooltip(200.0, 50.0), VIEWPORT, PADDING, GAP);
        assert_eq!(placement.left, 600.0 + 20.0 - 100.0);
        assert_eq!(placement.top, 300.0 - 50.0 - GAP);
    }

    #[test]
    fn clamps_at_left_viewport_edge() {
        let trigger = Rect::new(2.0, 100.0, 20.0, 20.0);
        let placement = place_tooltip(trigger, tooltip(300.0, 60.0), VIEWPORT, PADDING, GAP);
        assert_eq!(placement.left, PADDING);
    }

    #[test]
    fn clamps_at_right_viewport_edge() {
        let trigger = Rect::new(1270.0, 100.0, 20.0, 20.0);
        let placement = place_tooltip(trigger, tooltip(300.0, 60.0), VIEWPORT, PADDING, GAP);
        assert_eq!(placement.left, VIEWPORT - 300.0 - PADDING);
    }

    #[test]
    fn placement_stays_in_bounds_for_any_trigger_position() {
        let size = tooltip(250.0, 40.0);
        for left in (-200..2000).step_by(37) {
            let trigger = Rect::new(f64::from(left), 500.0, 32.0, 32.0);
            let placement = place_tooltip(trigger, size, VIEWPORT, PADDING, GAP);
            assert!(placement.left >= PADDING);
            assert!(placement.left <= VIEWPORT - size.width - PADDING);
        }
    }

    #[test]
    fn oversized_tooltip_pins_to_left_padding() {
        let trigger = Rect::new(100.0, 100.0, 20.0, 20.0);
        let placement = place_tooltip(trigger, tooltip(2000.0, 60.0), VIEWPORT, PADDING, GAP);
        assert_eq!(placement.left, PADDING);
    }
}

use sidenote_core::{
    Effect, EntityId, MutationBatch, NodeId, NoteStore, PageEvent, PageScanner, PageTree, Rect,
    SqliteNoteStore, StoreError, StoreResult,
};
use std::collections::BTreeMap;

const USER_ID: &str = "112233445566778899";

fn scanner_with_note(note: &str) -> PageScanner<SqliteNoteStore> {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();
    if !note.is_empty() {
        store.set(&EntityId::new(USER_ID), note).unwrap();
    }
    PageScanner::with_default_config(store)
}

fn mutations(added: Vec<NodeId>) -> PageEvent {
    PageEvent::Mutations(MutationBatch::added(added))
}

fn profile_panel(tree: &mut PageTree) -> (NodeId, NodeId) {
    let dialog = tree.append_with(tree.root(), "div", &[("role", "dialog")]);
    tree.append_with(
        dialog,
        "img",
        &[("src", &format!("https://cdn.example/avatars/{USER_ID}/a.png")[..])],
    );
    let trigger = tree.append_with(
        dialog,
        "button",
        &[("aria-label", "Add Note for this user")],
    );
    (dialog, trigger)
}

#[test]
fn trigger_with_stored_note_is_enhanced_once() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("has a note");
    let (dialog, trigger) = profile_panel(&mut tree);

    let effects = scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    assert!(effects.contains(&Effect::IconEnhanced { node: trigger }));
    assert_eq!(tree.attr(trigger, "data-sidenote-enhanced"), Some("true"));

    // Re-scanning the same trigger is a no-op.
    let again = scanner.handle_event(&mut tree, mutations(vec![]), 1);
    assert!(!again
        .iter()
        .any(|effect| matches!(effect, Effect::IconEnhanced { .. })));
    assert_eq!(scanner.status().enhanced_triggers, 1);
}

#[test]
fn trigger_without_stored_note_is_left_alone() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("   ");
    let (dialog, trigger) = profile_panel(&mut tree);

    let effects = scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    assert!(effects.is_empty());
    assert!(tree.attr(trigger, "data-sidenote-enhanced").is_none());
}

#[test]
fn removed_trigger_is_evicted_and_a_recreated_one_requalifies() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("has a note");
    let (dialog, trigger) = profile_panel(&mut tree);
    scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    assert_eq!(scanner.status().enhanced_triggers, 1);

    tree.remove(trigger);
    scanner.handle_event(
        &mut tree,
        PageEvent::Mutations(MutationBatch::removed(vec![trigger])),
        1,
    );
    assert_eq!(scanner.status().enhanced_triggers, 0);

    // A structurally new element satisfying the same criteria is evaluated
    // from scratch, not permanently considered enhanced.
    let recreated = tree.append_with(
        dialog,
        "button",
        &[("aria-label", "Add Note for this user")],
    );
    let effects = scanner.handle_event(&mut tree, mutations(vec![recreated]), 2);
    assert!(effects.contains(&Effect::IconEnhanced { node: recreated }));
}

#[test]
fn dialog_is_processed_exactly_once() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("seed me");
    let dialog = tree.append_with(tree.root(), "div", &[("role", "dialog")]);
    tree.append_with(
        dialog,
        "img",
        &[("src", &format!("avatars/{USER_ID}/a.png")[..])],
    );
    let textarea = tree.append_with(dialog, "textarea", &[("class", "note-2Qfk")]);

    let first = scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    assert!(first.contains(&Effect::SyntheticInput { node: textarea }));
    assert_eq!(scanner.status().processed_dialogs, 1);

    let second = scanner.handle_event(&mut tree, mutations(vec![]), 1);
    assert!(!second
        .iter()
        .any(|effect| matches!(effect, Effect::SyntheticInput { .. })));
    assert_eq!(scanner.status().processed_dialogs, 1);
}

fn tooltip_fixture(tree: &mut PageTree, label: &str) -> (NodeId, NodeId, NodeId) {
    let tooltip = tree.append_with(tree.root(), "div", &[("class", "tooltip-2Qfk")]);
    let content = tree.append_with(tooltip, "div", &[("class", "tooltipContent-3x")]);
    tree.set_text(content, label);
    let pointer = tree.append_with(tooltip, "div", &[("class", "tooltipPointer-1a")]);
    (tooltip, content, pointer)
}

#[test]
fn tooltip_is_rewritten_and_clamped_near_viewport_edge() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("line one\nline two");
    let (dialog, trigger) = profile_panel(&mut tree);
    scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);

    // Trigger hugs the right viewport edge; the tooltip must clamp.
    tree.set_rect(trigger, Rect::new(1260.0, 400.0, 20.0, 20.0));
    let (tooltip, content, pointer) = tooltip_fixture(&mut tree, "Add Note");
    tree.set_rect(tooltip, Rect::new(0.0, 0.0, 300.0, 60.0));

    let effects = scanner.handle_event(&mut tree, mutations(vec![tooltip]), 1);

    let placement = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::TooltipRewritten {
                placement: Some(placement),
                ..
            } => Some(*placement),
            _ => None,
        })
        .expect("tooltip placed");
    assert_eq!(placement.left, 1280.0 - 300.0 - 8.0);
    assert_eq!(placement.top, 400.0 - 60.0 - 6.0);

    assert_eq!(tree.text(content), "line one\nline two");
    assert_eq!(tree.style(content, "white-space").as_deref(), Some("pre-wrap"));
    assert_eq!(tree.style(tooltip, "position").as_deref(), Some("fixed"));
    assert_eq!(tree.style(pointer, "left").as_deref(), Some("50%"));
}

#[test]
fn tooltip_with_blank_stored_note_is_untouched() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("  \n ");
    let (dialog, _trigger) = profile_panel(&mut tree);
    scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);

    let (tooltip, content, _pointer) = tooltip_fixture(&mut tree, "Add Note");
    let effects = scanner.handle_event(&mut tree, mutations(vec![tooltip]), 1);

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::TooltipRewritten { .. })));
    assert_eq!(tree.text(content), "Add Note");
}

#[test]
fn unrelated_tooltips_are_ignored() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("note text");
    let (dialog, _trigger) = profile_panel(&mut tree);
    scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);

    let (_tooltip, content, _pointer) = tooltip_fixture(&mut tree, "Mute channel");
    let effects = scanner.handle_event(&mut tree, mutations(vec![content]), 1);
    assert!(effects.is_empty());
    assert_eq!(tree.text(content), "Mute channel");
}

#[test]
fn length_limit_is_stripped_and_kept_stripped() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("");
    let dialog = tree.append_with(tree.root(), "div", &[("role", "dialog")]);
    tree.append_with(
        dialog,
        "img",
        &[("src", &format!("avatars/{USER_ID}/a.png")[..])],
    );
    let textarea = tree.append_with(
        dialog,
        "textarea",
        &[("class", "note-2Qfk"), ("maxlength", "256")],
    );

    let effects = scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    assert!(effects.contains(&Effect::LimitStripped { node: textarea }));
    assert!(tree.attr(textarea, "maxlength").is_none());

    // Host re-imposes the limit; the override reacts to the attribute
    // mutation instead of failing.
    tree.set_attr(textarea, "maxlength", "256");
    let restripped = scanner.handle_event(
        &mut tree,
        PageEvent::Attribute {
            node: textarea,
            name: "maxlength".to_string(),
        },
        1,
    );
    assert!(restripped.contains(&Effect::LimitStripped { node: textarea }));
    assert!(tree.attr(textarea, "maxlength").is_none());

    let unrelated = scanner.handle_event(
        &mut tree,
        PageEvent::Attribute {
            node: textarea,
            name: "rows".to_string(),
        },
        2,
    );
    assert!(unrelated.is_empty());
}

#[test]
fn input_related_events_are_stopped_at_capture_phase() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("");
    let dialog = tree.append_with(tree.root(), "div", &[("role", "dialog")]);
    tree.append_with(
        dialog,
        "img",
        &[("src", &format!("avatars/{USER_ID}/a.png")[..])],
    );
    let textarea = tree.append_with(dialog, "textarea", &[("class", "note-2Qfk")]);
    scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);

    let paste = scanner.handle_event(
        &mut tree,
        PageEvent::Host {
            node: textarea,
            event_type: "paste".to_string(),
        },
        1,
    );
    assert!(paste.contains(&Effect::PropagationStopped {
        node: textarea,
        event_type: "paste".to_string(),
    }));

    let focus = scanner.handle_event(
        &mut tree,
        PageEvent::Host {
            node: textarea,
            event_type: "focus".to_string(),
        },
        2,
    );
    assert!(focus.is_empty());
}

#[test]
fn override_state_is_dropped_when_the_element_detaches() {
    let mut tree = PageTree::new();
    let mut scanner = scanner_with_note("");
    let dialog = tree.append_with(tree.root(), "div", &[("role", "dialog")]);
    let textarea = tree.append_with(dialog, "textarea", &[("class", "note-2Qfk")]);
    scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    assert_eq!(scanner.status().active_overrides, 1);

    tree.remove(dialog);
    scanner.handle_event(
        &mut tree,
        PageEvent::Mutations(MutationBatch::removed(vec![dialog])),
        1,
    );
    assert_eq!(scanner.status().active_overrides, 0);

    let after = scanner.handle_event(
        &mut tree,
        PageEvent::Host {
            node: textarea,
            event_type: "paste".to_string(),
        },
        2,
    );
    assert!(after.is_empty());
}

/// Store double whose every operation fails, for the resilience policy:
/// a store outage must never halt the observers.
struct FailingStore;

impl NoteStore for FailingStore {
    fn get(&self, _id: &EntityId) -> StoreResult<String> {
        Err(StoreError::InvalidData("store offline".to_string()))
    }

    fn set(&mut self, _id: &EntityId, _note: &str) -> StoreResult<()> {
        Err(StoreError::InvalidData("store offline".to_string()))
    }

    fn delete(&mut self, _id: &EntityId) -> StoreResult<()> {
        Err(StoreError::InvalidData("store offline".to_string()))
    }

    fn export_all(&self) -> StoreResult<BTreeMap<String, String>> {
        Err(StoreError::InvalidData("store offline".to_string()))
    }

    fn import_all(&mut self, _entries: &BTreeMap<String, String>) -> StoreResult<()> {
        Err(StoreError::InvalidData("store offline".to_string()))
    }
}

#[test]
fn store_failures_never_halt_the_scanner() {
    let mut tree = PageTree::new();
    let mut scanner = PageScanner::with_default_config(FailingStore);
    let dialog = tree.append_with(tree.root(), "div", &[("role", "dialog")]);
    tree.append_with(
        dialog,
        "img",
        &[("src", &format!("avatars/{USER_ID}/a.png")[..])],
    );
    let trigger = tree.append_with(dialog, "button", &[("aria-label", "Add Note")]);
    let textarea = tree.append_with(dialog, "textarea", &[("class", "note-2Qfk")]);

    let effects = scanner.handle_event(&mut tree, mutations(vec![dialog]), 0);
    // Trigger enhancement and seeding are skipped, the dialog is still
    // wired and the batch completes.
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::IconEnhanced { .. })));
    assert!(tree.attr(trigger, "data-sidenote-enhanced").is_none());
    assert_eq!(scanner.status().processed_dialogs, 1);

    // A debounced edit whose write fails is dropped, not retried.
    scanner.handle_event(
        &mut tree,
        PageEvent::Input {
            node: textarea,
            value: "lost words".to_string(),
        },
        100,
    );
    let flush = scanner.handle_event(&mut tree, PageEvent::Tick, 1_000);
    assert!(!flush
        .iter()
        .any(|effect| matches!(effect, Effect::NotePersisted { .. })));
}

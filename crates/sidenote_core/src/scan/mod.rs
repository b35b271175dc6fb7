//! Mutation scanner and dispatch wiring.
//!
//! # Responsibility
//! - Subscribe to the host's structural-change event source and drive every
//!   reactive component: icon enhancement, tooltip rewriting, dialog
//!   synchronization and limit overrides.
//! - Own the per-session state the design notes require to live on one
//!   controller instance: the observed-trigger set, the processed-dialog
//!   set, live synchronizers and overrides.
//!
//! # Invariants
//! - No extraction miss or store failure may halt dispatch; the affected
//!   surface is skipped for that cycle and retried on the next batch.
//! - The processed-dialog set only grows; dialogs are single-use.
//! - Observed triggers are evicted when detached so recreated elements
//!   re-qualify from scratch.

use crate::augment::icon::{enhance_trigger, ObservedSet};
use crate::augment::limit::LimitOverride;
use crate::augment::tooltip::{rewrite_tooltip, Placement};
use crate::dom::{MutationBatch, NodeId, PageEvent, PageTree};
use crate::extract::extract;
use crate::store::{is_blank, EntityId, NoteStore};
use crate::sync::{DialogSync, DEBOUNCE_MS};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Selector criteria and tuning knobs for one page session.
///
/// Defaults mirror the host markup conventions the engine was written
/// against; hosts with diverging markup deserialize their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Tag of note-trigger elements.
    pub trigger_tag: String,
    /// Accessible-label prefix identifying note triggers.
    pub trigger_label_prefix: String,
    /// `role` attribute value marking dialog surfaces.
    pub dialog_role: String,
    /// Class fragments a note textarea may carry; any match qualifies.
    pub note_textarea_classes: Vec<String>,
    /// Class fragment of tooltip containers.
    pub tooltip_class: String,
    /// Class fragment of the tooltip content region.
    pub tooltip_content_class: String,
    /// Class fragment of the tooltip caret.
    pub tooltip_pointer_class: String,
    /// Class fragment of the tooltip caret backdrop.
    pub tooltip_pointer_bg_class: String,
    /// Expected host text in a rewritable tooltip's content region.
    pub tooltip_label: String,
    /// Idle interval between the last edit and its persistence write.
    pub debounce_ms: u64,
    /// Minimum distance kept from either viewport edge when repositioning.
    pub screen_padding: f64,
    /// Vertical gap between trigger top and tooltip bottom.
    pub tooltip_gap: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            trigger_tag: "button".to_string(),
            trigger_label_prefix: "Add Note".to_string(),
            dialog_role: "dialog".to_string(),
            note_textarea_classes: vec!["note".to_string(), "textarea".to_string()],
            tooltip_class: "tooltip".to_string(),
            tooltip_content_class: "tooltipContent".to_string(),
            tooltip_pointer_class: "tooltipPointer".to_string(),
            tooltip_pointer_bg_class: "tooltipPointerBg".to_string(),
            tooltip_label: "Add Note".to_string(),
            debounce_ms: DEBOUNCE_MS,
            screen_padding: 8.0,
            tooltip_gap: 6.0,
        }
    }
}

/// Outward-visible consequences of one event dispatch.
///
/// Hosts apply these (dispatch a synthetic input event, stop propagation of
/// a captured event); tests observe the engine through them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The engine changed an editable value; the host must fire an input
    /// event so the page's own reactive bindings observe it.
    SyntheticInput { node: NodeId },
    /// A captured host event must not propagate past this element.
    PropagationStopped { node: NodeId, event_type: String },
    /// A debounced edit reached the store.
    NotePersisted { id: EntityId },
    /// A tooltip was rewritten; placement is present when both bounding
    /// boxes were known.
    TooltipRewritten {
        node: NodeId,
        placement: Option<Placement>,
    },
    /// A trigger gained the enhanced marker.
    IconEnhanced { node: NodeId },
    /// A re-imposed length limit was stripped.
    LimitStripped { node: NodeId },
}

/// Diagnostic snapshot of scanner state (session heartbeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScannerStatus {
    pub enhanced_triggers: usize,
    pub processed_dialogs: usize,
    pub active_overrides: usize,
    pub pending_writes: usize,
}

/// Stateful controller driving all reactive components for one page
/// session. Create on load, discard on navigation away.
pub struct PageScanner<S: NoteStore> {
    config: ScanConfig,
    store: S,
    observed: ObservedSet,
    processed_dialogs: BTreeSet<NodeId>,
    syncs: Vec<DialogSync>,
    overrides: BTreeMap<NodeId, LimitOverride>,
}

impl<S: NoteStore> PageScanner<S> {
    pub fn new(store: S, config: ScanConfig) -> Self {
        Self {
            config,
            store,
            observed: ObservedSet::new(),
            processed_dialogs: BTreeSet::new(),
            syncs: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_default_config(store: S) -> Self {
        Self::new(store, ScanConfig::default())
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Session heartbeat snapshot.
    pub fn status(&self) -> ScannerStatus {
        ScannerStatus {
            enhanced_triggers: self.observed.len(),
            processed_dialogs: self.processed_dialogs.len(),
            active_overrides: self.overrides.len(),
            pending_writes: self
                .syncs
                .iter()
                .filter(|sync| sync.has_pending_write())
                .count(),
        }
    }

    /// Dispatches one host event. `now_ms` is the host's monotonic clock.
    pub fn handle_event(
        &mut self,
        tree: &mut PageTree,
        event: PageEvent,
        now_ms: u64,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            PageEvent::Mutations(batch) => self.on_mutations(tree, &batch, &mut effects),
            PageEvent::Attribute { node, name } => {
                self.on_attribute(tree, node, &name, &mut effects)
            }
            PageEvent::Input { node, value } => {
                self.on_input(node, value, now_ms, &mut effects)
            }
            PageEvent::Host { node, event_type } => {
                self.on_host_event(node, &event_type, &mut effects)
            }
            PageEvent::Tick => self.on_tick(now_ms, &mut effects),
        }
        effects
    }

    fn on_mutations(
        &mut self,
        tree: &mut PageTree,
        batch: &MutationBatch,
        effects: &mut Vec<Effect>,
    ) {
        let evicted = self.observed.evict_detached(tree);
        self.overrides
            .retain(|node, _| tree.is_attached(*node));
        // Pending flushes of removed dialogs stay alive on purpose; a final
        // edit may still reach the store after the element is gone.

        self.scan_triggers(tree, effects);
        self.scan_tooltips(tree, &batch.added, effects);
        self.scan_dialogs(tree, effects);

        debug!(
            "event=scan_batch module=scan status=ok added={} removed={} evicted={evicted} effects={}",
            batch.added.len(),
            batch.removed.len(),
            effects.len()
        );
    }

    /// Trigger watcher: enhance note triggers whose entity has a stored
    /// non-empty note, at most once per element lifetime.
    fn scan_triggers(&mut self, tree: &mut PageTree, effects: &mut Vec<Effect>) {
        let candidates: Vec<NodeId> = tree
            .subtree(tree.root())
            .into_iter()
            .filter(|node| {
                tree.is_attached(*node)
                    && tree.tag(*node) == self.config.trigger_tag
                    && self.has_trigger_label(tree, *node)
                    && !self.observed.contains(*node)
            })
            .collect();

        for trigger in candidates {
            let scope = self
                .closest_dialog(tree, trigger)
                .unwrap_or_else(|| tree.root());
            let Some(entity) = extract(tree, scope) else {
                continue;
            };
            let note = match self.store.get(&entity) {
                Ok(note) => note,
                Err(err) => {
                    warn!("event=store_get module=scan status=error id={entity} error={err}");
                    continue;
                }
            };
            if is_blank(&note) {
                continue;
            }
            enhance_trigger(tree, trigger);
            if self.observed.insert(trigger) {
                debug!("event=icon_enhance module=scan status=ok id={entity}");
                effects.push(Effect::IconEnhanced { node: trigger });
            }
        }
    }

    /// Tooltip watcher: inspects only newly added subtrees.
    fn scan_tooltips(&mut self, tree: &mut PageTree, added: &[NodeId], effects: &mut Vec<Effect>) {
        for root in added {
            if !tree.is_attached(*root) {
                continue;
            }
            let Some(tooltip) = self.find_tooltip(tree, *root) else {
                continue;
            };
            if !self.tooltip_matches_label(tree, tooltip) {
                continue;
            }

            // The tooltip carries no identifier; resolve it from the
            // currently open dialog, falling back to the whole document.
            let scope = tree
                .find(|tree, node| tree.attr(node, "role") == Some(self.config.dialog_role.as_str()))
                .unwrap_or_else(|| tree.root());
            let Some(entity) = extract(tree, scope) else {
                continue;
            };
            let note = match self.store.get(&entity) {
                Ok(note) => note,
                Err(err) => {
                    warn!("event=store_get module=scan status=error id={entity} error={err}");
                    continue;
                }
            };
            if is_blank(&note) {
                continue;
            }

            let placement = rewrite_tooltip(tree, &self.config, tooltip, &note);
            debug!(
                "event=tooltip_rewrite module=scan status=ok id={entity} placed={}",
                placement.is_some()
            );
            effects.push(Effect::TooltipRewritten {
                node: tooltip,
                placement,
            });
        }
    }

    /// Dialog watcher: wires synchronization and the limit override for
    /// every new dialog containing a note textarea.
    fn scan_dialogs(&mut self, tree: &mut PageTree, effects: &mut Vec<Effect>) {
        let dialogs: Vec<NodeId> = tree
            .subtree(tree.root())
            .into_iter()
            .filter(|node| {
                tree.is_attached(*node)
                    && tree.attr(*node, "role") == Some(self.config.dialog_role.as_str())
                    && !self.processed_dialogs.contains(node)
            })
            .collect();

        for dialog in dialogs {
            let Some(textarea) = self.find_note_textarea(tree, dialog) else {
                continue;
            };
            self.processed_dialogs.insert(dialog);

            if !self.overrides.contains_key(&textarea) {
                let (override_state, stripped) = LimitOverride::apply(tree, textarea);
                self.overrides.insert(textarea, override_state);
                if stripped {
                    effects.push(Effect::LimitStripped { node: textarea });
                }
            }

            let entity = extract(tree, dialog);
            if entity.is_none() {
                // Marked processed anyway so extraction is not retried for
                // this dialog on every batch.
                debug!("event=dialog_wire module=scan status=miss");
            }
            let mut sync = DialogSync::new(dialog, textarea, entity);
            if sync.seed(tree, &mut self.store) {
                effects.push(Effect::SyntheticInput { node: textarea });
            }
            self.syncs.push(sync);
        }
    }

    fn on_input(&mut self, node: NodeId, value: String, now_ms: u64, effects: &mut Vec<Effect>) {
        if let Some(override_state) = self.overrides.get(&node) {
            if override_state.intercepts("input") {
                effects.push(Effect::PropagationStopped {
                    node,
                    event_type: "input".to_string(),
                });
            }
        }
        let debounce_ms = self.config.debounce_ms;
        if let Some(sync) = self.syncs.iter_mut().find(|sync| sync.textarea() == node) {
            sync.record_input(value, now_ms, debounce_ms);
        }
    }

    fn on_host_event(&mut self, node: NodeId, event_type: &str, effects: &mut Vec<Effect>) {
        if let Some(override_state) = self.overrides.get(&node) {
            if override_state.intercepts(event_type) {
                effects.push(Effect::PropagationStopped {
                    node,
                    event_type: event_type.to_string(),
                });
            }
        }
    }

    fn on_attribute(
        &mut self,
        tree: &mut PageTree,
        node: NodeId,
        name: &str,
        effects: &mut Vec<Effect>,
    ) {
        if let Some(override_state) = self.overrides.get(&node) {
            if override_state.on_attribute(tree, name) {
                effects.push(Effect::LimitStripped { node });
            }
        }
    }

    fn on_tick(&mut self, now_ms: u64, effects: &mut Vec<Effect>) {
        for sync in &mut self.syncs {
            if let Some(id) = sync.flush_due(now_ms, &mut self.store) {
                effects.push(Effect::NotePersisted { id });
            }
        }
    }

    fn has_trigger_label(&self, tree: &PageTree, node: NodeId) -> bool {
        tree.attr(node, "aria-label")
            .map(|label| label.starts_with(&self.config.trigger_label_prefix))
            .unwrap_or(false)
    }

    fn closest_dialog(&self, tree: &PageTree, node: NodeId) -> Option<NodeId> {
        tree.closest(node, |tree, candidate| {
            tree.attr(candidate, "role") == Some(self.config.dialog_role.as_str())
        })
    }

    fn find_tooltip(&self, tree: &PageTree, root: NodeId) -> Option<NodeId> {
        tree.subtree(root)
            .into_iter()
            .find(|node| tree.class_contains(*node, &self.config.tooltip_class))
    }

    fn tooltip_matches_label(&self, tree: &PageTree, tooltip: NodeId) -> bool {
        tree.subtree(tooltip).into_iter().any(|node| {
            tree.class_contains(node, &self.config.tooltip_content_class)
                && tree.text(node).contains(&self.config.tooltip_label)
        })
    }

    fn find_note_textarea(&self, tree: &PageTree, dialog: NodeId) -> Option<NodeId> {
        tree.subtree(dialog).into_iter().find(|node| {
            tree.tag(*node) == "textarea"
                && self
                    .config
                    .note_textarea_classes
                    .iter()
                    .any(|fragment| tree.class_contains(*node, fragment))
        })
    }
}

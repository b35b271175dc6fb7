//! Arena-backed element tree for the host page.
//!
//! # Responsibility
//! - Hold the elements, attributes and layout geometry the engine reads.
//! - Support the mutations the engine performs back on the page (text,
//!   attributes, inline style, input values).
//!
//! # Invariants
//! - `NodeId` values are only minted by the owning tree and stay valid for
//!   the tree's lifetime, attached or not.
//! - Detaching is recursive: every descendant of a removed node reports
//!   `is_attached == false`.

use std::collections::BTreeMap;

/// Stable handle for one element in a [`PageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Viewport-relative bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: String,
    rect: Option<Rect>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            rect: None,
            parent,
            children: Vec::new(),
            attached: true,
        }
    }
}

const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

/// Mutable model of the host page.
///
/// The embedding host owns structural changes (append/remove) and reports
/// them to the engine as [`MutationBatch`](super::MutationBatch) events; the
/// engine reads the tree during dispatch and writes back content-level
/// changes only.
#[derive(Debug)]
pub struct PageTree {
    nodes: Vec<Node>,
    root: NodeId,
    viewport_width: f64,
}

impl PageTree {
    /// Creates a tree holding only the document body element.
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(Node::new("body", None));
        Self {
            nodes,
            root: NodeId(0),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
        }
    }

    /// The document body node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    /// Appends a new child element under `parent` and returns its id.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let attached = self.nodes[parent.0].attached;
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(tag, Some(parent));
        node.attached = attached;
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Appends a new child element with initial attributes.
    pub fn append_with(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.append(parent, tag);
        for (name, value) in attrs {
            self.set_attr(id, name, value);
        }
        id
    }

    /// Detaches `node` and its whole subtree from the page.
    ///
    /// The subtree stays addressable so that state keyed by `NodeId` (for
    /// example a pending debounce flush) remains meaningful after removal.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            self.nodes[current.0].attached = false;
            stack.extend(self.nodes[current.0].children.iter().copied());
        }
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.nodes[node.0].attached
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Removes an attribute; returns whether it was present.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> bool {
        self.nodes[node.0].attrs.remove(name).is_some()
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    /// Current editable value of an input-like element.
    pub fn value(&self, node: NodeId) -> &str {
        &self.nodes[node.0].value
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.nodes[node.0].value = value.to_string();
    }

    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.nodes[node.0].rect
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.nodes[node.0].rect = Some(rect);
    }

    /// Whether the `class` attribute contains `fragment` as a substring.
    ///
    /// The host obfuscates class names (`tooltip-2Qfk`), so substring match
    /// is the only stable selector criterion.
    pub fn class_contains(&self, node: NodeId, fragment: &str) -> bool {
        self.attr(node, "class")
            .map(|class| class.contains(fragment))
            .unwrap_or(false)
    }

    /// Reads one property out of the inline `style` attribute.
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attr(node, "style")?;
        for entry in style.split(';') {
            let mut parts = entry.splitn(2, ':');
            let name = parts.next()?.trim();
            if name == property {
                return parts.next().map(|value| value.trim().to_string());
            }
        }
        None
    }

    /// Sets one property in the inline `style` attribute, replacing any
    /// existing declaration of the same property.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let mut entries: Vec<(String, String)> = self
            .attr(node, "style")
            .map(|style| {
                style
                    .split(';')
                    .filter_map(|entry| {
                        let mut parts = entry.splitn(2, ':');
                        let name = parts.next()?.trim();
                        let current = parts.next()?.trim();
                        if name.is_empty() || name == property {
                            None
                        } else {
                            Some((name.to_string(), current.to_string()))
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.push((property.to_string(), value.to_string()));
        let style = entries
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(node, "style", &style);
    }

    /// Pre-order traversal of the subtree rooted at `scope`, inclusive.
    pub fn subtree(&self, scope: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack = vec![scope];
        while let Some(current) = stack.pop() {
            ordered.push(current);
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        ordered
    }

    /// Nearest self-or-ancestor satisfying `predicate`.
    pub fn closest(
        &self,
        node: NodeId,
        predicate: impl Fn(&PageTree, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if predicate(self, candidate) {
                return Some(candidate);
            }
            current = self.nodes[candidate.0].parent;
        }
        None
    }

    /// First attached node in document order satisfying `predicate`.
    pub fn find(&self, predicate: impl Fn(&PageTree, NodeId) -> bool) -> Option<NodeId> {
        self.subtree(self.root)
            .into_iter()
            .find(|node| self.is_attached(*node) && predicate(self, *node))
    }
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

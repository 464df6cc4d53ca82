use crate::dom::element::{BoundingBox, ElementNode};
use crate::error::{Result, SwapSageError};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Stable identity of an element within a [`Document`].
///
/// Ids are monotonically assigned and never reused, so a stale handle to a
/// removed element can never alias a newer node. Side tables keyed by
/// `ElementId` (the processing-state store, the overlay table) stay safe to
/// prune lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scroll position and size of the visible area, in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl Viewport {
    /// The currently visible region as a bounding box
    pub fn rect(&self) -> BoundingBox {
        BoundingBox::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

/// Arena slot: element data plus tree topology
#[derive(Debug, Clone)]
struct NodeSlot {
    data: ElementNode,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// An in-memory document tree.
///
/// The document owns element lifetime; the pipeline only annotates elements
/// through side tables keyed by [`ElementId`]. Insertion order is preserved
/// so traversal and debug export are deterministic.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: IndexMap<ElementId, NodeSlot>,
    root: ElementId,
    viewport: Viewport,
    next_id: u64,
}

impl Document {
    /// Create a document with an empty `body` root
    pub fn new() -> Self {
        let root = ElementId(0);
        let mut nodes = IndexMap::new();
        nodes.insert(
            root,
            NodeSlot {
                data: ElementNode::new("body"),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            viewport: Viewport::default(),
            next_id: 1,
        }
    }

    /// The root (`body`) element
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Whether the id refers to a live node
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Element data by id
    pub fn node(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(&id).map(|slot| &slot.data)
    }

    /// Mutable element data by id
    pub fn node_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(&id).map(|slot| &mut slot.data)
    }

    /// Append a new element under `parent` and return its id
    pub fn append_child(&mut self, parent: ElementId, node: ElementNode) -> Result<ElementId> {
        if !self.nodes.contains_key(&parent) {
            return Err(SwapSageError::ElementNotFound(parent.to_string()));
        }
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            NodeSlot {
                data: node,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(slot) = self.nodes.get_mut(&parent) {
            slot.children.push(id);
        }
        Ok(id)
    }

    /// Remove an element and its subtree. Returns the removed ids
    /// (depth-first). Removing the root or a dead id is a no-op.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        if id == self.root || !self.nodes.contains_key(&id) {
            return Vec::new();
        }

        if let Some(parent) = self.nodes.get(&id).and_then(|slot| slot.parent) {
            if let Some(parent_slot) = self.nodes.get_mut(&parent) {
                parent_slot.children.retain(|child| *child != id);
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.nodes.shift_remove(&current) {
                stack.extend(slot.children);
                removed.push(current);
            }
        }
        removed
    }

    /// Child ids of an element, in document order
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes
            .get(&id)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    /// Parent of an element, if any
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|slot| slot.parent)
    }

    /// Tag name of an element
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.node(id).map(|n| n.tag_name.as_str())
    }

    /// Text content of an element
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.node(id).and_then(|n| n.text_content.as_deref())
    }

    /// Replace the visible text of an element
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.text_content = Some(text.into());
        }
    }

    /// Bounding box of an element, in document coordinates
    pub fn bounding_box(&self, id: ElementId) -> Option<BoundingBox> {
        self.node(id).and_then(|n| n.bounding_box)
    }

    /// Set layout geometry for an element
    pub fn set_bounding_box(&mut self, id: ElementId, bbox: BoundingBox) {
        if let Some(node) = self.node_mut(id) {
            node.bounding_box = Some(bbox);
        }
    }

    /// Add a CSS class to an element
    pub fn add_class(&mut self, id: ElementId, class_name: &str) {
        if let Some(node) = self.node_mut(id) {
            node.add_class(class_name);
        }
    }

    /// Remove a CSS class from an element
    pub fn remove_class(&mut self, id: ElementId, class_name: &str) {
        if let Some(node) = self.node_mut(id) {
            node.remove_class(class_name);
        }
    }

    /// Whether an element carries a CSS class
    pub fn has_class(&self, id: ElementId, class_name: &str) -> bool {
        self.node(id).map(|n| n.has_class(class_name)).unwrap_or(false)
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: ElementId, key: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.add_attribute(key, value);
        }
    }

    /// Read an attribute of an element
    pub fn attribute(&self, id: ElementId, key: &str) -> Option<&String> {
        self.node(id).and_then(|n| n.get_attribute(key))
    }

    /// All elements with the given tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<ElementId> {
        let mut found = Vec::new();
        self.collect_by_tag(self.root, tag, true, &mut found);
        found
    }

    /// Elements with the given tag inside `id`'s subtree, excluding `id`
    /// itself, in document order
    pub fn descendants_by_tag(&self, id: ElementId, tag: &str) -> Vec<ElementId> {
        let mut found = Vec::new();
        self.collect_by_tag(id, tag, false, &mut found);
        found
    }

    fn collect_by_tag(&self, id: ElementId, tag: &str, include_self: bool, out: &mut Vec<ElementId>) {
        let Some(slot) = self.nodes.get(&id) else {
            return;
        };
        if include_self && slot.data.is_tag(tag) {
            out.push(id);
        }
        for child in &slot.children {
            self.collect_by_tag(*child, tag, true, out);
        }
    }

    /// Total number of elements, root included
    pub fn count_elements(&self) -> usize {
        self.nodes.len()
    }

    /// Current viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Scroll the viewport to an absolute document position
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.viewport.scroll_x = x;
        self.viewport.scroll_y = y;
    }

    /// Export the tree as pretty JSON for debugging
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export(self.root))
    }

    fn export(&self, id: ElementId) -> serde_json::Value {
        let Some(slot) = self.nodes.get(&id) else {
            return serde_json::Value::Null;
        };
        let children: Vec<_> = slot.children.iter().map(|c| self.export(*c)).collect();
        let mut value = serde_json::to_value(&slot.data).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("element_id".to_string(), serde_json::json!(id.to_string()));
            if !children.is_empty() {
                map.insert("children".to_string(), serde_json::Value::Array(children));
            }
        }
        value
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

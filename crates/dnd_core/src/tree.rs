//! Visual tree the drag-and-drop layer operates on
//!
//! A small retained node arena standing in for the host framework's live
//! tree. The host owns it; the gesture engine reorders it during a drop and
//! the reconciler reads the post-drop order back out of it.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::geometry::{Point, Rect};
use crate::tags::TagTable;

new_key_type! {
    pub struct NodeId;
}

/// Per-node data stored in the arena
#[derive(Clone, Debug, Default)]
pub struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: SmallVec<[String; 2]>,
    bounds: Rect,
    scroll: Point,
}

/// Arena of visual nodes with ordered children and a tag side-table
#[derive(Default)]
pub struct VisualTree {
    nodes: SlotMap<NodeId, NodeData>,
    pub(crate) tags: TagTable,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node with zero bounds
    pub fn create_node(&mut self) -> NodeId {
        self.nodes.insert(NodeData::default())
    }

    /// Create a detached node with the given bounds
    pub fn create_node_with_bounds(&mut self, bounds: Rect) -> NodeId {
        self.nodes.insert(NodeData {
            bounds,
            ..Default::default()
        })
    }

    /// Check if a node exists in this tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Ordered children of a node (empty for unknown nodes)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before the sibling `before`
    ///
    /// A `before` of `None`, or one that is not a child of `parent`, appends.
    /// The child is detached from its previous parent first. Returns false
    /// (and leaves the tree untouched) if either node is unknown or the move
    /// would make a node its own ancestor.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.is_ancestor(child, parent) {
            return false;
        }

        self.detach(child);

        let Some(parent_data) = self.nodes.get_mut(parent) else {
            return false;
        };
        let index = before
            .and_then(|b| parent_data.children.iter().position(|&c| c == b))
            .unwrap_or(parent_data.children.len());
        parent_data.children.insert(index, child);

        if let Some(child_data) = self.nodes.get_mut(child) {
            child_data.parent = Some(parent);
        }
        true
    }

    /// Detach a node from its parent, keeping it (and its subtree) alive
    ///
    /// Returns true if the node was attached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.retain(|&c| c != id);
        }
        if let Some(data) = self.nodes.get_mut(id) {
            data.parent = None;
        }
        true
    }

    /// Remove a node and its whole subtree, dropping their tags
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.detach(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.remove(current) {
                stack.extend(data.children);
            }
            self.tags.remove(current);
        }
        true
    }

    /// Check if `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn add_class(&mut self, id: NodeId, class: impl Into<String>) {
        let class = class.into();
        if let Some(data) = self.nodes.get_mut(id) {
            if !data.classes.iter().any(|c| *c == class) {
                data.classes.push(class);
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.bounds)
    }

    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(data) = self.nodes.get_mut(id) {
            data.bounds = bounds;
        }
    }

    pub fn scroll_offset(&self, id: NodeId) -> Option<Point> {
        self.nodes.get(id).map(|n| n.scroll)
    }

    /// Set the scroll offset, clamped so neither axis goes below zero
    pub fn set_scroll_offset(&mut self, id: NodeId, offset: Point) {
        if let Some(data) = self.nodes.get_mut(id) {
            data.scroll = Point::new(offset.x.max(0.0), offset.y.max(0.0));
        }
    }

    /// Adjust the scroll offset by a delta, clamped at zero
    pub fn scroll_by(&mut self, id: NodeId, delta: Point) {
        if let Some(current) = self.scroll_offset(id) {
            self.set_scroll_offset(id, Point::new(current.x + delta.x, current.y + delta.y));
        }
    }
}

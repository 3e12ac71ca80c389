//! Role metadata for visual nodes
//!
//! Containers and draggable items are identified through a side-table keyed
//! by [`NodeId`] rather than through string attributes on the nodes. A node
//! may be a container and a draggable at the same time (a column that holds
//! cards and is itself reorderable on a board); each role is tagged
//! independently.

use slotmap::SecondaryMap;

use crate::tree::{NodeId, VisualTree};

/// Role a node plays in drag-and-drop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Container,
    Draggable,
}

/// Type and identity imprinted on a node for one role
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Container type or draggable type
    pub kind: String,
    /// Identity of the node within its container (draggables) or type (containers)
    pub id: String,
}

impl Tag {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Tags carried by a single node
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTags {
    pub container: Option<Tag>,
    pub draggable: Option<Tag>,
}

impl NodeTags {
    pub fn get(&self, role: Role) -> Option<&Tag> {
        match role {
            Role::Container => self.container.as_ref(),
            Role::Draggable => self.draggable.as_ref(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<Tag> {
        match role {
            Role::Container => &mut self.container,
            Role::Draggable => &mut self.draggable,
        }
    }
}

/// Side-table mapping node identity to role metadata
#[derive(Default)]
pub struct TagTable {
    entries: SecondaryMap<NodeId, NodeTags>,
}

impl TagTable {
    pub fn get(&self, node: NodeId) -> Option<&NodeTags> {
        self.entries.get(node)
    }

    pub(crate) fn set(&mut self, node: NodeId, role: Role, tag: Tag) {
        if let Some(entry) = self.entries.entry(node) {
            *entry.or_default().slot(role) = Some(tag);
        }
    }

    pub(crate) fn clear(&mut self, node: NodeId, role: Role) {
        if let Some(tags) = self.entries.get_mut(node) {
            *tags.slot(role) = None;
        }
    }

    pub(crate) fn remove(&mut self, node: NodeId) {
        self.entries.remove(node);
    }
}

impl VisualTree {
    /// Imprint container role, type and id on a node
    ///
    /// Overwrites any container tag the node already carried. Unknown nodes
    /// are ignored.
    pub fn tag_container(&mut self, node: NodeId, kind: &str, id: &str) {
        if self.contains(node) {
            self.tags.set(node, Role::Container, Tag::new(kind, id));
        }
    }

    /// Imprint draggable role, type and id on a node
    pub fn tag_draggable(&mut self, node: NodeId, kind: &str, id: &str) {
        if self.contains(node) {
            self.tags.set(node, Role::Draggable, Tag::new(kind, id));
        }
    }

    /// Drop one role's tag from a node
    pub fn untag(&mut self, node: NodeId, role: Role) {
        self.tags.clear(node, role);
    }

    pub fn tag(&self, node: NodeId, role: Role) -> Option<&Tag> {
        self.tags.get(node).and_then(|t| t.get(role))
    }

    /// Container id of a node, if it is tagged as a container
    pub fn container_id(&self, node: NodeId) -> Option<&str> {
        self.tag(node, Role::Container).map(|t| t.id.as_str())
    }

    /// Container type of a node, if it is tagged as a container
    pub fn container_type(&self, node: NodeId) -> Option<&str> {
        self.tag(node, Role::Container).map(|t| t.kind.as_str())
    }

    /// Draggable id of a node, if it is tagged as a draggable
    pub fn draggable_id(&self, node: NodeId) -> Option<&str> {
        self.tag(node, Role::Draggable).map(|t| t.id.as_str())
    }

    /// Draggable type of a node, if it is tagged as a draggable
    pub fn draggable_type(&self, node: NodeId) -> Option<&str> {
        self.tag(node, Role::Draggable).map(|t| t.kind.as_str())
    }

    /// Ordered ids of the tagged draggables directly under a container
    ///
    /// Only direct children count: draggables nested deeper (for example
    /// inside a nested container that reuses the same tag values) belong to
    /// some other container and are skipped. Nodes that are not tagged as
    /// containers have no draggable children.
    pub fn query_child_ids(&self, container: NodeId) -> Vec<String> {
        if self.container_id(container).is_none() {
            return Vec::new();
        }
        self.children(container)
            .iter()
            .filter_map(|&child| self.draggable_id(child))
            .map(str::to_owned)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_with_items(tree: &mut VisualTree, id: &str, items: &[&str]) -> NodeId {
        let container = tree.create_node();
        tree.tag_container(container, "list", id);
        for item in items {
            let node = tree.create_node();
            tree.tag_draggable(node, "item", item);
            tree.append_child(container, node);
        }
        container
    }

    #[test]
    fn test_query_child_ids_in_document_order() {
        let mut tree = VisualTree::new();
        let container = container_with_items(&mut tree, "A", &["x", "y", "z"]);

        assert_eq!(tree.query_child_ids(container), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_query_skips_nested_and_untagged() {
        let mut tree = VisualTree::new();
        let container = container_with_items(&mut tree, "A", &["x"]);

        // Untagged wrapper holding a stray draggable
        let wrapper = tree.create_node();
        let stray = tree.create_node();
        tree.tag_draggable(stray, "item", "stray");
        tree.append_child(wrapper, stray);
        tree.append_child(container, wrapper);

        // Nested container reusing the same id
        let nested = container_with_items(&mut tree, "A", &["deep"]);
        tree.append_child(container, nested);

        assert_eq!(tree.query_child_ids(container), vec!["x"]);
    }

    #[test]
    fn test_query_on_untagged_node_is_empty() {
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        let child = tree.create_node();
        tree.tag_draggable(child, "item", "a");
        tree.append_child(node, child);

        assert!(tree.query_child_ids(node).is_empty());
    }

    #[test]
    fn test_retag_overwrites_same_role_only() {
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        tree.tag_draggable(node, "column", "todo");
        tree.tag_container(node, "list", "old");
        tree.tag_container(node, "list", "new");

        assert_eq!(tree.container_id(node), Some("new"));
        assert_eq!(tree.draggable_id(node), Some("todo"));
        assert_eq!(tree.draggable_type(node), Some("column"));
    }

    #[test]
    fn test_removed_node_loses_tags() {
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        tree.tag_container(node, "list", "A");
        tree.remove(node);

        assert_eq!(tree.container_id(node), None);

        // Tagging a dead key is ignored
        tree.tag_container(node, "list", "B");
        assert_eq!(tree.container_id(node), None);
    }

    #[test]
    fn test_untag() {
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        tree.tag_draggable(node, "item", "a");
        tree.untag(node, Role::Draggable);

        assert_eq!(tree.draggable_id(node), None);
    }
}

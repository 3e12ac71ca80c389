//! Component capability and props
//!
//! The host framework hands the drag-and-drop layer a component; all the
//! layer needs from it is the visual node it rendered. Components that can
//! name their node implement [`ExposesNode`]. Stateless render functions are
//! canonicalized with [`Exposed`], which renders them and remembers the root.

use std::cell::Cell;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::tree::{NodeId, VisualTree};

/// Capability: yields the component's rendered root node, if any
pub trait ExposesNode {
    fn exposes_node(&self) -> Option<NodeId>;
}

impl ExposesNode for NodeId {
    fn exposes_node(&self) -> Option<NodeId> {
        Some(*self)
    }
}

impl ExposesNode for Option<NodeId> {
    fn exposes_node(&self) -> Option<NodeId> {
        *self
    }
}

/// Adapter turning a stateless render function into a node-exposing component
pub struct Exposed<F> {
    render: F,
    root: Cell<Option<NodeId>>,
}

impl<F> Exposed<F>
where
    F: Fn(&mut VisualTree, &Props) -> NodeId,
{
    pub fn new(render: F) -> Self {
        Self {
            render,
            root: Cell::new(None),
        }
    }

    /// Render into the tree and remember the produced root
    pub fn render(&self, tree: &mut VisualTree, props: &Props) -> NodeId {
        let root = (self.render)(tree, props);
        self.root.set(Some(root));
        root
    }
}

impl<F> ExposesNode for Exposed<F> {
    fn exposes_node(&self) -> Option<NodeId> {
        self.root.get()
    }
}

impl<F> fmt::Debug for Exposed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exposed")
            .field("root", &self.root.get())
            .finish_non_exhaustive()
    }
}

/// String props passed to an enhanced component
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Props {
    values: FxHashMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Props with only an `id`
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new().with("id", id)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

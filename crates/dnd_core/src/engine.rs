//! Gesture engine contract
//!
//! The pointer/touch drag engine is an external collaborator: it hit-tests,
//! renders the drag ghost and reorders the visual tree live. This module
//! describes the surface the drag-and-drop layer consumes from it.
//!
//! # Architecture
//!
//! ```text
//! EngineFactory::create(containers, EngineConfig)
//!     ↓ one engine per container type
//! GestureEngine (shared by every mounted container of that type)
//!     ↓ .on(Drop, listener) per mounted instance
//! ListenerSet (listeners keyed by EngineEventKind)
//!     ↓ engine reorders the tree, then broadcasts
//! listener(&EngineEvent, &VisualTree)
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::tree::{NodeId, VisualTree};

/// Axis along which a container lays out and scrolls its items
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    #[default]
    Vertical,
    Horizontal,
}

/// Notification kinds emitted by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineEventKind {
    /// A drag started
    Drag,
    /// A drag finished, whether or not it produced a drop
    DragEnd,
    /// An item was released
    Drop,
}

impl EngineEventKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineEventKind::Drag => "drag",
            EngineEventKind::DragEnd => "dragend",
            EngineEventKind::Drop => "drop",
        }
    }
}

/// A notification broadcast to every listener of a kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Drag {
        node: NodeId,
        source: NodeId,
    },
    DragEnd {
        node: NodeId,
    },
    /// `target` or `source` is absent when the item was released outside
    /// every registered container.
    Drop {
        node: NodeId,
        target: Option<NodeId>,
        source: Option<NodeId>,
    },
}

impl EngineEvent {
    pub fn kind(&self) -> EngineEventKind {
        match self {
            EngineEvent::Drag { .. } => EngineEventKind::Drag,
            EngineEvent::DragEnd { .. } => EngineEventKind::DragEnd,
            EngineEvent::Drop { .. } => EngineEventKind::Drop,
        }
    }

    /// The node being dragged
    pub fn node(&self) -> NodeId {
        match *self {
            EngineEvent::Drag { node, .. }
            | EngineEvent::DragEnd { node }
            | EngineEvent::Drop { node, .. } => node,
        }
    }
}

/// Listener callback
///
/// Receives the tree after the engine has finished any reordering for the
/// event. Uses Rc since the drag-and-drop layer is single-threaded; the Rc
/// allocation is also the listener's identity for [`GestureEngine::off`].
pub type EngineListener = Rc<dyn Fn(&EngineEvent, &VisualTree)>;

/// `accepts(dragged, target)`
pub type AcceptsFn = Rc<dyn Fn(&VisualTree, NodeId, NodeId) -> bool>;

/// `moves(dragged, source, handle)`
pub type MovesFn = Rc<dyn Fn(&VisualTree, NodeId, NodeId, NodeId) -> bool>;

/// Predicates and layout direction handed to the engine at creation
#[derive(Clone)]
pub struct EngineConfig {
    pub accepts: AcceptsFn,
    pub moves: MovesFn,
    pub direction: Direction,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// The gesture engine surface consumed by the registry and lifecycle code
pub trait GestureEngine {
    /// Add a listener for one event kind. Chainable.
    fn on(&mut self, kind: EngineEventKind, listener: EngineListener) -> &mut dyn GestureEngine;

    /// Remove a listener by identity. Unknown listeners are ignored.
    fn off(&mut self, kind: EngineEventKind, listener: &EngineListener);

    /// Registered container nodes, in registration order
    fn containers(&self) -> &[NodeId];

    /// Mutable access for the registry's replace/append/remove bookkeeping
    fn containers_mut(&mut self) -> &mut Vec<NodeId>;

    /// Number of listeners currently attached for a kind
    fn listener_count(&self, kind: EngineEventKind) -> usize;
}

/// Shared handle to an engine instance
pub type EngineHandle = Rc<RefCell<dyn GestureEngine>>;

/// Creates engine instances (`create(initialContainers, config)`)
pub trait EngineFactory {
    fn create(&self, containers: Vec<NodeId>, config: EngineConfig) -> EngineHandle;
}

impl<F> EngineFactory for F
where
    F: Fn(Vec<NodeId>, EngineConfig) -> EngineHandle,
{
    fn create(&self, containers: Vec<NodeId>, config: EngineConfig) -> EngineHandle {
        self(containers, config)
    }
}

/// Listener storage for engine implementations
#[derive(Default, Clone)]
pub struct ListenerSet {
    listeners: FxHashMap<EngineEventKind, SmallVec<[EngineListener; 4]>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EngineEventKind, listener: EngineListener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    /// Remove every registration of `listener` for `kind`
    ///
    /// Returns true if anything was removed.
    pub fn remove(&mut self, kind: EngineEventKind, listener: &EngineListener) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| !Rc::ptr_eq(l, listener));
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.remove(&kind);
        }
        removed
    }

    /// Clone out the listeners for a kind so dispatch can run without
    /// holding a borrow of the owning engine
    pub fn snapshot(&self, kind: EngineEventKind) -> SmallVec<[EngineListener; 4]> {
        self.listeners.get(&kind).cloned().unwrap_or_default()
    }

    pub fn len(&self, kind: EngineEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, |l| l.len())
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

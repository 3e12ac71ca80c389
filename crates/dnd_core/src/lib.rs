//! Drag-and-drop container coordination
//!
//! This crate coordinates sortable drag-and-drop between containers that a
//! UI framework renders and a pointer-driven gesture engine manipulates:
//!
//! - **Role Tags**: Container and draggable metadata attached to visual nodes
//! - **Container Registry**: One shared engine per container type, with the
//!   live ordered list of registered containers
//! - **Drop Reconciliation**: Per-instance filtering of broadcast drops and
//!   before/after change reports
//! - **Boundary Scroll**: Auto-scroll of fixed-size containers while dragging
//!   past their edges
//! - **Lifecycle**: Mount/re-render/unmount bindings for enhanced components
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use dnd_core::prelude::*;
//! use dnd_core::{EngineConfig, EngineHandle};
//!
//! // Any engine implementation; here one that never produces gestures
//! # struct Idle(Vec<NodeId>, dnd_core::ListenerSet);
//! # impl GestureEngine for Idle {
//! #     fn on(&mut self, k: EngineEventKind, l: dnd_core::EngineListener) -> &mut dyn GestureEngine { self.1.add(k, l); self }
//! #     fn off(&mut self, k: EngineEventKind, l: &dnd_core::EngineListener) { self.1.remove(k, l); }
//! #     fn containers(&self) -> &[NodeId] { &self.0 }
//! #     fn containers_mut(&mut self) -> &mut Vec<NodeId> { &mut self.0 }
//! #     fn listener_count(&self, k: EngineEventKind) -> usize { self.1.len(k) }
//! # }
//! let factory = |containers: Vec<NodeId>, _config: EngineConfig| -> EngineHandle {
//!     Rc::new(std::cell::RefCell::new(Idle(containers, Default::default())))
//! };
//! let ctx = DndContext::new(factory);
//! let mut tree = VisualTree::new();
//!
//! let lists = ContainerOptions::new("list", "item").build().unwrap();
//! let on_change: ChangeCallback = Rc::new(|report: &ChangeReport| {
//!     println!("{} now holds {:?}", report.target.id, report.target.elements);
//! });
//!
//! let list = tree.create_node();
//! let mut binding = lists.instance(Props::with_id("todo"), Some(on_change));
//! binding.mount(&ctx, &mut tree, &list).unwrap();
//! assert_eq!(ctx.group("list").unwrap().containers(), vec![list]);
//!
//! binding.unmount(&ctx);
//! assert_eq!(ctx.group("list").unwrap().container_count(), 0);
//! ```

pub mod component;
pub mod context;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod options;
pub mod reconcile;
pub mod registry;
pub mod scroll;
pub mod tags;
pub mod tree;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use component::{Exposed, ExposesNode, Props};
pub use context::DndContext;
pub use engine::{
    Direction, EngineConfig, EngineEvent, EngineEventKind, EngineFactory, EngineHandle,
    EngineListener, GestureEngine, ListenerSet,
};
pub use error::{DndError, Result};
pub use geometry::{Point, Rect};
pub use lifecycle::{ContainerBinding, DndContainer, DndElement, ElementBinding};
pub use options::{ContainerOptions, ElementOptions};
pub use reconcile::{ChangeCallback, ChangeReport, ContainerSnapshot, DragPhase, DropOutcome};
pub use registry::{ContainerGroup, ContainerRegistry, GroupConfig, Registration};
pub use scroll::{PointerEvent, PointerKind, PointerTracker, ScrollAssist};
pub use tags::{Role, Tag};
pub use tree::{NodeId, VisualTree};

/// Commonly used imports
pub mod prelude {
    pub use crate::component::{Exposed, ExposesNode, Props};
    pub use crate::context::DndContext;
    pub use crate::engine::{Direction, EngineEvent, EngineEventKind, GestureEngine};
    pub use crate::error::{DndError, Result};
    pub use crate::lifecycle::{ContainerBinding, DndContainer, DndElement, ElementBinding};
    pub use crate::options::{ContainerOptions, ElementOptions};
    pub use crate::reconcile::{ChangeCallback, ChangeReport, DragPhase};
    pub use crate::scroll::PointerEvent;
    pub use crate::tree::{NodeId, VisualTree};
}

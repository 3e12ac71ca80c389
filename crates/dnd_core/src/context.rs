//! Drag-and-drop context
//!
//! Owns everything that the containers of an application share: the
//! per-type registry, page-level pointer tracking and the factory used to
//! create gesture engines. Create one per application (or per test) and pass
//! it to every mount and unmount.

use std::rc::Rc;

use crate::engine::EngineFactory;
use crate::error::Result;
use crate::registry::{ContainerGroup, ContainerRegistry, GroupConfig, Registration};
use crate::scroll::{PointerEvent, PointerTracker};
use crate::tree::{NodeId, VisualTree};

pub struct DndContext {
    factory: Box<dyn EngineFactory>,
    registry: ContainerRegistry,
    pointer: Rc<PointerTracker>,
}

impl DndContext {
    pub fn new(factory: impl EngineFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            registry: ContainerRegistry::new(),
            pointer: Rc::new(PointerTracker::new()),
        }
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    pub fn pointer(&self) -> &Rc<PointerTracker> {
        &self.pointer
    }

    /// See [`ContainerRegistry::ensure_group`]
    pub fn ensure_group(&self, container_type: &str, config: &GroupConfig) -> Rc<ContainerGroup> {
        self.registry
            .ensure_group(self.factory.as_ref(), container_type, config)
    }

    pub fn group(&self, container_type: &str) -> Option<Rc<ContainerGroup>> {
        self.registry.group(container_type)
    }

    /// See [`ContainerRegistry::register_container`]
    pub fn register_container(
        &self,
        tree: &VisualTree,
        container_type: &str,
        node: NodeId,
        id: &str,
    ) -> Result<Registration> {
        self.registry
            .register_container(tree, container_type, node, id)
    }

    /// See [`ContainerRegistry::unregister_container`]
    pub fn unregister_container(&self, container_type: &str, node: NodeId) -> bool {
        self.registry.unregister_container(container_type, node)
    }

    /// Feed a page-level pointer move to the attached scroll handlers
    pub fn pointer_moved(&self, tree: &mut VisualTree, event: &PointerEvent) {
        self.pointer.dispatch(tree, event);
    }

    /// Tear down all shared state
    ///
    /// Empties every group's container list and detaches every pointer
    /// handler. Unmount bindings first; listeners of bindings that are still
    /// mounted stay on their engines until the bindings are dropped.
    pub fn dispose(self) {
        let groups = self.registry.len();
        let handlers = self.pointer.len();
        self.registry.clear();
        self.pointer.clear();
        tracing::info!(groups, handlers, "disposed drag-and-drop context");
    }
}

//! Per-type container registry
//!
//! Every container type gets exactly one [`ContainerGroup`]: the gesture
//! engine instance shared by all containers of that type and, on that engine,
//! the live ordered list of registered container nodes. Groups are created
//! lazily by the first registration of a type and live as long as the
//! registry does. Configuration supplied by later registrations of the same
//! type is ignored.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::engine::{
    AcceptsFn, Direction, EngineConfig, EngineFactory, EngineHandle, MovesFn,
};
use crate::error::{DndError, Result};
use crate::tree::{NodeId, VisualTree};

/// Behaviour of a container group, fixed by the first registration of its type
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupConfig {
    /// Draggable type the containers of this group accept
    pub accept_type: String,
    /// When set, drags may only start from a node carrying this class
    pub handle_class: Option<String>,
    pub direction: Direction,
}

impl GroupConfig {
    pub fn new(accept_type: impl Into<String>) -> Self {
        Self {
            accept_type: accept_type.into(),
            ..Default::default()
        }
    }

    pub fn handle_class(mut self, class: impl Into<String>) -> Self {
        self.handle_class = Some(class.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Build the engine predicates for a container type
    pub fn engine_config(&self, container_type: &str) -> EngineConfig {
        let accept_type = self.accept_type.clone();
        let container_type = container_type.to_owned();
        let accepts: AcceptsFn = Rc::new(move |tree: &VisualTree, dragged: NodeId, target: NodeId| {
            tree.draggable_type(dragged) == Some(accept_type.as_str())
                && tree.container_type(target) == Some(container_type.as_str())
        });

        let handle_class = self.handle_class.clone();
        let moves: MovesFn = Rc::new(
            move |tree: &VisualTree, _dragged: NodeId, _source: NodeId, handle: NodeId| {
                match &handle_class {
                    Some(class) => tree.has_class(handle, class),
                    None => true,
                }
            },
        );

        EngineConfig {
            accepts,
            moves,
            direction: self.direction,
        }
    }
}

/// Shared record for one container type
pub struct ContainerGroup {
    container_type: String,
    config: GroupConfig,
    engine: EngineHandle,
}

impl ContainerGroup {
    pub fn container_type(&self) -> &str {
        &self.container_type
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn accept_type(&self) -> &str {
        &self.config.accept_type
    }

    pub fn direction(&self) -> Direction {
        self.config.direction
    }

    /// The engine instance shared by every container of this type
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Snapshot of the registered container nodes, in order
    pub fn containers(&self) -> Vec<NodeId> {
        self.engine.borrow().containers().to_vec()
    }

    pub fn container_count(&self) -> usize {
        self.engine.borrow().containers().len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.engine.borrow().containers().contains(&node)
    }
}

/// Where a registration landed in its group's container list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// New id, appended at this index
    Appended(usize),
    /// Known id, node reference replaced in place at this index
    Replaced(usize),
}

impl Registration {
    pub fn index(self) -> usize {
        match self {
            Registration::Appended(i) | Registration::Replaced(i) => i,
        }
    }
}

/// Registry of container groups keyed by container type
#[derive(Default)]
pub struct ContainerRegistry {
    groups: RefCell<FxHashMap<String, Rc<ContainerGroup>>>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the group for a type, creating it (and its engine) on first use
    ///
    /// The first caller's configuration wins; later calls with the same type
    /// return the existing group unchanged.
    pub fn ensure_group(
        &self,
        factory: &dyn EngineFactory,
        container_type: &str,
        config: &GroupConfig,
    ) -> Rc<ContainerGroup> {
        if let Some(group) = self.groups.borrow().get(container_type) {
            if group.config != *config {
                tracing::debug!(
                    container_type,
                    "container group already configured, ignoring later configuration"
                );
            }
            return group.clone();
        }

        let engine = factory.create(Vec::new(), config.engine_config(container_type));
        let group = Rc::new(ContainerGroup {
            container_type: container_type.to_owned(),
            config: config.clone(),
            engine,
        });
        tracing::debug!(
            container_type,
            accept_type = %config.accept_type,
            "created container group"
        );
        self.groups
            .borrow_mut()
            .insert(container_type.to_owned(), group.clone());
        group
    }

    /// Get an existing group
    pub fn group(&self, container_type: &str) -> Option<Rc<ContainerGroup>> {
        self.groups.borrow().get(container_type).cloned()
    }

    /// Registered container types
    pub fn container_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.groups.borrow().keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.groups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.borrow().is_empty()
    }

    /// Add a container node to its type's group
    ///
    /// If the node is already registered, or an entry already carries `id`
    /// (read from the container tags in `tree`), that entry's node reference
    /// is replaced in place so the container keeps its position; otherwise
    /// the node is appended. Any other entry carrying `id` is dropped, so the
    /// list holds at most one entry per node and per id.
    pub fn register_container(
        &self,
        tree: &VisualTree,
        container_type: &str,
        node: NodeId,
        id: &str,
    ) -> Result<Registration> {
        let group = self
            .group(container_type)
            .ok_or_else(|| DndError::UnknownContainerType(container_type.to_owned()))?;

        let mut engine = group.engine.borrow_mut();
        let containers = engine.containers_mut();
        let existing = containers
            .iter()
            .position(|&c| c == node)
            .or_else(|| {
                containers
                    .iter()
                    .position(|&c| tree.container_id(c) == Some(id))
            });

        let registration = match existing {
            Some(index) => {
                containers[index] = node;
                let mut kept = false;
                containers.retain(|&c| {
                    if c == node {
                        !std::mem::replace(&mut kept, true)
                    } else {
                        tree.container_id(c) != Some(id)
                    }
                });
                let index = containers
                    .iter()
                    .position(|&c| c == node)
                    .unwrap_or(index);
                Registration::Replaced(index)
            }
            None => {
                containers.push(node);
                Registration::Appended(containers.len() - 1)
            }
        };
        tracing::debug!(container_type, id, ?registration, "registered container");
        Ok(registration)
    }

    /// Remove a container node (by identity) from its type's group
    ///
    /// Returns false without touching anything if the type or node is unknown.
    pub fn unregister_container(&self, container_type: &str, node: NodeId) -> bool {
        let Some(group) = self.group(container_type) else {
            return false;
        };
        let mut engine = group.engine.borrow_mut();
        let containers = engine.containers_mut();
        match containers.iter().position(|&c| c == node) {
            Some(index) => {
                containers.remove(index);
                tracing::debug!(container_type, index, "unregistered container");
                true
            }
            None => false,
        }
    }

    /// Empty every group's container list and drop the groups
    pub(crate) fn clear(&self) {
        for group in self.groups.borrow_mut().drain().map(|(_, g)| g) {
            group.engine.borrow_mut().containers_mut().clear();
        }
    }
}

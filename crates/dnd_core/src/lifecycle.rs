//! Mount/unmount lifecycle for enhanced components
//!
//! [`DndContainer`] and [`DndElement`] are the enhancements produced by
//! [`ContainerOptions::build`](crate::options::ContainerOptions::build) and
//! [`ElementOptions::build`](crate::options::ElementOptions::build). Each
//! enhanced component instance gets a binding that the host framework drives:
//!
//! ```text
//! instance(props) ──▶ mount ──▶ mount (re-render) ... ──▶ unmount
//!                      │                                    │
//!                      ├─ tag node as container             ├─ off(drop, drag, dragend)
//!                      ├─ ensure group for the type         ├─ unregister node
//!                      ├─ register node (replace by id)     └─ release boundary scroll
//!                      └─ on(drop, drag, dragend), once
//! ```
//!
//! All shared state lives in the [`DndContext`] passed to every call.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::component::{ExposesNode, Props};
use crate::context::DndContext;
use crate::engine::{EngineEvent, EngineEventKind, EngineListener};
use crate::error::{DndError, Result};
use crate::options::{ContainerSpec, ElementSpec};
use crate::reconcile::{ChangeCallback, DragPhase, DropReconciler};
use crate::registry::ContainerGroup;
use crate::scroll::ScrollAssist;
use crate::tags::Role;
use crate::tree::{NodeId, VisualTree};

fn read_id<'a>(props: &'a Props, id_prop: &str) -> Result<&'a str> {
    props.get(id_prop).ok_or_else(|| DndError::MissingId {
        prop: id_prop.to_owned(),
    })
}

/// Container enhancement
#[derive(Clone, Debug)]
pub struct DndContainer {
    spec: Rc<ContainerSpec>,
}

impl DndContainer {
    pub(crate) fn from_spec(spec: Rc<ContainerSpec>) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// Create the binding for one component instance
    pub fn instance(&self, props: Props, on_change: Option<ChangeCallback>) -> ContainerBinding {
        let reconciler = DropReconciler::new(
            props.get(&self.spec.id_prop).unwrap_or_default(),
            on_change,
        );
        ContainerBinding {
            spec: self.spec.clone(),
            props,
            reconciler: Rc::new(reconciler),
            scroll: Rc::new(RefCell::new(None)),
            node: None,
            listeners: None,
        }
    }
}

/// Draggable element enhancement
#[derive(Clone, Debug)]
pub struct DndElement {
    spec: Rc<ElementSpec>,
}

impl DndElement {
    pub(crate) fn from_spec(spec: Rc<ElementSpec>) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ElementSpec {
        &self.spec
    }

    pub fn instance(&self, props: Props) -> ElementBinding {
        ElementBinding {
            spec: self.spec.clone(),
            props,
            node: None,
        }
    }
}

/// Listeners one container instance added to its group's engine
struct AttachedListeners {
    group: Rc<ContainerGroup>,
    drop: EngineListener,
    drag: EngineListener,
    drag_end: EngineListener,
}

impl AttachedListeners {
    fn attach(
        group: Rc<ContainerGroup>,
        reconciler: &Rc<DropReconciler>,
        scroll: &Rc<RefCell<Option<ScrollAssist>>>,
    ) -> Self {
        let drop: EngineListener = {
            let reconciler = reconciler.clone();
            Rc::new(move |event: &EngineEvent, tree: &VisualTree| {
                if let EngineEvent::Drop { target, source, .. } = *event {
                    reconciler.handle_drop(tree, target, source);
                }
            })
        };

        let drag: EngineListener = {
            let reconciler = reconciler.clone();
            let scroll = scroll.clone();
            Rc::new(move |_: &EngineEvent, _: &VisualTree| {
                reconciler.drag_started();
                if let Some(assist) = scroll.borrow().as_ref() {
                    assist.engage();
                }
            })
        };

        let drag_end: EngineListener = {
            let reconciler = reconciler.clone();
            let scroll = scroll.clone();
            Rc::new(move |_: &EngineEvent, _: &VisualTree| {
                reconciler.drag_ended();
                if let Some(assist) = scroll.borrow().as_ref() {
                    assist.release();
                }
            })
        };

        group
            .engine()
            .borrow_mut()
            .on(EngineEventKind::Drop, drop.clone())
            .on(EngineEventKind::Drag, drag.clone())
            .on(EngineEventKind::DragEnd, drag_end.clone());

        Self {
            group,
            drop,
            drag,
            drag_end,
        }
    }

    fn detach(self) {
        let mut engine = self.group.engine().borrow_mut();
        engine.off(EngineEventKind::Drop, &self.drop);
        engine.off(EngineEventKind::Drag, &self.drag);
        engine.off(EngineEventKind::DragEnd, &self.drag_end);
    }
}

/// One mounted (or mountable) container instance
pub struct ContainerBinding {
    spec: Rc<ContainerSpec>,
    props: Props,
    reconciler: Rc<DropReconciler>,
    scroll: Rc<RefCell<Option<ScrollAssist>>>,
    node: Option<NodeId>,
    listeners: Option<AttachedListeners>,
}

impl ContainerBinding {
    /// Mount or re-render the container
    ///
    /// Tags the component's node, makes sure the type's group exists and
    /// registers the node, replacing the entry of a previous render with the
    /// same id in place. Engine listeners are added on the first successful
    /// mount only. A component that exposes no node is left alone.
    pub fn mount(
        &mut self,
        ctx: &DndContext,
        tree: &mut VisualTree,
        component: &dyn ExposesNode,
    ) -> Result<()> {
        let Some(node) = component.exposes_node() else {
            tracing::debug!(
                container_type = %self.spec.container_type,
                "component exposes no node, skipping mount"
            );
            return Ok(());
        };
        if !tree.contains(node) {
            tracing::debug!(?node, "component node is not in the tree, skipping mount");
            return Ok(());
        }

        let id = read_id(&self.props, &self.spec.id_prop)?.to_owned();
        let container_type = self.spec.container_type.as_str();

        tree.tag_container(node, container_type, &id);
        let group = ctx.ensure_group(container_type, &self.spec.group);
        ctx.register_container(tree, container_type, node, &id)?;
        self.reconciler.set_instance_id(id.as_str());

        if let Some(previous) = self.node.replace(node) {
            if previous != node {
                // The old node's entry was replaced by id; make sure a stale
                // one with a different id does not linger.
                ctx.unregister_container(container_type, previous);
            }
        }
        self.update_scroll(ctx, node);

        if self.listeners.is_none() {
            self.listeners = Some(AttachedListeners::attach(
                group,
                &self.reconciler,
                &self.scroll,
            ));
            tracing::debug!(container_type, id = %id, "mounted container");
        }
        Ok(())
    }

    fn update_scroll(&self, ctx: &DndContext, node: NodeId) {
        if !self.spec.scroll_at_boundaries {
            return;
        }
        let mut scroll = self.scroll.borrow_mut();
        if scroll.as_ref().is_some_and(|s| s.container() == node) {
            return;
        }
        let engaged = scroll.as_ref().is_some_and(ScrollAssist::is_engaged);
        if let Some(previous) = scroll.take() {
            previous.release();
        }
        let assist = ScrollAssist::new(
            ctx.pointer().clone(),
            self.spec.group.direction,
            node,
            self.spec.scroll_rate,
        );
        if engaged {
            assist.engage();
        }
        *scroll = Some(assist);
    }

    /// Replace the props and change callback used from the next drop on
    ///
    /// The instance id follows the new props immediately; the node's tag is
    /// refreshed on the next mount.
    pub fn set_props(&mut self, props: Props, on_change: Option<ChangeCallback>) {
        if let Some(id) = props.get(&self.spec.id_prop) {
            self.reconciler.set_instance_id(id);
        }
        self.reconciler.set_on_change(on_change);
        self.props = props;
    }

    /// Tear the instance down
    ///
    /// Removes all three engine listeners, removes the node from the group
    /// and releases boundary scrolling. Calling it again, or before any
    /// mount, does nothing.
    pub fn unmount(&mut self, ctx: &DndContext) {
        if let Some(listeners) = self.listeners.take() {
            listeners.detach();
        }
        if let Some(node) = self.node.take() {
            ctx.unregister_container(&self.spec.container_type, node);
            tracing::debug!(
                container_type = %self.spec.container_type,
                id = %self.reconciler.instance_id(),
                "unmounted container"
            );
        }
        if let Some(assist) = self.scroll.borrow_mut().take() {
            assist.release();
        }
        self.reconciler.drag_ended();
    }

    pub fn is_mounted(&self) -> bool {
        self.listeners.is_some()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn instance_id(&self) -> String {
        self.reconciler.instance_id()
    }

    pub fn phase(&self) -> DragPhase {
        self.reconciler.phase()
    }

    /// Whether the boundary-scroll handler is currently following the pointer
    pub fn is_scrolling(&self) -> bool {
        self.scroll
            .borrow()
            .as_ref()
            .is_some_and(ScrollAssist::is_engaged)
    }
}

impl fmt::Debug for ContainerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBinding")
            .field("container_type", &self.spec.container_type)
            .field("node", &self.node)
            .field("mounted", &self.is_mounted())
            .field("reconciler", &self.reconciler)
            .finish()
    }
}

/// One draggable element instance
#[derive(Debug)]
pub struct ElementBinding {
    spec: Rc<ElementSpec>,
    props: Props,
    node: Option<NodeId>,
}

impl ElementBinding {
    /// Tag the component's node as a draggable of the configured type
    ///
    /// When a re-render produced a different node, the previous node loses
    /// its draggable tag so it no longer shows up in its container's ids.
    pub fn mount(&mut self, tree: &mut VisualTree, component: &dyn ExposesNode) -> Result<()> {
        let Some(node) = component.exposes_node() else {
            return Ok(());
        };
        if !tree.contains(node) {
            return Ok(());
        }
        let id = read_id(&self.props, &self.spec.id_prop)?;
        tree.tag_draggable(node, &self.spec.kind, id);
        if let Some(previous) = self.node.replace(node) {
            if previous != node {
                tree.untag(previous, Role::Draggable);
            }
        }
        Ok(())
    }

    pub fn set_props(&mut self, props: Props) {
        self.props = props;
    }

    /// Detach the element's node from whatever container it ended up in
    ///
    /// The engine may have moved the node after the framework rendered it, so
    /// the framework's own bookkeeping cannot be trusted to find it. Returns
    /// true if the node was still attached.
    pub fn unmount(&mut self, tree: &mut VisualTree) -> bool {
        match self.node.take() {
            Some(node) => tree.detach(node),
            None => false,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ContainerOptions, ElementOptions};
    use crate::reconcile::ChangeReport;
    use crate::sim::{SimEngine, SimFactory};

    fn recorder() -> (ChangeCallback, Rc<RefCell<Vec<ChangeReport>>>) {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        let callback: ChangeCallback =
            Rc::new(move |report: &ChangeReport| sink.borrow_mut().push(report.clone()));
        (callback, reports)
    }

    fn items(tree: &mut VisualTree, container: NodeId, ids: &[&str]) -> Vec<NodeId> {
        let element = ElementOptions::new("item").build().unwrap();
        ids.iter()
            .map(|id| {
                let node = tree.create_node();
                tree.append_child(container, node);
                element.instance(Props::with_id(*id)).mount(tree, &node).unwrap();
                node
            })
            .collect()
    }

    #[test]
    fn test_mount_registers_and_listens() {
        let factory = SimFactory::new();
        let ctx = DndContext::new(factory.clone());
        let mut tree = VisualTree::new();
        let node = tree.create_node();

        let container = ContainerOptions::new("list", "item").build().unwrap();
        let mut binding = container.instance(Props::with_id("left"), None);
        binding.mount(&ctx, &mut tree, &node).unwrap();

        assert!(binding.is_mounted());
        assert_eq!(tree.container_id(node), Some("left"));
        assert_eq!(tree.container_type(node), Some("list"));
        let group = ctx.group("list").unwrap();
        assert_eq!(group.containers(), vec![node]);

        let engine = group.engine().borrow();
        for kind in [EngineEventKind::Drop, EngineEventKind::Drag, EngineEventKind::DragEnd] {
            assert_eq!(engine.listener_count(kind), 1);
        }
    }

    #[test]
    fn test_remount_attaches_listeners_once() {
        let ctx = DndContext::new(SimFactory::new());
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        let container = ContainerOptions::new("list", "item").build().unwrap();
        let mut binding = container.instance(Props::with_id("left"), None);

        binding.mount(&ctx, &mut tree, &node).unwrap();
        binding.mount(&ctx, &mut tree, &node).unwrap();

        let group = ctx.group("list").unwrap();
        assert_eq!(group.container_count(), 1);
        assert_eq!(group.engine().borrow().listener_count(EngineEventKind::Drop), 1);
    }

    #[test]
    fn test_rerender_with_new_node_replaces_in_place() {
        let ctx = DndContext::new(SimFactory::new());
        let mut tree = VisualTree::new();
        let container = ContainerOptions::new("list", "item").build().unwrap();

        let a = tree.create_node();
        let b = tree.create_node();
        let mut first = container.instance(Props::with_id("a"), None);
        let mut second = container.instance(Props::with_id("b"), None);
        first.mount(&ctx, &mut tree, &a).unwrap();
        second.mount(&ctx, &mut tree, &b).unwrap();

        let a2 = tree.create_node();
        first.mount(&ctx, &mut tree, &a2).unwrap();

        assert_eq!(ctx.group("list").unwrap().containers(), vec![a2, b]);
        assert_eq!(first.node(), Some(a2));
    }

    #[test]
    fn test_set_props_onto_taken_id_keeps_one_entry() {
        let ctx = DndContext::new(SimFactory::new());
        let mut tree = VisualTree::new();
        let container = ContainerOptions::new("list", "item").build().unwrap();

        let x = tree.create_node();
        let y = tree.create_node();
        let mut first = container.instance(Props::with_id("a"), None);
        let mut second = container.instance(Props::with_id("b"), None);
        first.mount(&ctx, &mut tree, &x).unwrap();
        second.mount(&ctx, &mut tree, &y).unwrap();

        second.set_props(Props::with_id("a"), None);
        second.mount(&ctx, &mut tree, &y).unwrap();

        let group = ctx.group("list").unwrap();
        assert_eq!(group.containers(), vec![y]);

        second.unmount(&ctx);
        assert!(!group.contains(y));
        assert_eq!(group.container_count(), 0);
    }

    #[test]
    fn test_missing_id_prop() {
        let ctx = DndContext::new(SimFactory::new());
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        let container = ContainerOptions::new("list", "item")
            .id_prop("key")
            .build()
            .unwrap();
        let mut binding = container.instance(Props::with_id("left"), None);

        let err = binding.mount(&ctx, &mut tree, &node).unwrap_err();
        assert_eq!(err, DndError::MissingId { prop: "key".into() });
        assert!(!binding.is_mounted());
    }

    #[test]
    fn test_component_without_node_is_ignored() {
        let ctx = DndContext::new(SimFactory::new());
        let mut tree = VisualTree::new();
        let container = ContainerOptions::new("list", "item").build().unwrap();
        let mut binding = container.instance(Props::with_id("left"), None);

        binding.mount(&ctx, &mut tree, &None::<NodeId>).unwrap();
        assert!(!binding.is_mounted());
        assert!(ctx.group("list").is_none());
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let ctx = DndContext::new(SimFactory::new());
        let mut tree = VisualTree::new();
        let node = tree.create_node();
        let container = ContainerOptions::new("list", "item").build().unwrap();
        let mut binding = container.instance(Props::with_id("left"), None);

        binding.unmount(&ctx);
        binding.mount(&ctx, &mut tree, &node).unwrap();
        binding.unmount(&ctx);
        binding.unmount(&ctx);

        let group = ctx.group("list").unwrap();
        assert_eq!(group.container_count(), 0);
        let engine = group.engine().borrow();
        for kind in [EngineEventKind::Drop, EngineEventKind::Drag, EngineEventKind::DragEnd] {
            assert_eq!(engine.listener_count(kind), 0);
        }
    }

    #[test]
    fn test_drop_reports_to_target_only() {
        let factory = SimFactory::new();
        let ctx = DndContext::new(factory.clone());
        let mut tree = VisualTree::new();
        let container = ContainerOptions::new("list", "item").build().unwrap();

        let left = tree.create_node();
        let right = tree.create_node();
        let (left_cb, left_reports) = recorder();
        let (right_cb, right_reports) = recorder();
        let mut left_binding = container.instance(Props::with_id("left"), Some(left_cb));
        let mut right_binding = container.instance(Props::with_id("right"), Some(right_cb));
        left_binding.mount(&ctx, &mut tree, &left).unwrap();
        right_binding.mount(&ctx, &mut tree, &right).unwrap();

        let nodes = items(&mut tree, left, &["a", "b", "c"]);
        items(&mut tree, right, &["d"]);

        let engine = factory.last().unwrap();
        assert!(SimEngine::start_drag(&engine, &tree, nodes[1], nodes[1]));
        assert_eq!(left_binding.phase(), DragPhase::Dragging);
        assert!(SimEngine::drop_on(&engine, &mut tree, Some(right), None));

        assert!(left_reports.borrow().is_empty());
        let reports = right_reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].source.elements, vec!["a", "c"]);
        assert_eq!(reports[0].target.elements, vec!["d", "b"]);
        assert_eq!(right_binding.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_set_props_switches_callback() {
        let factory = SimFactory::new();
        let ctx = DndContext::new(factory.clone());
        let mut tree = VisualTree::new();
        let container = ContainerOptions::new("list", "item").build().unwrap();
        let list = tree.create_node();
        let mut binding = container.instance(Props::with_id("list"), None);
        binding.mount(&ctx, &mut tree, &list).unwrap();
        let nodes = items(&mut tree, list, &["a", "b"]);

        let (callback, reports) = recorder();
        binding.set_props(Props::with_id("list"), Some(callback));

        let engine = factory.last().unwrap();
        SimEngine::start_drag(&engine, &tree, nodes[1], nodes[1]);
        SimEngine::drop_on(&engine, &mut tree, Some(list), Some(nodes[0]));

        assert_eq!(reports.borrow().len(), 1);
        assert_eq!(reports.borrow()[0].target.elements, vec!["b", "a"]);
    }

    #[test]
    fn test_element_rerender_untags_previous_node() {
        let mut tree = VisualTree::new();
        let list = tree.create_node();
        tree.tag_container(list, "list", "left");
        let old = tree.create_node();
        let new = tree.create_node();
        tree.append_child(list, old);
        tree.append_child(list, new);

        let element = ElementOptions::new("item").build().unwrap();
        let mut binding = element.instance(Props::with_id("a"));
        binding.mount(&mut tree, &old).unwrap();
        binding.mount(&mut tree, &new).unwrap();

        assert_eq!(tree.draggable_id(old), None);
        assert_eq!(tree.draggable_id(new), Some("a"));
        assert_eq!(tree.query_child_ids(list), vec!["a"]);

        // Re-rendering into the same node keeps the tag
        binding.mount(&mut tree, &new).unwrap();
        assert_eq!(binding.node(), Some(new));
        assert_eq!(tree.draggable_id(new), Some("a"));
    }

    #[test]
    fn test_element_mount_and_unmount() {
        let mut tree = VisualTree::new();
        let list = tree.create_node();
        let node = tree.create_node();
        tree.append_child(list, node);

        let element = ElementOptions::new("item").build().unwrap();
        let mut binding = element.instance(Props::with_id("a"));
        binding.mount(&mut tree, &node).unwrap();
        assert_eq!(tree.draggable_id(node), Some("a"));
        assert_eq!(tree.draggable_type(node), Some("item"));

        // Moved by the engine after rendering
        let other = tree.create_node();
        tree.append_child(other, node);

        assert!(binding.unmount(&mut tree));
        assert!(tree.children(other).is_empty());
        assert!(!binding.unmount(&mut tree));
    }
}

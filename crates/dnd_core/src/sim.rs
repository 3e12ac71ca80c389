//! Headless gesture engine
//!
//! A deterministic stand-in for a real pointer-driven engine, used by unit
//! tests and the scenario runner. Gestures are driven by calls instead of
//! pointer input: [`SimEngine::start_drag`], then [`SimEngine::drop_on`] or
//! [`SimEngine::cancel`]. Like a real engine, it moves the dragged node in
//! the tree before it broadcasts the drop.
//!
//! Listeners are cloned out before dispatch, so they may call back into the
//! engine (including `off`) while an event is being delivered.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::{
    EngineConfig, EngineEvent, EngineEventKind, EngineFactory, EngineHandle, EngineListener,
    GestureEngine, ListenerSet,
};
use crate::tree::{NodeId, VisualTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveDrag {
    node: NodeId,
    source: NodeId,
}

/// Simulated engine instance
pub struct SimEngine {
    containers: Vec<NodeId>,
    config: EngineConfig,
    listeners: ListenerSet,
    drag: Option<ActiveDrag>,
}

impl SimEngine {
    pub fn new(containers: Vec<NodeId>, config: EngineConfig) -> Self {
        Self {
            containers,
            config,
            listeners: ListenerSet::new(),
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The node currently being dragged
    pub fn dragged(&self) -> Option<NodeId> {
        self.drag.map(|d| d.node)
    }

    /// Pick up `node` by `handle`
    ///
    /// The node's parent must be a registered container and the group's
    /// `moves` predicate must allow the handle. Returns false (and emits
    /// nothing) otherwise, or if a drag is already in progress.
    pub fn start_drag(
        this: &Rc<RefCell<Self>>,
        tree: &VisualTree,
        node: NodeId,
        handle: NodeId,
    ) -> bool {
        let event = {
            let mut engine = this.borrow_mut();
            if engine.drag.is_some() {
                return false;
            }
            let Some(source) = tree.parent(node) else {
                return false;
            };
            if !engine.containers.contains(&source) {
                return false;
            }
            if !(engine.config.moves)(tree, node, source, handle) {
                tracing::trace!(?node, "drag refused by moves predicate");
                return false;
            }
            engine.drag = Some(ActiveDrag { node, source });
            EngineEvent::Drag { node, source }
        };
        Self::emit(this, &event, tree);
        true
    }

    /// Release the dragged node over `target`, before the sibling `before`
    ///
    /// - A registered target that accepts the node: the node is moved, then
    ///   `drop` is broadcast with both endpoints.
    /// - No target: `drop` is broadcast with no target and the tree is left
    ///   alone.
    /// - Any other target: the node snaps back and no `drop` is emitted.
    ///
    /// `dragend` always follows. Returns true if the node was moved.
    pub fn drop_on(
        this: &Rc<RefCell<Self>>,
        tree: &mut VisualTree,
        target: Option<NodeId>,
        before: Option<NodeId>,
    ) -> bool {
        let Some(ActiveDrag { node, source }) = this.borrow_mut().drag.take() else {
            return false;
        };

        let drop = match target {
            Some(target) => {
                let accepted = {
                    let engine = this.borrow();
                    engine.containers.contains(&target)
                        && (engine.config.accepts)(tree, node, target)
                };
                (accepted && tree.insert_before(target, node, before)).then_some(
                    EngineEvent::Drop {
                        node,
                        target: Some(target),
                        source: Some(source),
                    },
                )
            }
            None => Some(EngineEvent::Drop {
                node,
                target: None,
                source: Some(source),
            }),
        };

        let moved = matches!(drop, Some(EngineEvent::Drop { target: Some(_), .. }));
        if let Some(event) = drop {
            Self::emit(this, &event, tree);
        }
        Self::emit(this, &EngineEvent::DragEnd { node }, tree);
        moved
    }

    /// Abandon the current drag without dropping
    pub fn cancel(this: &Rc<RefCell<Self>>, tree: &VisualTree) -> bool {
        let Some(ActiveDrag { node, .. }) = this.borrow_mut().drag.take() else {
            return false;
        };
        Self::emit(this, &EngineEvent::DragEnd { node }, tree);
        true
    }

    fn emit(this: &Rc<RefCell<Self>>, event: &EngineEvent, tree: &VisualTree) {
        let listeners = this.borrow().listeners.snapshot(event.kind());
        tracing::trace!(
            event = event.kind().name(),
            listeners = listeners.len(),
            "dispatching"
        );
        for listener in listeners {
            listener(event, tree);
        }
    }
}

impl GestureEngine for SimEngine {
    fn on(&mut self, kind: EngineEventKind, listener: EngineListener) -> &mut dyn GestureEngine {
        self.listeners.add(kind, listener);
        self
    }

    fn off(&mut self, kind: EngineEventKind, listener: &EngineListener) {
        self.listeners.remove(kind, listener);
    }

    fn containers(&self) -> &[NodeId] {
        &self.containers
    }

    fn containers_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.containers
    }

    fn listener_count(&self, kind: EngineEventKind) -> usize {
        self.listeners.len(kind)
    }
}

/// Factory that records every engine it creates
///
/// Clones share the record, so a test can keep one clone and hand another
/// to a context.
#[derive(Clone, Default)]
pub struct SimFactory {
    engines: Rc<RefCell<Vec<Rc<RefCell<SimEngine>>>>>,
}

impl SimFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine_count(&self) -> usize {
        self.engines.borrow().len()
    }

    /// Most recently created engine
    pub fn last(&self) -> Option<Rc<RefCell<SimEngine>>> {
        self.engines.borrow().last().cloned()
    }

    /// Recover the concrete engine behind a group's handle
    pub fn engine_for(&self, handle: &EngineHandle) -> Option<Rc<RefCell<SimEngine>>> {
        let target = Rc::as_ptr(handle) as *const ();
        self.engines
            .borrow()
            .iter()
            .find(|engine| Rc::as_ptr(engine) as *const () == target)
            .cloned()
    }
}

impl EngineFactory for SimFactory {
    fn create(&self, containers: Vec<NodeId>, config: EngineConfig) -> EngineHandle {
        let engine = Rc::new(RefCell::new(SimEngine::new(containers, config)));
        self.engines.borrow_mut().push(engine.clone());
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GroupConfig;

    struct Fixture {
        tree: VisualTree,
        engine: Rc<RefCell<SimEngine>>,
        left: NodeId,
        right: NodeId,
        items: Vec<NodeId>,
        events: Rc<RefCell<Vec<EngineEventKind>>>,
    }

    fn fixture() -> Fixture {
        let mut tree = VisualTree::new();
        let left = tree.create_node();
        let right = tree.create_node();
        tree.tag_container(left, "list", "left");
        tree.tag_container(right, "list", "right");
        let mut items = Vec::new();
        for id in ["a", "b"] {
            let node = tree.create_node();
            tree.tag_draggable(node, "item", id);
            tree.append_child(left, node);
            items.push(node);
        }

        let factory = SimFactory::new();
        let handle = factory.create(
            vec![left, right],
            GroupConfig::new("item").engine_config("list"),
        );
        let engine = factory.engine_for(&handle).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        for kind in [EngineEventKind::Drag, EngineEventKind::Drop, EngineEventKind::DragEnd] {
            let sink = events.clone();
            let listener: EngineListener =
                Rc::new(move |event: &EngineEvent, _: &VisualTree| sink.borrow_mut().push(event.kind()));
            engine.borrow_mut().on(kind, listener);
        }

        Fixture {
            tree,
            engine,
            left,
            right,
            items,
            events,
        }
    }

    #[test]
    fn test_drag_and_drop_moves_node() {
        let mut f = fixture();
        let a = f.items[0];

        assert!(SimEngine::start_drag(&f.engine, &f.tree, a, a));
        assert!(f.engine.borrow().is_dragging());
        assert_eq!(f.engine.borrow().dragged(), Some(a));
        assert!(SimEngine::drop_on(&f.engine, &mut f.tree, Some(f.right), None));

        assert_eq!(f.tree.children(f.right), &[a]);
        assert_eq!(
            *f.events.borrow(),
            vec![EngineEventKind::Drag, EngineEventKind::Drop, EngineEventKind::DragEnd]
        );
        assert!(!f.engine.borrow().is_dragging());
        assert_eq!(f.engine.borrow().dragged(), None);
    }

    #[test]
    fn test_drop_outside_leaves_tree() {
        let mut f = fixture();
        let a = f.items[0];

        SimEngine::start_drag(&f.engine, &f.tree, a, a);
        assert!(!SimEngine::drop_on(&f.engine, &mut f.tree, None, None));

        assert_eq!(f.tree.children(f.left), f.items.as_slice());
        assert_eq!(f.events.borrow().len(), 3);
    }

    #[test]
    fn test_unregistered_target_snaps_back() {
        let mut f = fixture();
        let a = f.items[0];
        let stray = f.tree.create_node();
        f.tree.tag_container(stray, "list", "stray");

        SimEngine::start_drag(&f.engine, &f.tree, a, a);
        assert!(!SimEngine::drop_on(&f.engine, &mut f.tree, Some(stray), None));

        assert!(f.tree.children(stray).is_empty());
        assert_eq!(
            *f.events.borrow(),
            vec![EngineEventKind::Drag, EngineEventKind::DragEnd]
        );
    }

    #[test]
    fn test_cannot_start_outside_container() {
        let mut f = fixture();
        let loose = f.tree.create_node();
        let orphan_parent = f.tree.create_node();
        let nested = f.tree.create_node();
        f.tree.append_child(orphan_parent, nested);

        assert!(!SimEngine::start_drag(&f.engine, &f.tree, loose, loose));
        assert!(!SimEngine::start_drag(&f.engine, &f.tree, nested, nested));
        assert!(f.events.borrow().is_empty());
    }

    #[test]
    fn test_cancel_emits_dragend_only() {
        let f = fixture();
        let a = f.items[0];

        SimEngine::start_drag(&f.engine, &f.tree, a, a);
        assert!(SimEngine::cancel(&f.engine, &f.tree));
        assert!(!SimEngine::cancel(&f.engine, &f.tree));

        assert_eq!(
            *f.events.borrow(),
            vec![EngineEventKind::Drag, EngineEventKind::DragEnd]
        );
    }

    #[test]
    fn test_listener_can_detach_itself_during_dispatch() {
        let mut f = fixture();
        let a = f.items[0];
        let slot: Rc<RefCell<Option<EngineListener>>> = Rc::new(RefCell::new(None));

        let listener: EngineListener = {
            let engine = f.engine.clone();
            let slot = slot.clone();
            Rc::new(move |_: &EngineEvent, _: &VisualTree| {
                if let Some(me) = slot.borrow().as_ref() {
                    engine.borrow_mut().off(EngineEventKind::Drop, me);
                }
            })
        };
        *slot.borrow_mut() = Some(listener.clone());
        f.engine.borrow_mut().on(EngineEventKind::Drop, listener);
        assert_eq!(f.engine.borrow().listener_count(EngineEventKind::Drop), 2);

        SimEngine::start_drag(&f.engine, &f.tree, a, a);
        SimEngine::drop_on(&f.engine, &mut f.tree, Some(f.right), None);

        assert_eq!(f.engine.borrow().listener_count(EngineEventKind::Drop), 1);
    }
}

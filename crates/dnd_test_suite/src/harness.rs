//! Scenario harness
//!
//! Provides a [`Board`]: a fresh drag-and-drop context, a visual tree and the
//! headless engine factory, plus helpers to mount lists of items and drive
//! gestures through the engine of a container type.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, ensure, Result};
use dnd_core::geometry::Rect;
use dnd_core::prelude::*;
use dnd_core::sim::{SimEngine, SimFactory};

/// Change reports received by one container instance
pub type ReportLog = Rc<RefCell<Vec<ChangeReport>>>;

/// Result of a single scenario
#[derive(Clone, Debug, PartialEq)]
pub enum TestResult {
    /// Scenario passed
    Passed,
    /// Scenario returned an error
    Failed { reason: String },
}

impl TestResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestResult::Passed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TestResult::Passed => None,
            TestResult::Failed { reason } => Some(reason),
        }
    }
}

/// A mounted container with its rendered items
pub struct MountedList {
    pub binding: ContainerBinding,
    pub node: NodeId,
    pub items: Vec<NodeId>,
    pub elements: Vec<ElementBinding>,
    pub reports: ReportLog,
}

impl MountedList {
    /// Item node at `index`, in render order
    pub fn item(&self, index: usize) -> Result<NodeId> {
        self.items
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("list has no item at index {index}"))
    }

    pub fn report_count(&self) -> usize {
        self.reports.borrow().len()
    }

    /// The only report received so far
    pub fn single_report(&self) -> Result<ChangeReport> {
        let reports = self.reports.borrow();
        ensure!(
            reports.len() == 1,
            "expected exactly one report, got {}",
            reports.len()
        );
        Ok(reports[0].clone())
    }
}

/// Fixture for one scenario
pub struct Board {
    pub ctx: DndContext,
    pub tree: VisualTree,
    pub factory: SimFactory,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let factory = SimFactory::new();
        Self {
            ctx: DndContext::new(factory.clone()),
            tree: VisualTree::new(),
            factory,
        }
    }

    /// Change callback that records into a fresh log
    pub fn recorder() -> (ChangeCallback, ReportLog) {
        let log: ReportLog = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let callback: ChangeCallback =
            Rc::new(move |report: &ChangeReport| sink.borrow_mut().push(report.clone()));
        (callback, log)
    }

    /// Render and mount a container holding `items`, recording its reports
    pub fn mount_list(
        &mut self,
        container: &DndContainer,
        element: &DndElement,
        id: &str,
        items: &[&str],
    ) -> Result<MountedList> {
        let (callback, reports) = Self::recorder();
        let mut list = self.mount_list_with(container, element, id, items, Some(callback))?;
        list.reports = reports;
        Ok(list)
    }

    /// Render and mount a container with an explicit change callback
    pub fn mount_list_with(
        &mut self,
        container: &DndContainer,
        element: &DndElement,
        id: &str,
        items: &[&str],
        on_change: Option<ChangeCallback>,
    ) -> Result<MountedList> {
        let node = self
            .tree
            .create_node_with_bounds(Rect::new(0.0, 0.0, 200.0, 300.0));
        let mut binding = container.instance(Props::with_id(id), on_change);
        binding.mount(&self.ctx, &mut self.tree, &node)?;

        let mut nodes = Vec::with_capacity(items.len());
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            let item_node = self.tree.create_node();
            self.tree.append_child(node, item_node);
            let mut element_binding = element.instance(Props::with_id(*item));
            element_binding.mount(&mut self.tree, &item_node)?;
            nodes.push(item_node);
            elements.push(element_binding);
        }

        Ok(MountedList {
            binding,
            node,
            items: nodes,
            elements,
            reports: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// The headless engine shared by containers of `container_type`
    pub fn engine(&self, container_type: &str) -> Result<Rc<RefCell<SimEngine>>> {
        let group = self
            .ctx
            .group(container_type)
            .ok_or_else(|| anyhow!("no group for container type `{container_type}`"))?;
        self.factory
            .engine_for(group.engine())
            .ok_or_else(|| anyhow!("group `{container_type}` is not backed by a headless engine"))
    }

    /// Pick up `node` by itself
    pub fn drag(&mut self, container_type: &str, node: NodeId) -> Result<()> {
        self.drag_by(container_type, node, node)
    }

    /// Pick up `node` by `handle`, failing if the engine refuses
    pub fn drag_by(&mut self, container_type: &str, node: NodeId, handle: NodeId) -> Result<()> {
        let engine = self.engine(container_type)?;
        ensure!(
            SimEngine::start_drag(&engine, &self.tree, node, handle),
            "engine refused to start the drag"
        );
        Ok(())
    }

    /// Whether the engine would let `node` be picked up by `handle`
    pub fn try_drag_by(&mut self, container_type: &str, node: NodeId, handle: NodeId) -> Result<bool> {
        let engine = self.engine(container_type)?;
        Ok(SimEngine::start_drag(&engine, &self.tree, node, handle))
    }

    /// Release the current drag; returns whether the item moved
    pub fn drop_on(
        &mut self,
        container_type: &str,
        target: Option<NodeId>,
        before: Option<NodeId>,
    ) -> Result<bool> {
        let engine = self.engine(container_type)?;
        Ok(SimEngine::drop_on(&engine, &mut self.tree, target, before))
    }

    /// Drag `node` into `target` before `before` in one go
    pub fn move_item(
        &mut self,
        container_type: &str,
        node: NodeId,
        target: NodeId,
        before: Option<NodeId>,
    ) -> Result<bool> {
        self.drag(container_type, node)?;
        self.drop_on(container_type, Some(target), before)
    }

    pub fn cancel(&mut self, container_type: &str) -> Result<bool> {
        let engine = self.engine(container_type)?;
        Ok(SimEngine::cancel(&engine, &self.tree))
    }

    /// Deliver a pointer move at page coordinates
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.ctx
            .pointer_moved(&mut self.tree, &PointerEvent::mouse(x, y));
    }

    /// Draggable ids currently under a container
    pub fn ids(&self, container: NodeId) -> Vec<String> {
        self.tree.query_child_ids(container)
    }
}

/// Runs scenarios against fresh boards
#[derive(Default)]
pub struct TestHarness {
    run_count: usize,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one scenario on a fresh board
    pub fn run_test<F>(&mut self, name: &str, test_fn: F) -> TestResult
    where
        F: FnOnce(&mut Board) -> Result<()>,
    {
        self.run_count += 1;
        let mut board = Board::new();
        match test_fn(&mut board) {
            Ok(()) => TestResult::Passed,
            Err(e) => {
                tracing::debug!("Scenario {} failed: {:#}", name, e);
                TestResult::Failed {
                    reason: format!("{e:#}"),
                }
            }
        }
    }

    /// Number of scenarios run so far
    pub fn run_count(&self) -> usize {
        self.run_count
    }
}

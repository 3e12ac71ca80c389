//! Drop reconciliation
//!
//! The gesture engine for a container type is shared by every mounted
//! container of that type, so each drop is broadcast to all of their
//! listeners. Each instance filters the broadcast down to drops that landed
//! in itself, reads the post-drop child order of the target (and, for a
//! transfer, the source) and reports it once through its change callback.
//!
//! ```text
//!          drag            drop            dragend
//!   Idle ───────▶ Dragging ──────▶ Dropped ────────▶ Idle
//!                     └────────── dragend ─────────▶ Idle
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::tree::{NodeId, VisualTree};

/// Ordered draggable ids of one container after a drop
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerSnapshot {
    pub id: String,
    pub elements: Vec<String>,
}

/// Before/after report handed to the owning application
///
/// For a reorder inside one container `source` and `target` carry the same
/// id and the same element sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeReport {
    pub source: ContainerSnapshot,
    pub target: ContainerSnapshot,
}

impl ChangeReport {
    pub fn is_same_container(&self) -> bool {
        self.source.id == self.target.id
    }
}

/// Change callback `(report) -> ()`
pub type ChangeCallback = Rc<dyn Fn(&ChangeReport)>;

/// Where the current gesture is, as observed by one instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    Dropped,
}

/// What an instance did with a drop notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released outside every registered container
    OutsideContainers,
    /// Landed in some other instance's container
    OtherInstance,
    /// Landed here but there is no change callback to report to
    MissingCallback,
    /// Change callback invoked with this report
    Reported(ChangeReport),
}

/// Check whether a drop that landed in `target_id` belongs to `instance_id`
pub fn drop_targets_instance(instance_id: &str, target_id: &str) -> bool {
    instance_id == target_id
}

/// Build the change report for a drop, as seen by one instance
///
/// Returns `None` when the drop has no target or source, when either is not
/// a tagged container, or when the target is not this instance.
pub fn reconcile(
    tree: &VisualTree,
    instance_id: &str,
    target: Option<NodeId>,
    source: Option<NodeId>,
) -> Option<ChangeReport> {
    let (target, source) = (target?, source?);
    let target_id = tree.container_id(target)?;
    let source_id = tree.container_id(source)?;

    if !drop_targets_instance(instance_id, target_id) {
        return None;
    }

    let target_elements = tree.query_child_ids(target);
    let source_elements = if source_id == target_id {
        target_elements.clone()
    } else {
        tree.query_child_ids(source)
    };

    Some(ChangeReport {
        source: ContainerSnapshot {
            id: source_id.to_owned(),
            elements: source_elements,
        },
        target: ContainerSnapshot {
            id: target_id.to_owned(),
            elements: target_elements,
        },
    })
}

/// Per-instance drop handling state
///
/// Interior mutability lets the engine listeners share the reconciler with
/// the owning binding, which updates the identity and callback on re-render.
/// No borrow is held while the change callback runs.
#[derive(Default)]
pub struct DropReconciler {
    instance_id: RefCell<String>,
    on_change: RefCell<Option<ChangeCallback>>,
    phase: Cell<DragPhase>,
}

impl DropReconciler {
    pub fn new(instance_id: impl Into<String>, on_change: Option<ChangeCallback>) -> Self {
        Self {
            instance_id: RefCell::new(instance_id.into()),
            on_change: RefCell::new(on_change),
            phase: Cell::new(DragPhase::Idle),
        }
    }

    pub fn instance_id(&self) -> String {
        self.instance_id.borrow().clone()
    }

    pub fn set_instance_id(&self, id: impl Into<String>) {
        *self.instance_id.borrow_mut() = id.into();
    }

    pub fn set_on_change(&self, on_change: Option<ChangeCallback>) {
        *self.on_change.borrow_mut() = on_change;
    }

    pub fn has_callback(&self) -> bool {
        self.on_change.borrow().is_some()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase.get()
    }

    pub fn drag_started(&self) {
        self.phase.set(DragPhase::Dragging);
    }

    pub fn drag_ended(&self) {
        self.phase.set(DragPhase::Idle);
    }

    /// Handle one broadcast drop notification
    pub fn handle_drop(
        &self,
        tree: &VisualTree,
        target: Option<NodeId>,
        source: Option<NodeId>,
    ) -> DropOutcome {
        self.phase.set(DragPhase::Dropped);

        let (Some(target_node), Some(source_node)) = (target, source) else {
            return DropOutcome::OutsideContainers;
        };
        if tree.container_id(target_node).is_none() || tree.container_id(source_node).is_none() {
            return DropOutcome::OutsideContainers;
        }

        let report = {
            let instance_id = self.instance_id.borrow();
            match reconcile(tree, &instance_id, target, source) {
                Some(report) => report,
                None => return DropOutcome::OtherInstance,
            }
        };

        let Some(on_change) = self.on_change.borrow().clone() else {
            tracing::warn!(
                container = %report.target.id,
                "invalid change handler passed to drag-drop container component"
            );
            return DropOutcome::MissingCallback;
        };

        tracing::debug!(
            source = %report.source.id,
            target = %report.target.id,
            "reporting drop"
        );
        on_change(&report);
        DropOutcome::Reported(report)
    }
}

impl fmt::Debug for DropReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropReconciler")
            .field("instance_id", &self.instance_id.borrow())
            .field("has_callback", &self.has_callback())
            .field("phase", &self.phase.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    struct Board {
        tree: VisualTree,
        left: NodeId,
        right: NodeId,
    }

    fn list(tree: &mut VisualTree, id: &str, items: &[&str]) -> NodeId {
        let container = tree.create_node();
        tree.tag_container(container, "list", id);
        for item in items {
            let node = tree.create_node();
            tree.tag_draggable(node, "item", item);
            tree.append_child(container, node);
        }
        container
    }

    fn board() -> Board {
        let mut tree = VisualTree::new();
        let left = list(&mut tree, "left", &["a", "b", "c"]);
        let right = list(&mut tree, "right", &["d"]);
        Board { tree, left, right }
    }

    fn recorder() -> (ChangeCallback, Rc<RefCell<Vec<ChangeReport>>>) {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        let callback: ChangeCallback =
            Rc::new(move |report: &ChangeReport| sink.borrow_mut().push(report.clone()));
        (callback, reports)
    }

    #[test]
    fn test_transfer_between_containers() {
        let mut board = board();
        let b = board.tree.children(board.left)[1];
        board.tree.append_child(board.right, b);

        let report = reconcile(&board.tree, "right", Some(board.right), Some(board.left)).unwrap();

        assert_eq!(report.source.id, "left");
        assert_eq!(report.source.elements, vec!["a", "c"]);
        assert_eq!(report.target.id, "right");
        assert_eq!(report.target.elements, vec!["d", "b"]);
        assert!(!report.is_same_container());
    }

    #[test]
    fn test_same_container_reports_one_sequence() {
        let mut board = board();
        let c = board.tree.children(board.left)[2];
        let a = board.tree.children(board.left)[0];
        board.tree.insert_before(board.left, c, Some(a));

        let report = reconcile(&board.tree, "left", Some(board.left), Some(board.left)).unwrap();

        assert!(report.is_same_container());
        assert_eq!(report.source, report.target);
        assert_eq!(report.target.elements, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_filter_rejects_other_instances() {
        let board = board();

        assert!(reconcile(&board.tree, "left", Some(board.right), Some(board.left)).is_none());
        assert!(drop_targets_instance("right", "right"));
        assert!(!drop_targets_instance("left", "right"));
    }

    #[test]
    fn test_missing_endpoints() {
        let board = board();

        assert!(reconcile(&board.tree, "right", None, Some(board.left)).is_none());
        assert!(reconcile(&board.tree, "right", Some(board.right), None).is_none());
    }

    #[test]
    fn test_handle_drop_invokes_callback_once() {
        let board = board();
        let (callback, reports) = recorder();
        let reconciler = DropReconciler::new("right", Some(callback));

        let outcome = reconciler.handle_drop(&board.tree, Some(board.right), Some(board.left));

        assert!(matches!(outcome, DropOutcome::Reported(_)));
        assert_eq!(reports.borrow().len(), 1);
        assert_eq!(reconciler.phase(), DragPhase::Dropped);
    }

    #[test]
    fn test_handle_drop_other_instance_is_silent() {
        let board = board();
        let (callback, reports) = recorder();
        let reconciler = DropReconciler::new("left", Some(callback));

        let outcome = reconciler.handle_drop(&board.tree, Some(board.right), Some(board.left));

        assert_eq!(outcome, DropOutcome::OtherInstance);
        assert!(reports.borrow().is_empty());
    }

    #[test]
    fn test_handle_drop_outside() {
        let board = board();
        let (callback, reports) = recorder();
        let reconciler = DropReconciler::new("right", Some(callback));

        assert_eq!(
            reconciler.handle_drop(&board.tree, None, Some(board.left)),
            DropOutcome::OutsideContainers
        );
        assert!(reports.borrow().is_empty());
    }

    #[test]
    fn test_handle_drop_without_callback() {
        let board = board();
        let reconciler = DropReconciler::new("right", None);

        assert_eq!(
            reconciler.handle_drop(&board.tree, Some(board.right), Some(board.left)),
            DropOutcome::MissingCallback
        );
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Run `f` with warnings and above written to the returned buffer
    fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        (value, buffer.contents())
    }

    #[test]
    fn test_missing_callback_warns_on_target_only() {
        let board = board();
        let target = DropReconciler::new("right", None);
        let other = DropReconciler::new("left", None);

        let (outcome, logs) = capture_warnings(|| {
            target.handle_drop(&board.tree, Some(board.right), Some(board.left))
        });
        assert_eq!(outcome, DropOutcome::MissingCallback);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("invalid change handler"));
        assert!(logs.contains("container=right"));

        let (outcome, logs) = capture_warnings(|| {
            other.handle_drop(&board.tree, Some(board.right), Some(board.left))
        });
        assert_eq!(outcome, DropOutcome::OtherInstance);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_identity_change_applies_to_next_drop() {
        let board = board();
        let (callback, reports) = recorder();
        let reconciler = DropReconciler::new("left", Some(callback));
        reconciler.set_instance_id("right");

        reconciler.handle_drop(&board.tree, Some(board.right), Some(board.left));
        assert_eq!(reports.borrow().len(), 1);
    }

    #[test]
    fn test_phase_transitions() {
        let reconciler = DropReconciler::default();
        assert_eq!(reconciler.phase(), DragPhase::Idle);
        reconciler.drag_started();
        assert_eq!(reconciler.phase(), DragPhase::Dragging);
        reconciler.drag_ended();
        assert_eq!(reconciler.phase(), DragPhase::Idle);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_serializes() {
        let report = ChangeReport {
            source: ContainerSnapshot {
                id: "left".into(),
                elements: vec!["a".into()],
            },
            target: ContainerSnapshot {
                id: "right".into(),
                elements: vec!["b".into()],
            },
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"source":{"id":"left","elements":["a"]},"target":{"id":"right","elements":["b"]}}"#
        );
    }
}

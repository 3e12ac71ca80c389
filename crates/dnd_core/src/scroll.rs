//! Boundary auto-scroll while dragging
//!
//! Dragging an item past the top or bottom (left or right) edge of a
//! fixed-size scrolling container nudges the container's scroll offset by
//! `rate × distance past the edge` on every pointer move. The handler is only
//! attached to pointer tracking between drag start and drag end.
//!
//! # Example
//!
//! ```rust
//! use dnd_core::geometry::{Point, Rect};
//! use dnd_core::scroll::{scroll_delta, DEFAULT_SCROLL_RATE};
//! use dnd_core::Direction;
//!
//! let bounds = Rect::new(0.0, 100.0, 200.0, 300.0);
//! let delta = scroll_delta(Direction::Vertical, bounds, Point::new(10.0, 450.0), DEFAULT_SCROLL_RATE);
//! assert!((delta - 10.0).abs() < 1e-4);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::engine::Direction;
use crate::geometry::{Point, Rect};
use crate::tree::{NodeId, VisualTree};

/// Default proportion of the overshoot applied to the scroll offset per move
pub const DEFAULT_SCROLL_RATE: f32 = 0.2;

new_key_type! {
    pub struct MoveHandlerId;
}

/// Source of a pointer move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// A pointer move in page coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
}

impl PointerEvent {
    pub fn mouse(x: f32, y: f32) -> Self {
        Self {
            kind: PointerKind::Mouse,
            position: Point::new(x, y),
        }
    }

    pub fn touch(x: f32, y: f32) -> Self {
        Self {
            kind: PointerKind::Touch,
            position: Point::new(x, y),
        }
    }
}

/// Pointer move callback
pub type MoveHandler = Rc<dyn Fn(&mut VisualTree, &PointerEvent)>;

/// Scroll offset change for a pointer position relative to container bounds
///
/// Negative above/left of the container, positive below/right of it, zero
/// inside.
pub fn scroll_delta(direction: Direction, bounds: Rect, pointer: Point, rate: f32) -> f32 {
    let (position, start, end) = match direction {
        Direction::Vertical => (pointer.y, bounds.top(), bounds.bottom()),
        Direction::Horizontal => (pointer.x, bounds.left(), bounds.right()),
    };

    if position < start {
        -rate * (start - position)
    } else if position > end {
        rate * (position - end)
    } else {
        0.0
    }
}

/// Build the pointer-move handler that scrolls `container` near its edges
///
/// The handler reads the container's current bounds on every move, so it
/// follows layout changes. It does nothing once the node is gone.
pub fn make_handler(direction: Direction, container: NodeId, rate: f32) -> MoveHandler {
    Rc::new(move |tree: &mut VisualTree, event: &PointerEvent| {
        let Some(bounds) = tree.bounds(container) else {
            return;
        };
        let delta = scroll_delta(direction, bounds, event.position, rate);
        if delta == 0.0 {
            return;
        }
        tracing::trace!(?direction, delta, "boundary scroll");
        let delta = match direction {
            Direction::Vertical => Point::new(0.0, delta),
            Direction::Horizontal => Point::new(delta, 0.0),
        };
        tree.scroll_by(container, delta);
    })
}

/// Page-level pointer move tracking
///
/// Handlers attached here receive every mouse and touch move until they are
/// detached. Attaching a handler that is already attached returns the
/// existing id.
#[derive(Default)]
pub struct PointerTracker {
    handlers: RefCell<SlotMap<MoveHandlerId, MoveHandler>>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, handler: &MoveHandler) -> MoveHandlerId {
        let mut handlers = self.handlers.borrow_mut();
        if let Some((id, _)) = handlers.iter().find(|(_, h)| Rc::ptr_eq(h, handler)) {
            return id;
        }
        handlers.insert(handler.clone())
    }

    /// Detach a handler. Unknown or already-detached ids are ignored.
    pub fn detach(&self, id: MoveHandlerId) -> bool {
        self.handlers.borrow_mut().remove(id).is_some()
    }

    pub fn is_attached(&self, id: MoveHandlerId) -> bool {
        self.handlers.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Deliver a pointer move to every attached handler
    pub fn dispatch(&self, tree: &mut VisualTree, event: &PointerEvent) {
        let handlers: SmallVec<[MoveHandler; 4]> =
            self.handlers.borrow().values().cloned().collect();
        for handler in handlers {
            handler(tree, event);
        }
    }

    pub(crate) fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}

/// One container's boundary-scroll handler and its attachment state
pub struct ScrollAssist {
    handler: MoveHandler,
    container: NodeId,
    tracker: Rc<PointerTracker>,
    attached: Cell<Option<MoveHandlerId>>,
}

impl ScrollAssist {
    pub fn new(
        tracker: Rc<PointerTracker>,
        direction: Direction,
        container: NodeId,
        rate: f32,
    ) -> Self {
        Self {
            handler: make_handler(direction, container, rate),
            container,
            tracker,
            attached: Cell::new(None),
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Start following pointer moves (drag start)
    pub fn engage(&self) {
        if self.is_engaged() {
            return;
        }
        self.attached.set(Some(self.tracker.attach(&self.handler)));
    }

    /// Stop following pointer moves (drag end or unmount)
    ///
    /// Safe to call when the handler was never engaged.
    pub fn release(&self) {
        if let Some(id) = self.attached.take() {
            self.tracker.detach(id);
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.attached
            .get()
            .is_some_and(|id| self.tracker.is_attached(id))
    }
}

impl fmt::Debug for ScrollAssist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollAssist")
            .field("container", &self.container)
            .field("attached", &self.attached.get())
            .finish()
    }
}

//! Enhancement options
//!
//! Builder-style configuration for drag-and-drop containers and draggable
//! elements. Building validates the options once, up front; a built
//! [`DndContainer`] or [`DndElement`] can be instantiated any number of times.
//!
//! # Example
//!
//! ```rust
//! use dnd_core::options::ContainerOptions;
//! use dnd_core::Direction;
//!
//! let columns = ContainerOptions::new("column", "card")
//!     .handle_class("grip")
//!     .direction(Direction::Horizontal)
//!     .scroll_at_boundaries(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(columns.spec().container_type, "column");
//! ```

use std::rc::Rc;

use crate::engine::Direction;
use crate::error::{DndError, Result};
use crate::lifecycle::{DndContainer, DndElement};
use crate::registry::GroupConfig;
use crate::scroll::DEFAULT_SCROLL_RATE;

/// Props key read for the component identity unless configured otherwise
pub const DEFAULT_ID_PROP: &str = "id";

/// Configuration for a drag-and-drop container
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerOptions {
    /// Props key holding the container id (default: "id")
    pub id_prop: String,
    /// Namespace of containers that exchange items (required)
    pub container_type: Option<String>,
    /// Draggable type these containers accept (required)
    pub accept_type: Option<String>,
    /// Restrict drag start to nodes carrying this class
    pub handle_class: Option<String>,
    /// Layout axis (default: vertical)
    pub direction: Direction,
    /// Scroll the container while dragging past its edges (default: false)
    pub scroll_at_boundaries: bool,
    /// Boundary scroll rate (default: 0.2)
    pub scroll_rate: f32,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            id_prop: DEFAULT_ID_PROP.to_owned(),
            container_type: None,
            accept_type: None,
            handle_class: None,
            direction: Direction::Vertical,
            scroll_at_boundaries: false,
            scroll_rate: DEFAULT_SCROLL_RATE,
        }
    }
}

impl ContainerOptions {
    pub fn new(container_type: impl Into<String>, accept_type: impl Into<String>) -> Self {
        Self {
            container_type: Some(container_type.into()),
            accept_type: Some(accept_type.into()),
            ..Default::default()
        }
    }

    pub fn id_prop(mut self, prop: impl Into<String>) -> Self {
        self.id_prop = prop.into();
        self
    }

    pub fn container_type(mut self, container_type: impl Into<String>) -> Self {
        self.container_type = Some(container_type.into());
        self
    }

    pub fn accept_type(mut self, accept_type: impl Into<String>) -> Self {
        self.accept_type = Some(accept_type.into());
        self
    }

    pub fn handle_class(mut self, class: impl Into<String>) -> Self {
        self.handle_class = Some(class.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn scroll_at_boundaries(mut self, enabled: bool) -> Self {
        self.scroll_at_boundaries = enabled;
        self
    }

    pub fn scroll_rate(mut self, rate: f32) -> Self {
        self.scroll_rate = rate;
        self
    }

    /// Validate the options and produce the container enhancement
    pub fn build(self) -> Result<DndContainer> {
        let container_type = non_empty(self.container_type).ok_or(DndError::MissingContainerType)?;
        let accept_type = non_empty(self.accept_type).ok_or(DndError::MissingAcceptType)?;
        if !self.scroll_rate.is_finite() || self.scroll_rate < 0.0 {
            return Err(DndError::InvalidScrollRate(self.scroll_rate));
        }

        let group = GroupConfig {
            accept_type,
            handle_class: non_empty(self.handle_class),
            direction: self.direction,
        };

        Ok(DndContainer::from_spec(Rc::new(ContainerSpec {
            id_prop: self.id_prop,
            container_type,
            group,
            scroll_at_boundaries: self.scroll_at_boundaries,
            scroll_rate: self.scroll_rate,
        })))
    }
}

/// Validated container configuration shared by all instances
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerSpec {
    pub id_prop: String,
    pub container_type: String,
    pub group: GroupConfig,
    pub scroll_at_boundaries: bool,
    pub scroll_rate: f32,
}

/// Configuration for a draggable element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementOptions {
    /// Props key holding the element id (default: "id")
    pub id_prop: String,
    /// Draggable type, matched against a container's accept type (required)
    pub kind: Option<String>,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            id_prop: DEFAULT_ID_PROP.to_owned(),
            kind: None,
        }
    }
}

impl ElementOptions {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn id_prop(mut self, prop: impl Into<String>) -> Self {
        self.id_prop = prop.into();
        self
    }

    pub fn build(self) -> Result<DndElement> {
        let kind = non_empty(self.kind).ok_or(DndError::MissingElementType)?;
        Ok(DndElement::from_spec(Rc::new(ElementSpec {
            id_prop: self.id_prop,
            kind,
        })))
    }
}

/// Validated element configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSpec {
    pub id_prop: String,
    pub kind: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

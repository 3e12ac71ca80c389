//! Drag-and-drop error types

use thiserror::Error;

/// Errors raised while configuring or mounting drag-and-drop components
///
/// Configuration errors surface when an enhancement is built and cannot be
/// recovered from without fixing the options. Drop-time conditions (missing
/// change callback, drops outside any container) are never errors; they are
/// logged or ignored by the reconciler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DndError {
    /// Container enhancement without a container type
    #[error("dnd container must specify containerType")]
    MissingContainerType,

    /// Container enhancement without an accept type
    #[error("dnd container must specify acceptType")]
    MissingAcceptType,

    /// Element enhancement without a type
    #[error("dnd element must specify type")]
    MissingElementType,

    /// Boundary scroll rate that is negative or not finite
    #[error("container scroll rate must be finite and non-negative, got {0}")]
    InvalidScrollRate(f32),

    /// Props did not carry the configured identity prop
    #[error("props are missing the `{prop}` identity prop")]
    MissingId { prop: String },

    /// Registry operation for a type that has no container group yet
    #[error("no container group registered for type `{0}`")]
    UnknownContainerType(String),
}

/// Result type for drag-and-drop operations
pub type Result<T> = std::result::Result<T, DndError>;

//! Error types for the cell-area engine.
//!
//! Every failure here is non-fatal: the operation that produced it logs a
//! warning, leaves the area untouched and returns the error so callers can
//! inspect it if they care.

use thiserror::Error;

use trellis_core::{PropertyError, ValueError, ValueType};

use crate::renderer::RendererId;

/// Errors reported by cell areas and their collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellAreaError {
    /// The renderer has no property of that name.
    #[error("{type_name} has no attribute named '{name}'")]
    UnknownProperty {
        type_name: &'static str,
        name: String,
    },

    /// The property is already bound to a column on that renderer.
    #[error("attribute '{name}' is already attributed to column {column}")]
    DuplicateBinding { name: String, column: u32 },

    /// The renderer is not part of this area.
    #[error("renderer {0:?} is not in the area")]
    ForeignRenderer(RendererId),

    /// The renderer is already part of this area.
    #[error("renderer {0:?} is already in the area")]
    AlreadyAdded(RendererId),

    /// No cell property of that name is registered for the area's class.
    #[error("{class} has no cell property named '{name}'")]
    UnknownCellProperty { class: &'static str, name: String },

    /// The cell property cannot be written.
    #[error("cell property '{0}' is not writable")]
    CellPropertyNotWritable(&'static str),

    /// The cell property cannot be read.
    #[error("cell property '{0}' is not readable")]
    CellPropertyNotReadable(&'static str),

    /// The value could not be transformed into the declared type.
    #[error("unable to set cell property '{name}' of type {expected} from value of type {got}")]
    TypeMismatch {
        name: &'static str,
        expected: ValueType,
        got: ValueType,
    },

    /// The validator rejected the value.
    #[error("value \"{value}\" is out of range for cell property '{name}'")]
    ValidationFailed { name: &'static str, value: String },

    /// A cell property with that name is already installed on the class.
    #[error("class {class} already contains a cell property named '{name}'")]
    DuplicateCellProperty { class: &'static str, name: &'static str },

    /// Cell property ids must be positive.
    #[error("cell property '{0}' has an invalid id")]
    InvalidCellPropertyId(&'static str),

    /// Construct-only cell properties are not supported.
    #[error("cell property '{0}' cannot be construct-only")]
    ConstructOnly(&'static str),

    /// The area class did not override a hook it needs.
    #[error("{class} does not implement {hook}")]
    Unimplemented {
        class: &'static str,
        hook: &'static str,
    },

    /// A renderer cannot be its own focus sibling.
    #[error("a renderer cannot be its own focus sibling")]
    SiblingOfSelf,

    /// The edge already exists, or the sibling already belongs to a holder.
    #[error("renderer {0:?} is already a focus sibling")]
    AlreadySibling(RendererId),

    /// The renderer is not in editable mode.
    #[error("renderer {0:?} is not editable")]
    NotEditable(RendererId),

    /// The add-editable observers did not parent the edit widget.
    #[error("the edit widget was not added to the host during add-editable")]
    EditableNotParented,

    /// `apply_attributes` was re-entered on the same area.
    #[error("apply_attributes re-entered while already applying a row")]
    ReentrantApply,

    /// A renderer rejected a property write.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// A value conversion failed.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Errors from parsing a [`TreePath`](crate::model::TreePath).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// The string was empty.
    #[error("empty path")]
    Empty,
    /// A component was not a non-negative integer.
    #[error("invalid path index '{0}'")]
    InvalidIndex(String),
}

/// Result type for cell-area operations.
pub type CellAreaResult<T> = Result<T, CellAreaError>;

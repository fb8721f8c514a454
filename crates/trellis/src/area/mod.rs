//! Cell areas: the layout of a row's renderers.
//!
//! A cell area owns the renderers that together draw one row of a view. The
//! host widget drives it row by row: apply the row's attributes, request a
//! size against a shared [`CellAreaContext`], then render, route events or
//! activate. The area keeps the focus cell, the focus-sibling graph and the
//! in-place editing state across those calls.
//!
//! # Architecture
//!
//! - [`CellArea`]: hooks a concrete layout implements (storage, iteration,
//!   allocation, size requests, cell properties, focus navigation)
//! - [`CellAreaBase`]: state every area embeds (bindings, focus, editing,
//!   signals)
//! - [`CellAreaExt`]: the public API, built on the hooks
//! - [`CellAreaBox`]: the bundled horizontal/vertical box layout
//!
//! # Example
//!
//! ```
//! use trellis::area::{CellAreaBox, CellAreaExt};
//! use trellis::model::ListStore;
//! use trellis::renderer::{CellRendererRef, CellRendererText};
//! use trellis_core::{Value, ValueType};
//!
//! let store = ListStore::new(&[ValueType::String]);
//! let row = store.append(vec![Value::from("hello")]).unwrap();
//!
//! let area = CellAreaBox::new();
//! let text = CellRendererText::new();
//! let cell: CellRendererRef = text.clone();
//! area.pack_start(&cell, true, false, false);
//! area.attribute_connect(&cell, "text", 0).unwrap();
//!
//! area.apply_attributes(&store, &row, false, false).unwrap();
//! assert_eq!(text.text(), "hello");
//! assert_eq!(area.current_path_string().as_deref(), Some("0"));
//! ```

mod attributes;
mod base;
mod box_area;
mod box_context;
mod cell_property;
mod context;
mod debug;
mod ext;

pub use attributes::{AttributeBinding, CellDataFunc};
pub use base::{
    CellAreaBase, default_activate, default_apply_attributes, default_event,
    default_is_activatable, default_render,
};
pub use box_area::{BoxAreaConfig, CellAreaBox};
pub use box_context::CellAreaBoxContext;
pub use cell_property::{
    CellPropertyFlags, CellPropertySpec, CellPropertyValidator, find_cell_property,
    install_cell_property, list_cell_properties,
};
pub use context::{
    BasicCellAreaContext, CellAreaContext, CellAreaContextBase, CellAreaContextExt,
    CellAreaContextRef, ContextField,
};
pub use debug::CellAreaDebug;
pub use ext::CellAreaExt;

use std::any::TypeId;
use std::sync::Arc;

use trellis_core::Value;
use trellis_core::logging::targets;
use trellis_render::{Rect, RenderTarget};

use crate::editable::CellEditableRef;
use crate::error::CellAreaError;
use crate::events::CellEvent;
use crate::host::HostWidget;
use crate::model::{TreeIter, TreeModel, TreePath};
use crate::renderer::CellRendererRef;
use crate::state::{CellState, DirectionType, SizeRequestMode};

/// A shared handle to an area.
pub type CellAreaRef = Arc<dyn CellArea>;

/// Payload of [`CellAreaBase::attributes_applied`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedRow {
    pub iter: TreeIter,
    pub path: Option<TreePath>,
    pub is_expander: bool,
    pub is_expanded: bool,
}

/// Payload of [`CellAreaBase::add_editable`].
///
/// Observers must parent `editable` into the host (and call
/// [`set_parented`](crate::editable::CellEditableExt::set_parented)) before
/// returning, or the edit is rolled back.
#[derive(Clone)]
pub struct EditableAdded {
    pub renderer: CellRendererRef,
    pub editable: CellEditableRef,
    /// Allocation of the edited cell.
    pub cell_area: Rect,
    /// Path of the edited row.
    pub path: String,
}

/// Payload of [`CellAreaBase::remove_editable`].
#[derive(Clone)]
pub struct EditableRemoved {
    pub renderer: CellRendererRef,
    pub editable: CellEditableRef,
}

/// Payload of [`CellAreaBase::focus_changed`].
#[derive(Clone)]
pub struct FocusChange {
    /// The new focus cell, if any.
    pub renderer: Option<CellRendererRef>,
    /// Path of the most recently applied row.
    pub path: String,
}

pub(crate) fn warn_unimplemented(class: &'static str, hook: &'static str) {
    let err = CellAreaError::Unimplemented { class, hook };
    tracing::warn!(target: targets::AREA, %err, "missing cell area hook");
}

/// Hooks implemented by a concrete cell area.
///
/// Only [`area_base`](Self::area_base) is required to compile, but an area is
/// not useful without the storage, iteration, allocation and request hooks.
/// Missing hooks log a warning and do nothing.
pub trait CellArea: Send + Sync + 'static {
    // =========================================================================
    // Required Methods
    // =========================================================================

    fn area_base(&self) -> &CellAreaBase;

    // =========================================================================
    // Identity
    // =========================================================================

    /// Class name used in diagnostics and as the owner of cell properties.
    fn class_name(&self) -> &'static str {
        self.area_base().type_name()
    }

    /// Key of this class in the cell property pool.
    fn class_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    // =========================================================================
    // Storage and Iteration
    // =========================================================================

    fn add_cell(&self, _renderer: &CellRendererRef) {
        warn_unimplemented(self.class_name(), "add");
    }

    fn remove_cell(&self, _renderer: &CellRendererRef) {
        warn_unimplemented(self.class_name(), "remove");
    }

    /// Visit every renderer in layout order until `callback` returns `true`.
    fn foreach_cell(&self, _callback: &mut dyn FnMut(&CellRendererRef) -> bool) {
        warn_unimplemented(self.class_name(), "foreach");
    }

    /// Visit every visible renderer with its allocation inside `cell_area`
    /// and its background area, until `callback` returns `true`.
    fn foreach_cell_alloc(
        &self,
        _context: &dyn CellAreaContext,
        _widget: &dyn HostWidget,
        _cell_area: Rect,
        _background: Rect,
        _callback: &mut dyn FnMut(&CellRendererRef, Rect, Rect) -> bool,
    ) {
        warn_unimplemented(self.class_name(), "foreach_alloc");
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    fn new_context(&self) -> Option<CellAreaContextRef> {
        warn_unimplemented(self.class_name(), "create_context");
        None
    }

    fn duplicate_context(&self, _context: &dyn CellAreaContext) -> Option<CellAreaContextRef> {
        warn_unimplemented(self.class_name(), "copy_context");
        None
    }

    fn request_mode(&self) -> SizeRequestMode {
        SizeRequestMode::HeightForWidth
    }

    fn measure_width(&self, _context: &dyn CellAreaContext, _widget: &dyn HostWidget) -> (i32, i32) {
        warn_unimplemented(self.class_name(), "get_preferred_width");
        (0, 0)
    }

    fn measure_height(&self, _context: &dyn CellAreaContext, _widget: &dyn HostWidget) -> (i32, i32) {
        warn_unimplemented(self.class_name(), "get_preferred_height");
        (0, 0)
    }

    fn measure_height_for_width(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        _width: i32,
    ) -> (i32, i32) {
        self.measure_height(context, widget)
    }

    fn measure_width_for_height(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        _height: i32,
    ) -> (i32, i32) {
        self.measure_width(context, widget)
    }

    // =========================================================================
    // Cell Properties
    // =========================================================================

    /// Store an already transformed and validated cell property value.
    fn write_cell_property(&self, _renderer: &CellRendererRef, _spec: &CellPropertySpec, _value: &Value) {
        warn_unimplemented(self.class_name(), "set_cell_property");
    }

    fn read_cell_property(&self, _renderer: &CellRendererRef, _spec: &CellPropertySpec) -> Option<Value> {
        warn_unimplemented(self.class_name(), "get_cell_property");
        None
    }

    // =========================================================================
    // Focus, Events and Painting
    // =========================================================================

    /// Move focus inside the area. Returns `false` when focus leaves it.
    fn move_focus(&self, _direction: DirectionType) -> bool {
        warn_unimplemented(self.class_name(), "focus");
        false
    }

    /// Whether any cell reacts to activation for the current row.
    fn is_activatable(&self) -> bool {
        default_is_activatable(self)
    }

    fn on_event(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        event: &CellEvent,
        cell_area: Rect,
        flags: CellState,
    ) -> bool {
        default_event(self, context, widget, event, cell_area, flags)
    }

    #[allow(clippy::too_many_arguments)]
    fn on_render(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        target: &mut dyn RenderTarget,
        background: Rect,
        cell_area: Rect,
        flags: CellState,
        paint_focus: bool,
    ) {
        default_render(self, context, widget, target, background, cell_area, flags, paint_focus);
    }

    fn on_activate(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
        flags: CellState,
        edit_only: bool,
    ) -> bool {
        default_activate(self, context, widget, cell_area, flags, edit_only)
    }

    fn on_apply_attributes(
        &self,
        model: &dyn TreeModel,
        iter: &TreeIter,
        is_expander: bool,
        is_expanded: bool,
    ) {
        default_apply_attributes(self, model, iter, is_expander, is_expanded);
    }
}

static_assertions::assert_obj_safe!(CellArea, CellAreaContext);

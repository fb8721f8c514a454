//! The public cell area API.

use std::sync::Arc;

use trellis_core::logging::{span_names, targets};
use trellis_core::{PerfSpan, Value};
use trellis_render::{Point, Rect, RenderTarget};

use super::attributes::CellDataFunc;
use super::base::{apply_row, start_cell_edit, store_cell_property};
use super::cell_property::{self, CellPropertySpec};
use super::{CellArea, CellAreaContext, CellAreaContextRef, EditableRemoved, FocusChange};
use crate::editable::{CellEditableExt, CellEditableRef};
use crate::error::{CellAreaError, CellAreaResult};
use crate::events::CellEvent;
use crate::host::HostWidget;
use crate::model::{TreeIter, TreeModel};
use crate::renderer::{CellRendererExt, CellRendererRef, same_renderer};
use crate::state::{CellRendererMode, CellState, DirectionType, Orientation};

/// Log a failed operation under `target` and hand the result back.
macro_rules! warned {
    ($result:expr, $target:expr $(,)?) => {{
        let result = $result;
        if let Err(err) = &result {
            tracing::warn!(target: $target, %err);
        }
        result
    }};
}

/// Public cell area API. Implemented for every [`CellArea`].
///
/// Fallible operations log a warning when they fail and leave the area
/// unchanged; the returned error is informational.
pub trait CellAreaExt: CellArea {
    // =========================================================================
    // Cells
    // =========================================================================

    fn add(&self, renderer: &CellRendererRef) -> CellAreaResult<()> {
        if self.has_renderer(renderer) {
            return warned!(Err(CellAreaError::AlreadyAdded(renderer.id())), targets::AREA);
        }
        self.add_cell(renderer);
        tracing::debug!(target: targets::AREA, area = self.class_name(), renderer = ?renderer.id(), "cell added");
        Ok(())
    }

    /// Add `renderer` and set cell properties on it in one go.
    fn add_with_properties(
        &self,
        renderer: &CellRendererRef,
        properties: &[(&str, Value)],
    ) -> CellAreaResult<()> {
        self.add(renderer)?;
        self.cell_set(renderer, properties)
    }

    /// Remove `renderer`, dropping its bindings, data func and focus-sibling
    /// edges. An edit in progress on it is canceled.
    fn remove(&self, renderer: &CellRendererRef) -> CellAreaResult<()> {
        if !self.has_renderer(renderer) {
            return warned!(Err(CellAreaError::ForeignRenderer(renderer.id())), targets::AREA);
        }
        let base = self.area_base();
        if base.edited_cell().is_some_and(|edited| same_renderer(&edited, renderer)) {
            self.stop_editing(true);
        }
        if base.focus_cell().is_some_and(|focus| same_renderer(&focus, renderer)) {
            self.set_focus_cell(None);
        }
        drop(base.forget_renderer(renderer));
        self.remove_cell(renderer);
        tracing::debug!(target: targets::AREA, area = self.class_name(), renderer = ?renderer.id(), "cell removed");
        Ok(())
    }

    fn has_renderer(&self, renderer: &CellRendererRef) -> bool {
        let mut found = false;
        self.foreach(|cell| {
            found = same_renderer(cell, renderer);
            found
        });
        found
    }

    /// Visit every renderer in layout order until `callback` returns `true`.
    fn foreach<F>(&self, mut callback: F)
    where
        F: FnMut(&CellRendererRef) -> bool,
    {
        self.foreach_cell(&mut callback);
    }

    /// Visit every visible renderer with its allocation and background area
    /// until `callback` returns `true`.
    fn foreach_alloc<F>(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
        background: Rect,
        mut callback: F,
    ) where
        F: FnMut(&CellRendererRef, Rect, Rect) -> bool,
    {
        self.foreach_cell_alloc(context, widget, cell_area, background, &mut callback);
    }

    /// The renderers in layout order.
    fn cells(&self) -> Vec<CellRendererRef> {
        let mut cells = Vec::new();
        self.foreach(|cell| {
            cells.push(Arc::clone(cell));
            false
        });
        cells
    }

    /// Remove every renderer.
    fn clear(&self) {
        for cell in self.cells() {
            let _ = self.remove(&cell);
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Bind renderer property `name` to model `column`.
    fn attribute_connect(&self, renderer: &CellRendererRef, name: &str, column: u32) -> CellAreaResult<()> {
        if !self.has_renderer(renderer) {
            return warned!(Err(CellAreaError::ForeignRenderer(renderer.id())), targets::ATTRIBUTES);
        }
        let Some(info) = renderer.find_property(name) else {
            return warned!(
                Err(CellAreaError::UnknownProperty {
                    type_name: renderer.renderer_base().type_name(),
                    name: name.to_string(),
                }),
                targets::ATTRIBUTES,
            );
        };
        warned!(
            self.area_base().bind_attribute(renderer.id(), info.name, column),
            targets::ATTRIBUTES,
        )?;
        tracing::trace!(target: targets::ATTRIBUTES, renderer = ?renderer.id(), attribute = info.name, column, "attribute bound");
        Ok(())
    }

    /// Remove the binding of `name`, if any.
    fn attribute_disconnect(&self, renderer: &CellRendererRef, name: &str) {
        if self.area_base().unbind_attribute(renderer.id(), name) {
            tracing::trace!(target: targets::ATTRIBUTES, renderer = ?renderer.id(), attribute = name, "attribute unbound");
        }
    }

    fn attribute_get_column(&self, renderer: &CellRendererRef, name: &str) -> Option<u32> {
        self.area_base().attribute_column(renderer.id(), name)
    }

    /// Drop every binding of `renderer`. The data func is kept.
    fn clear_attributes(&self, renderer: &CellRendererRef) {
        self.area_base().clear_bindings(renderer.id());
    }

    /// Install, replace or clear the data func of `renderer`.
    fn set_cell_data_func(&self, renderer: &CellRendererRef, func: Option<CellDataFunc>) -> CellAreaResult<()> {
        if !self.has_renderer(renderer) {
            return warned!(Err(CellAreaError::ForeignRenderer(renderer.id())), targets::ATTRIBUTES);
        }
        let previous = self
            .area_base()
            .replace_data_func(renderer.id(), func.map(Arc::from));
        drop(previous);
        Ok(())
    }

    /// Push the values of one row into every bound renderer, run the data
    /// funcs and emit `attributes_applied`. Afterwards
    /// [`current_path_string`](Self::current_path_string) names the row.
    fn apply_attributes(
        &self,
        model: &dyn TreeModel,
        iter: &TreeIter,
        is_expander: bool,
        is_expanded: bool,
    ) -> CellAreaResult<()> {
        apply_row(self, model, iter, is_expander, is_expanded)
    }

    /// Path of the most recently applied row, in `"0:2:1"` form.
    fn current_path_string(&self) -> Option<String> {
        self.area_base().current_path()
    }

    // =========================================================================
    // Cell Properties
    // =========================================================================

    fn find_cell_property(&self, name: &str) -> Option<Arc<CellPropertySpec>> {
        cell_property::find_cell_property(self.class_id(), name)
    }

    fn list_cell_properties(&self) -> Vec<Arc<CellPropertySpec>> {
        cell_property::list_cell_properties(self.class_id())
    }

    /// Set cell property `name` of `renderer`.
    ///
    /// The value is transformed to the declared type and validated; strict
    /// specs reject values the validator had to coerce.
    fn cell_set_property(&self, renderer: &CellRendererRef, name: &str, value: Value) -> CellAreaResult<()> {
        let Some(spec) = self.find_cell_property(name) else {
            return warned!(
                Err(CellAreaError::UnknownCellProperty {
                    class: self.class_name(),
                    name: name.to_string(),
                }),
                targets::CELL_PROPERTY,
            );
        };
        if !self.has_renderer(renderer) {
            return warned!(Err(CellAreaError::ForeignRenderer(renderer.id())), targets::CELL_PROPERTY);
        }
        warned!(store_cell_property(self, renderer, &spec, &value), targets::CELL_PROPERTY)
    }

    fn cell_get_property(&self, renderer: &CellRendererRef, name: &str) -> CellAreaResult<Value> {
        let Some(spec) = self.find_cell_property(name) else {
            return warned!(
                Err(CellAreaError::UnknownCellProperty {
                    class: self.class_name(),
                    name: name.to_string(),
                }),
                targets::CELL_PROPERTY,
            );
        };
        if !spec.flags().readable {
            return warned!(Err(CellAreaError::CellPropertyNotReadable(spec.name())), targets::CELL_PROPERTY);
        }
        let value = self
            .read_cell_property(renderer, &spec)
            .ok_or(CellAreaError::ForeignRenderer(renderer.id()));
        warned!(value, targets::CELL_PROPERTY)
    }

    /// Set several cell properties, stopping at the first failure.
    fn cell_set(&self, renderer: &CellRendererRef, properties: &[(&str, Value)]) -> CellAreaResult<()> {
        for (name, value) in properties {
            self.cell_set_property(renderer, name, value.clone())?;
        }
        Ok(())
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    fn create_context(&self) -> Option<CellAreaContextRef> {
        self.new_context()
    }

    /// A new context carrying over the state of `context`.
    fn copy_context(&self, context: &dyn CellAreaContext) -> Option<CellAreaContextRef> {
        self.duplicate_context(context)
    }

    /// Request the row's width, accumulating it into `context`.
    #[tracing::instrument(skip_all, target = "trellis::area", level = "trace")]
    fn preferred_width(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        let _perf = PerfSpan::new(span_names::REQUEST);
        self.measure_width(context, widget)
    }

    /// Request the row's height, accumulating it into `context`.
    #[tracing::instrument(skip_all, target = "trellis::area", level = "trace")]
    fn preferred_height(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        let _perf = PerfSpan::new(span_names::REQUEST);
        self.measure_height(context, widget)
    }

    /// Request the row's height for `width`. Not accumulated.
    #[tracing::instrument(skip_all, target = "trellis::area", level = "trace", fields(width = width))]
    fn preferred_height_for_width(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        width: i32,
    ) -> (i32, i32) {
        self.measure_height_for_width(context, widget, width)
    }

    /// Request the row's width for `height`. Not accumulated.
    #[tracing::instrument(skip_all, target = "trellis::area", level = "trace", fields(height = height))]
    fn preferred_width_for_height(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        height: i32,
    ) -> (i32, i32) {
        self.measure_width_for_height(context, widget, height)
    }

    /// `cell_area` minus the host's cell padding.
    fn inner_cell_area(&self, widget: &dyn HostWidget, cell_area: Rect) -> Rect {
        cell_area.shrink(widget.padding())
    }

    /// A renderer's request plus the host's cell padding along `orientation`.
    ///
    /// A non-negative `for_size` is the size in the other orientation; it is
    /// reduced by the padding on that axis before the renderer sees it.
    fn request_renderer(
        &self,
        renderer: &CellRendererRef,
        orientation: Orientation,
        widget: &dyn HostWidget,
        for_size: i32,
    ) -> (i32, i32) {
        let padding = widget.padding();
        let ((minimum, natural), extra) = match orientation {
            Orientation::Horizontal => {
                let request = if for_size < 0 {
                    renderer.preferred_width(widget)
                } else {
                    renderer.preferred_width_for_height(widget, (for_size - padding.vertical()).max(0))
                };
                (request, padding.horizontal())
            }
            Orientation::Vertical => {
                let request = if for_size < 0 {
                    renderer.preferred_height(widget)
                } else {
                    renderer.preferred_height_for_width(widget, (for_size - padding.horizontal()).max(0))
                };
                (request, padding.vertical())
            }
        };
        (minimum + extra, natural + extra)
    }

    /// The renderer allocated at `(x, y)` and its allocation. Left and top
    /// edges belong to a cell; right and bottom edges do not.
    fn cell_at_position(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
        x: i32,
        y: i32,
    ) -> Option<(CellRendererRef, Rect)> {
        let point = Point::new(x, y);
        let mut hit = None;
        self.foreach_alloc(context, widget, cell_area, cell_area, |renderer, allocation, _| {
            if allocation.contains(point) {
                hit = Some((Arc::clone(renderer), allocation));
            }
            hit.is_some()
        });
        hit
    }

    /// Where `renderer` sits inside `cell_area`.
    fn cell_allocation(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        renderer: &CellRendererRef,
        cell_area: Rect,
    ) -> Option<Rect> {
        if !self.has_renderer(renderer) {
            let _: CellAreaResult<()> = warned!(Err(CellAreaError::ForeignRenderer(renderer.id())), targets::AREA);
            return None;
        }
        let mut found = None;
        self.foreach_alloc(context, widget, cell_area, cell_area, |cell, allocation, _| {
            if same_renderer(cell, renderer) {
                found = Some(allocation);
            }
            found.is_some()
        });
        found
    }

    // =========================================================================
    // Painting, Events and Activation
    // =========================================================================

    /// Render one row. The focus rectangle is drawn only when `paint_focus`
    /// is set, no cell is being edited and the host shows focus.
    #[allow(clippy::too_many_arguments)]
    fn render(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        target: &mut dyn RenderTarget,
        background: Rect,
        cell_area: Rect,
        flags: CellState,
        paint_focus: bool,
    ) {
        self.on_render(context, widget, target, background, cell_area, flags, paint_focus);
    }

    /// Route an input event to the row. Returns `true` if it was consumed.
    #[tracing::instrument(skip_all, target = "trellis::area", level = "trace")]
    fn event(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        event: &CellEvent,
        cell_area: Rect,
        flags: CellState,
    ) -> bool {
        let _perf = PerfSpan::new(span_names::EVENT);
        self.on_event(context, widget, event, cell_area, flags)
    }

    /// Activate the focus cell, or the first suitable one. With `edit_only`
    /// only editable cells are considered.
    #[tracing::instrument(skip_all, target = "trellis::area", level = "trace", fields(edit_only = edit_only))]
    fn activate(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
        flags: CellState,
        edit_only: bool,
    ) -> bool {
        self.on_activate(context, widget, cell_area, flags, edit_only)
    }

    /// Activate or start editing `renderer`, allocated at `cell_area`.
    fn activate_cell(
        &self,
        widget: &dyn HostWidget,
        renderer: &CellRendererRef,
        event: Option<&CellEvent>,
        cell_area: Rect,
        flags: CellState,
    ) -> bool {
        if !renderer.renderer_base().is_sensitive() {
            return false;
        }
        match renderer.mode() {
            CellRendererMode::Activatable => {
                let path = self.current_path_string().unwrap_or_default();
                renderer.activate(event, widget, &path, cell_area, cell_area, flags)
            }
            CellRendererMode::Editable => start_cell_edit(self, widget, renderer, event, cell_area, flags),
            CellRendererMode::Inert => false,
        }
    }

    /// End the edit in progress, if any.
    ///
    /// Without `canceled` the edit widget is told it is done first.
    /// `remove_editable` is emitted once, after the state is cleared.
    fn stop_editing(&self, canceled: bool) {
        let base = self.area_base();
        let Some((renderer, editable)) = base.current_edit() else {
            return;
        };
        tracing::debug!(target: targets::EDITING, renderer = ?renderer.id(), canceled, "stopping edit");
        renderer.stop_editing(canceled);
        if !canceled {
            editable.editing_done();
        }
        // The widget may already have asked for removal while finishing.
        if let Some((renderer, editable)) = base.end_edit() {
            base.remove_editable.emit(EditableRemoved { renderer, editable });
        }
    }

    fn edited_cell(&self) -> Option<CellRendererRef> {
        self.area_base().edited_cell()
    }

    fn edit_widget(&self) -> Option<CellEditableRef> {
        self.area_base().edit_widget()
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Move focus in `direction`. Returns `false` when focus leaves the area.
    fn focus(&self, direction: DirectionType) -> bool {
        let moved = self.move_focus(direction);
        tracing::trace!(target: targets::FOCUS, ?direction, moved, "focus");
        moved
    }

    /// Set the focus cell and emit `focus_changed`, even when unchanged.
    fn set_focus_cell(&self, renderer: Option<&CellRendererRef>) {
        if let Some(renderer) = renderer
            && !self.has_renderer(renderer)
        {
            let _: CellAreaResult<()> = warned!(Err(CellAreaError::ForeignRenderer(renderer.id())), targets::FOCUS);
            return;
        }
        let base = self.area_base();
        let renderer = renderer.cloned();
        base.replace_focus_cell(renderer.clone());
        let path = base.current_path().unwrap_or_default();
        tracing::debug!(target: targets::FOCUS, renderer = ?renderer.as_ref().map(|r| r.id()), path = %path, "focus cell set");
        base.focus_changed.emit(FocusChange { renderer, path });
    }

    fn focus_cell(&self) -> Option<CellRendererRef> {
        self.area_base().focus_cell()
    }

    /// Make `sibling` part of `holder`'s focus.
    fn add_focus_sibling(&self, holder: &CellRendererRef, sibling: &CellRendererRef) -> CellAreaResult<()> {
        let result = if same_renderer(holder, sibling) {
            Err(CellAreaError::SiblingOfSelf)
        } else if !self.has_renderer(holder) {
            Err(CellAreaError::ForeignRenderer(holder.id()))
        } else if !self.has_renderer(sibling) {
            Err(CellAreaError::ForeignRenderer(sibling.id()))
        } else {
            self.area_base().link_sibling(holder, sibling)
        };
        warned!(result, targets::FOCUS)
    }

    /// Remove the edge `holder -> sibling`. Returns `false` if it did not
    /// exist.
    fn remove_focus_sibling(&self, holder: &CellRendererRef, sibling: &CellRendererRef) -> bool {
        self.area_base().unlink_sibling(holder, sibling)
    }

    fn is_focus_sibling(&self, holder: &CellRendererRef, sibling: &CellRendererRef) -> bool {
        self.focus_siblings(holder)
            .iter()
            .any(|s| same_renderer(s, sibling))
    }

    fn focus_siblings(&self, holder: &CellRendererRef) -> Vec<CellRendererRef> {
        self.area_base().siblings_of(holder)
    }

    /// The holder whose focus `sibling` belongs to.
    fn focus_from_sibling(&self, sibling: &CellRendererRef) -> Option<CellRendererRef> {
        self.area_base().holder_of(sibling)
    }
}

impl<T: CellArea + ?Sized> CellAreaExt for T {}

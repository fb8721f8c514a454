//! State shared by every cell area, and the default behaviour of the
//! overridable hooks.
//!
//! The `default_*` functions are what [`CellArea`]'s hooks do unless a
//! class overrides them. An override that only wants to add behaviour can
//! call them to chain up.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use trellis_core::logging::{span_names, targets};
use trellis_core::{ConnectionId, PerfSpan, Signal, Value};
use trellis_render::{Rect, RenderTarget};

use super::attributes::{AttributeBinding, CellInfo, SharedDataFunc};
use super::{
    AppliedRow, CellArea, CellAreaContext, CellAreaExt, CellAreaRef, EditableAdded,
    EditableRemoved, FocusChange,
};
use crate::editable::{CellEditableExt, CellEditableRef};
use crate::error::{CellAreaError, CellAreaResult};
use crate::events::{CellEvent, Key, MouseButton};
use crate::host::HostWidget;
use crate::model::{TreeIter, TreeModel};
use crate::renderer::{CellRendererExt, CellRendererRef, RendererId, same_renderer};
use crate::state::{CellRendererMode, CellState};

struct EditSession {
    renderer: CellRendererRef,
    editable: CellEditableRef,
    remove_handler: ConnectionId,
}

#[derive(Default)]
struct AreaState {
    cell_info: HashMap<RendererId, CellInfo>,
    /// Focus holders with their siblings, in insertion order.
    focus_siblings: Vec<(CellRendererRef, Vec<CellRendererRef>)>,
    focus_cell: Option<CellRendererRef>,
    edit: Option<EditSession>,
    current_path: Option<String>,
}

/// State embedded by every cell area.
///
/// Holds the attribute bindings, the focus cell and its siblings, the
/// editing session and the area's signals. Locks are released before any
/// renderer hook, data func or signal slot runs.
pub struct CellAreaBase {
    type_name: &'static str,
    this: Weak<dyn CellArea>,
    state: Mutex<AreaState>,
    applying: AtomicBool,

    /// Emitted after a row's attributes have been applied.
    pub attributes_applied: Signal<AppliedRow>,
    /// Emitted when an edit widget must be parented by the host.
    pub add_editable: Signal<EditableAdded>,
    /// Emitted once per edit, after the editing state has been cleared.
    pub remove_editable: Signal<EditableRemoved>,
    /// Emitted on every [`set_focus_cell`](CellAreaExt::set_focus_cell).
    pub focus_changed: Signal<FocusChange>,
}

impl CellAreaBase {
    /// Create the base for an area constructed with [`Arc::new_cyclic`].
    ///
    /// `this` is the area's own weak handle; contexts and edit widgets reach
    /// the area through it.
    pub fn new(type_name: &'static str, this: Weak<dyn CellArea>) -> Self {
        Self {
            type_name,
            this,
            state: Mutex::new(AreaState::default()),
            applying: AtomicBool::new(false),
            attributes_applied: Signal::new(),
            add_editable: Signal::new(),
            remove_editable: Signal::new(),
            focus_changed: Signal::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// A strong handle to the owning area, while it is alive.
    pub fn area(&self) -> Option<CellAreaRef> {
        self.this.upgrade()
    }

    pub fn focus_cell(&self) -> Option<CellRendererRef> {
        self.state.lock().focus_cell.clone()
    }

    /// The renderer being edited, if any.
    pub fn edited_cell(&self) -> Option<CellRendererRef> {
        self.state.lock().edit.as_ref().map(|edit| Arc::clone(&edit.renderer))
    }

    /// The widget editing [`edited_cell`](Self::edited_cell), if any.
    pub fn edit_widget(&self) -> Option<CellEditableRef> {
        self.state.lock().edit.as_ref().map(|edit| Arc::clone(&edit.editable))
    }

    pub fn is_editing(&self) -> bool {
        self.state.lock().edit.is_some()
    }

    pub(crate) fn current_edit(&self) -> Option<(CellRendererRef, CellEditableRef)> {
        self.state
            .lock()
            .edit
            .as_ref()
            .map(|edit| (Arc::clone(&edit.renderer), Arc::clone(&edit.editable)))
    }

    /// Path of the most recently applied row.
    pub fn current_path(&self) -> Option<String> {
        self.state.lock().current_path.clone()
    }

    pub(crate) fn set_current_path(&self, path: Option<String>) {
        self.state.lock().current_path = path;
    }

    pub(crate) fn replace_focus_cell(&self, renderer: Option<CellRendererRef>) {
        self.state.lock().focus_cell = renderer;
    }

    // =========================================================================
    // Attribute Bindings
    // =========================================================================

    pub(crate) fn bind_attribute(
        &self,
        renderer: RendererId,
        name: &'static str,
        column: u32,
    ) -> CellAreaResult<()> {
        let mut state = self.state.lock();
        let info = state.cell_info.entry(renderer).or_default();
        if let Some(existing) = info.column_of(name) {
            return Err(CellAreaError::DuplicateBinding {
                name: name.to_string(),
                column: existing,
            });
        }
        info.bindings.push(AttributeBinding { name, column });
        Ok(())
    }

    /// Returns `true` if a binding was removed.
    pub(crate) fn unbind_attribute(&self, renderer: RendererId, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(info) = state.cell_info.get_mut(&renderer) else {
            return false;
        };
        let removed = info.unbind(name);
        if info.is_empty() {
            state.cell_info.remove(&renderer);
        }
        removed
    }

    pub(crate) fn attribute_column(&self, renderer: RendererId, name: &str) -> Option<u32> {
        self.state.lock().cell_info.get(&renderer)?.column_of(name)
    }

    pub(crate) fn bindings(&self, renderer: RendererId) -> Vec<AttributeBinding> {
        self.state
            .lock()
            .cell_info
            .get(&renderer)
            .map(|info| info.bindings.clone())
            .unwrap_or_default()
    }

    pub(crate) fn has_data_func(&self, renderer: RendererId) -> bool {
        self.state
            .lock()
            .cell_info
            .get(&renderer)
            .is_some_and(|info| info.data_func.is_some())
    }

    pub(crate) fn clear_bindings(&self, renderer: RendererId) {
        let mut state = self.state.lock();
        if let Some(info) = state.cell_info.get_mut(&renderer) {
            info.bindings.clear();
            if info.is_empty() {
                state.cell_info.remove(&renderer);
            }
        }
    }

    /// Install or clear the data func. The previous func is returned so the
    /// caller drops it after the lock is released.
    pub(crate) fn replace_data_func(
        &self,
        renderer: RendererId,
        func: Option<SharedDataFunc>,
    ) -> Option<SharedDataFunc> {
        let mut state = self.state.lock();
        match func {
            Some(func) => state.cell_info.entry(renderer).or_default().data_func.replace(func),
            None => {
                let info = state.cell_info.get_mut(&renderer)?;
                let previous = info.data_func.take();
                if info.is_empty() {
                    state.cell_info.remove(&renderer);
                }
                previous
            }
        }
    }

    fn cell_data(&self, renderer: RendererId) -> Option<(Vec<AttributeBinding>, Option<SharedDataFunc>)> {
        let state = self.state.lock();
        let info = state.cell_info.get(&renderer)?;
        Some((info.bindings.clone(), info.data_func.clone()))
    }

    // =========================================================================
    // Focus Siblings
    // =========================================================================

    pub(crate) fn link_sibling(
        &self,
        holder: &CellRendererRef,
        sibling: &CellRendererRef,
    ) -> CellAreaResult<()> {
        let mut state = self.state.lock();
        let owned = state
            .focus_siblings
            .iter()
            .any(|(_, siblings)| siblings.iter().any(|s| same_renderer(s, sibling)));
        if owned {
            return Err(CellAreaError::AlreadySibling(sibling.id()));
        }
        match state
            .focus_siblings
            .iter_mut()
            .find(|(h, _)| same_renderer(h, holder))
        {
            Some((_, siblings)) => siblings.push(Arc::clone(sibling)),
            None => state
                .focus_siblings
                .push((Arc::clone(holder), vec![Arc::clone(sibling)])),
        }
        Ok(())
    }

    /// Returns `true` if the edge existed.
    pub(crate) fn unlink_sibling(&self, holder: &CellRendererRef, sibling: &CellRendererRef) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state
            .focus_siblings
            .iter()
            .position(|(h, _)| same_renderer(h, holder))
        else {
            return false;
        };
        let siblings = &mut state.focus_siblings[index].1;
        let before = siblings.len();
        siblings.retain(|s| !same_renderer(s, sibling));
        let removed = siblings.len() != before;
        if siblings.is_empty() {
            state.focus_siblings.remove(index);
        }
        removed
    }

    pub(crate) fn siblings_of(&self, holder: &CellRendererRef) -> Vec<CellRendererRef> {
        self.state
            .lock()
            .focus_siblings
            .iter()
            .find(|(h, _)| same_renderer(h, holder))
            .map(|(_, siblings)| siblings.clone())
            .unwrap_or_default()
    }

    pub(crate) fn holder_of(&self, sibling: &CellRendererRef) -> Option<CellRendererRef> {
        self.state
            .lock()
            .focus_siblings
            .iter()
            .find(|(_, siblings)| siblings.iter().any(|s| same_renderer(s, sibling)))
            .map(|(holder, _)| Arc::clone(holder))
    }

    /// Drop the renderer's cell info and every focus-sibling edge naming it.
    /// The cell info is returned so it is dropped outside the lock.
    pub(crate) fn forget_renderer(&self, renderer: &CellRendererRef) -> Option<CellInfo> {
        let mut state = self.state.lock();
        let info = state.cell_info.remove(&renderer.id());
        state.focus_siblings.retain(|(holder, _)| !same_renderer(holder, renderer));
        for (_, siblings) in state.focus_siblings.iter_mut() {
            siblings.retain(|s| !same_renderer(s, renderer));
        }
        state.focus_siblings.retain(|(_, siblings)| !siblings.is_empty());
        info
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Enter the editing state and watch the widget's `remove_widget`.
    pub(crate) fn begin_edit(&self, renderer: &CellRendererRef, editable: &CellEditableRef) {
        let area = self.this.clone();
        let remove_handler = editable.editable_base().remove_widget.connect(move |_| {
            if let Some(area) = area.upgrade() {
                area.area_base().on_remove_widget();
            }
        });
        let previous = self.state.lock().edit.replace(EditSession {
            renderer: Arc::clone(renderer),
            editable: Arc::clone(editable),
            remove_handler,
        });
        if let Some(previous) = previous {
            previous
                .editable
                .editable_base()
                .remove_widget
                .disconnect(previous.remove_handler);
        }
    }

    /// Leave the editing state, disconnecting from the widget.
    pub(crate) fn end_edit(&self) -> Option<(CellRendererRef, CellEditableRef)> {
        let session = self.state.lock().edit.take()?;
        session
            .editable
            .editable_base()
            .remove_widget
            .disconnect(session.remove_handler);
        Some((session.renderer, session.editable))
    }

    fn on_remove_widget(&self) {
        let Some((renderer, editable)) = self.end_edit() else {
            return;
        };
        tracing::debug!(target: targets::EDITING, renderer = ?renderer.id(), "edit widget asked for removal");
        self.remove_editable.emit(EditableRemoved { renderer, editable });
    }

    // =========================================================================
    // Re-entrancy
    // =========================================================================

    fn enter_apply(&self) -> Option<ApplyGuard<'_>> {
        self.applying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ApplyGuard { flag: &self.applying })
    }
}

impl fmt::Debug for CellAreaBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CellAreaBase")
            .field("type_name", &self.type_name)
            .field("bound_cells", &state.cell_info.len())
            .field("focus_cell", &state.focus_cell.as_ref().map(|r| r.id()))
            .field("edited_cell", &state.edit.as_ref().map(|e| e.renderer.id()))
            .field("current_path", &state.current_path)
            .finish()
    }
}

struct ApplyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

static_assertions::assert_impl_all!(CellAreaBase: Send, Sync);

// =============================================================================
// Default hook behaviour
// =============================================================================

/// Push one row into every bound renderer.
///
/// Renderer notifications are frozen for the duration of each renderer's
/// update. `is-expander` and `is-expanded` are only written when they differ.
pub fn default_apply_attributes<A: CellArea + ?Sized>(
    area: &A,
    model: &dyn TreeModel,
    iter: &TreeIter,
    is_expander: bool,
    is_expanded: bool,
) {
    let base = area.area_base();
    for renderer in area.cells() {
        let Some((bindings, data_func)) = base.cell_data(renderer.id()) else {
            continue;
        };
        let renderer_base = renderer.renderer_base();
        renderer.freeze_notify();
        if renderer_base.is_expander() != is_expander {
            renderer_base.set_is_expander(is_expander);
        }
        if renderer_base.is_expanded() != is_expanded {
            renderer_base.set_is_expanded(is_expanded);
        }
        for binding in &bindings {
            let Some(value) = model.value(iter, binding.column) else {
                tracing::warn!(
                    target: targets::ATTRIBUTES,
                    renderer = ?renderer.id(),
                    attribute = binding.name,
                    column = binding.column,
                    "model has no value for bound column"
                );
                continue;
            };
            if let Err(err) = renderer.set_property(binding.name, value) {
                tracing::warn!(target: targets::ATTRIBUTES, renderer = ?renderer.id(), %err, "attribute not applied");
            }
        }
        if let Some(func) = data_func {
            func(&renderer, model, iter);
        }
        renderer.thaw_notify();
    }
}

/// Whether any visible renderer is activatable or editable.
pub fn default_is_activatable<A: CellArea + ?Sized>(area: &A) -> bool {
    let mut activatable = false;
    area.foreach(|renderer| {
        activatable = renderer.is_visible() && renderer.can_activate();
        activatable
    });
    activatable
}

/// Cancel edits on Escape and activate cells on primary clicks.
pub fn default_event<A: CellArea + ?Sized>(
    area: &A,
    context: &dyn CellAreaContext,
    widget: &dyn HostWidget,
    event: &CellEvent,
    cell_area: Rect,
    flags: CellState,
) -> bool {
    match event {
        CellEvent::KeyPress(key) if key.key == Key::Escape => {
            if flags.focused && area.area_base().is_editing() {
                area.stop_editing(true);
                return true;
            }
            false
        }
        CellEvent::ButtonPress(button) if button.button == MouseButton::Left => {
            if !cell_area.contains_inclusive(button.position) {
                return false;
            }
            let Some((hit, hit_area)) = area.cell_at_position(
                context,
                widget,
                cell_area,
                button.position.x,
                button.position.y,
            ) else {
                return false;
            };
            let holder = area.focus_from_sibling(&hit).unwrap_or_else(|| Arc::clone(&hit));

            if area.area_base().is_editing() {
                // One click cancels the edit and moves focus; it does not
                // also activate.
                area.stop_editing(true);
                area.set_focus_cell(Some(&holder));
                return true;
            }

            let holder_area = if same_renderer(&holder, &hit) {
                hit_area
            } else {
                area.cell_allocation(context, widget, &holder, cell_area)
                    .unwrap_or(hit_area)
            };
            area.set_focus_cell(Some(&holder));
            area.activate_cell(widget, &holder, Some(event), holder_area, flags)
        }
        _ => false,
    }
}

/// Render each cell inside the widget padding and stroke one focus
/// rectangle around the focused cell and its siblings.
#[allow(clippy::too_many_arguments)]
pub fn default_render<A: CellArea + ?Sized>(
    area: &A,
    context: &dyn CellAreaContext,
    widget: &dyn HostWidget,
    target: &mut dyn RenderTarget,
    background: Rect,
    cell_area: Rect,
    flags: CellState,
    paint_focus: bool,
) {
    let _perf = PerfSpan::new(span_names::RENDER);
    let base = area.area_base();
    let paint_focus = paint_focus && !base.is_editing() && widget.has_visible_focus();
    let focus_all = flags.focused && paint_focus && !area.is_activatable();

    let focus_group: Vec<CellRendererRef> = match base.focus_cell() {
        Some(focus) => {
            let mut group = area.focus_siblings(&focus);
            group.insert(0, focus);
            group
        }
        None => Vec::new(),
    };

    let mut focus_rect = Rect::ZERO;
    area.foreach_cell_alloc(context, widget, cell_area, background, &mut |renderer, cell, cell_background| {
        let inner = area.inner_cell_area(widget, cell);
        let in_focus = focus_all || focus_group.iter().any(|r| same_renderer(r, renderer));
        if flags.focused && in_focus {
            focus_rect = focus_rect.union(&renderer.aligned_area(widget, flags, inner));
        }
        renderer.render(&mut *target, widget, cell_background, inner, flags);
        false
    });

    if paint_focus && !focus_rect.is_empty() {
        target.save();
        target.clip_rect(background);
        target.draw_focus(focus_rect);
        target.restore();
    }
}

/// Activate the focus cell, or the first suitable cell when the focus cell
/// cannot be activated.
pub fn default_activate<A: CellArea + ?Sized>(
    area: &A,
    context: &dyn CellAreaContext,
    widget: &dyn HostWidget,
    cell_area: Rect,
    flags: CellState,
    edit_only: bool,
) -> bool {
    let suitable = |renderer: &CellRendererRef| {
        renderer.is_visible()
            && if edit_only {
                renderer.mode() == CellRendererMode::Editable
            } else {
                renderer.can_activate()
            }
    };

    let target = area
        .area_base()
        .focus_cell()
        .filter(|focus| suitable(focus))
        .or_else(|| area.cells().into_iter().find(|renderer| suitable(renderer)));
    let Some(renderer) = target else {
        tracing::trace!(target: targets::AREA, edit_only, "no cell to activate");
        return false;
    };

    let Some(allocation) = area.cell_allocation(context, widget, &renderer, cell_area) else {
        return false;
    };
    area.activate_cell(widget, &renderer, None, allocation, flags)
}

pub(crate) fn start_cell_edit<A: CellArea + ?Sized>(
    area: &A,
    widget: &dyn HostWidget,
    renderer: &CellRendererRef,
    event: Option<&CellEvent>,
    cell_area: Rect,
    flags: CellState,
) -> bool {
    let base = area.area_base();
    let path = base.current_path().unwrap_or_default();
    let inner = area.inner_cell_area(widget, cell_area);
    let Some(editable) = renderer.start_editing(event, widget, &path, inner, inner, flags) else {
        return false;
    };

    base.begin_edit(renderer, &editable);
    tracing::debug!(target: targets::EDITING, renderer = ?renderer.id(), path = %path, "editing started");
    base.add_editable.emit(EditableAdded {
        renderer: Arc::clone(renderer),
        editable: Arc::clone(&editable),
        cell_area,
        path,
    });

    if editable.is_parented() {
        editable.start_editing(event);
        editable.grab_focus();
    } else {
        base.end_edit();
        renderer.stop_editing(true);
        tracing::warn!(target: targets::EDITING, err = %CellAreaError::EditableNotParented, "no cell editing was started");
    }
    true
}

pub(crate) fn apply_row<A: CellArea + ?Sized>(
    area: &A,
    model: &dyn TreeModel,
    iter: &TreeIter,
    is_expander: bool,
    is_expanded: bool,
) -> CellAreaResult<()> {
    let base = area.area_base();
    let Some(_guard) = base.enter_apply() else {
        let err = CellAreaError::ReentrantApply;
        tracing::warn!(target: targets::ATTRIBUTES, %err, "apply_attributes skipped");
        return Err(err);
    };
    let _perf = PerfSpan::new(span_names::APPLY_ATTRIBUTES);

    area.on_apply_attributes(model, iter, is_expander, is_expanded);
    let path = model.path(iter);
    // Observers of `attributes_applied` read the new row's path.
    base.set_current_path(path.as_ref().map(|path| path.to_string()));
    base.attributes_applied.emit(AppliedRow {
        iter: *iter,
        path,
        is_expander,
        is_expanded,
    });
    Ok(())
}

/// Convert a cell property value and hand it to the class hook.
pub(crate) fn store_cell_property<A: CellArea + ?Sized>(
    area: &A,
    renderer: &CellRendererRef,
    spec: &super::CellPropertySpec,
    value: &Value,
) -> CellAreaResult<()> {
    if !spec.flags().writable {
        return Err(CellAreaError::CellPropertyNotWritable(spec.name()));
    }
    let value = spec.coerce(value)?;
    area.write_cell_property(renderer, spec, &value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::CellAreaBox;
    use crate::editable::EntryEditable;
    use crate::model::ListStore;
    use crate::renderer::CellRendererText;
    use trellis_core::ValueType;

    #[test]
    fn test_sibling_edges() {
        let area = CellAreaBox::new();
        let base = area.area_base();
        let holder: CellRendererRef = CellRendererText::new();
        let a: CellRendererRef = CellRendererText::new();
        let b: CellRendererRef = CellRendererText::new();

        base.link_sibling(&holder, &a).unwrap();
        base.link_sibling(&holder, &b).unwrap();
        assert!(matches!(
            base.link_sibling(&b, &a),
            Err(CellAreaError::AlreadySibling(_))
        ));
        assert_eq!(base.siblings_of(&holder).len(), 2);
        assert!(same_renderer(&base.holder_of(&b).unwrap(), &holder));

        assert!(base.unlink_sibling(&holder, &a));
        assert!(!base.unlink_sibling(&holder, &a));
        base.forget_renderer(&holder);
        assert!(base.holder_of(&b).is_none());
    }

    #[test]
    fn test_remove_widget_clears_state_before_emitting() {
        let area = CellAreaBox::new();
        let renderer: CellRendererRef = CellRendererText::new();
        let entry = EntryEditable::new("");
        let editable: CellEditableRef = entry.clone();

        let weak = Arc::downgrade(&area);
        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_clone = observed.clone();
        area.area_base().remove_editable.connect(move |_| {
            let area = weak.upgrade().unwrap();
            observed_clone.lock().push(area.area_base().is_editing());
        });

        area.area_base().begin_edit(&renderer, &editable);
        assert!(area.area_base().is_editing());
        entry.remove_widget();
        entry.remove_widget();
        assert_eq!(*observed.lock(), vec![false]);
        assert!(area.area_base().edit_widget().is_none());
    }

    #[test]
    fn test_reentrant_apply_guard() {
        let area = CellAreaBox::new();
        let base = area.area_base();
        let guard = base.enter_apply();
        assert!(guard.is_some());
        assert!(base.enter_apply().is_none());
        drop(guard);
        assert!(base.enter_apply().is_some());
    }

    #[test]
    fn test_applied_observers_see_new_path() {
        let store = ListStore::new(&[ValueType::String]);
        let first = store.append(vec![Value::from("a")]).unwrap();
        let second = store.append(vec![Value::from("b")]).unwrap();
        let area = CellAreaBox::new();

        let weak = Arc::downgrade(&area);
        let paths = Arc::new(Mutex::new(Vec::new()));
        let paths_clone = paths.clone();
        area.area_base().attributes_applied.connect(move |_| {
            let area = weak.upgrade().unwrap();
            paths_clone.lock().push(area.current_path_string());
        });

        area.apply_attributes(&store, &first, false, false).unwrap();
        area.apply_attributes(&store, &second, false, false).unwrap();
        assert_eq!(
            *paths.lock(),
            vec![Some("0".to_string()), Some("1".to_string())]
        );
    }
}

//! Cell renderers.
//!
//! A cell renderer draws one piece of row data and optionally reacts to
//! activation or in-place editing. Renderers are shared: one instance is
//! reused for every row of a view, and its properties are rewritten per row
//! by [`CellAreaExt::apply_attributes`](crate::area::CellAreaExt::apply_attributes).
//!
//! # Architecture
//!
//! - [`CellRenderer`]: the hooks a concrete renderer implements
//! - [`CellRendererBase`]: shared state every renderer embeds (visibility,
//!   mode, alignment, padding, fixed size, expander flags, notify queue)
//! - [`CellRendererExt`]: the public API, layered over the hooks
//!
//! # Property Bag
//!
//! Besides typed accessors, renderers expose a runtime-typed property bag.
//! Writes go through [`Value::transform`], so binding an `Int` model column
//! to a `Bool` property works the way it would for a native write:
//!
//! ```
//! use trellis::renderer::{CellRenderer, CellRendererExt, CellRendererText};
//! use trellis_core::Value;
//!
//! let cell = CellRendererText::new();
//! cell.set_property("visible", Value::Int(0)).unwrap();
//! assert!(!cell.renderer_base().is_visible());
//! assert!(cell.set_property("no-such-thing", Value::Bool(true)).is_err());
//! ```

mod text;
mod toggle;

pub use text::{CellRendererText, TextMetrics};
pub use toggle::CellRendererToggle;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use trellis_core::logging::targets;
use trellis_core::{Property, PropertyError, PropertyInfo, Signal, Value, ValueType};
use trellis_render::{Color, PaintState, Rect, RenderTarget};

use crate::editable::CellEditableRef;
use crate::events::CellEvent;
use crate::host::HostWidget;
use crate::state::{CellRendererMode, CellState, SizeRequestMode, TextDirection};

/// A shared handle to a renderer.
pub type CellRendererRef = Arc<dyn CellRenderer>;

static NEXT_RENDERER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a renderer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(u64);

impl RendererId {
    fn next() -> Self {
        Self(NEXT_RENDERER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RendererId({})", self.0)
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Properties every renderer carries.
pub const BASE_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("visible", ValueType::Bool),
    PropertyInfo::new("sensitive", ValueType::Bool),
    PropertyInfo::new("mode", ValueType::Int),
    PropertyInfo::new("xalign", ValueType::Float),
    PropertyInfo::new("yalign", ValueType::Float),
    PropertyInfo::new("xpad", ValueType::UInt),
    PropertyInfo::new("ypad", ValueType::UInt),
    PropertyInfo::new("width", ValueType::Int),
    PropertyInfo::new("height", ValueType::Int),
    PropertyInfo::new("is-expander", ValueType::Bool),
    PropertyInfo::new("is-expanded", ValueType::Bool),
    PropertyInfo::new("cell-background", ValueType::String),
    PropertyInfo::read_only("editing", ValueType::Bool),
];

#[derive(Default)]
struct NotifyQueue {
    depth: u32,
    pending: Vec<&'static str>,
}

/// State shared by all renderers.
pub struct CellRendererBase {
    id: RendererId,
    type_name: &'static str,
    visible: Property<bool>,
    sensitive: Property<bool>,
    mode: Property<CellRendererMode>,
    xalign: Property<f32>,
    yalign: Property<f32>,
    xpad: Property<u32>,
    ypad: Property<u32>,
    width: Property<i32>,
    height: Property<i32>,
    is_expander: Property<bool>,
    is_expanded: Property<bool>,
    /// `#rrggbb` or `#rrggbbaa`; empty for none.
    cell_background: Property<String>,
    editing: Property<bool>,
    notify_queue: Mutex<NotifyQueue>,

    /// Emitted with the canonical name of every property that changed.
    pub notify: Signal<&'static str>,
    /// Emitted when editing starts, with the edit widget and the row path.
    pub editing_started: Signal<(CellEditableRef, String)>,
    /// Emitted when an edit is stopped with `canceled = true`.
    pub editing_canceled: Signal<()>,
}

impl CellRendererBase {
    /// Create a visible, sensitive, inert base with centered alignment.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            id: RendererId::next(),
            type_name,
            visible: Property::new(true),
            sensitive: Property::new(true),
            mode: Property::new(CellRendererMode::Inert),
            xalign: Property::new(0.5),
            yalign: Property::new(0.5),
            xpad: Property::new(0),
            ypad: Property::new(0),
            width: Property::new(-1),
            height: Property::new(-1),
            is_expander: Property::new(false),
            is_expanded: Property::new(false),
            cell_background: Property::new(String::new()),
            editing: Property::new(false),
            notify_queue: Mutex::new(NotifyQueue::default()),
            notify: Signal::new(),
            editing_started: Signal::new(),
            editing_canceled: Signal::new(),
        }
    }

    /// Builder-style alignment, used by concrete renderers at construction.
    pub fn with_alignment(self, xalign: f32, yalign: f32) -> Self {
        self.xalign.set_silent(xalign);
        self.yalign.set_silent(yalign);
        self
    }

    /// Builder-style padding.
    pub fn with_padding(self, xpad: u32, ypad: u32) -> Self {
        self.xpad.set_silent(xpad);
        self.ypad.set_silent(ypad);
        self
    }

    /// Builder-style mode.
    pub fn with_mode(self, mode: CellRendererMode) -> Self {
        self.mode.set_silent(mode);
        self
    }

    pub fn id(&self) -> RendererId {
        self.id
    }

    /// Name of the concrete renderer type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.notify_if(self.visible.set(visible), "visible");
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive.get()
    }

    pub fn set_sensitive(&self, sensitive: bool) {
        self.notify_if(self.sensitive.set(sensitive), "sensitive");
    }

    pub fn mode(&self) -> CellRendererMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: CellRendererMode) {
        self.notify_if(self.mode.set(mode), "mode");
    }

    /// Horizontal and vertical alignment, each in `0.0..=1.0`.
    pub fn alignment(&self) -> (f32, f32) {
        (self.xalign.get(), self.yalign.get())
    }

    pub fn set_alignment(&self, xalign: f32, yalign: f32) {
        let xalign = xalign.clamp(0.0, 1.0);
        let yalign = yalign.clamp(0.0, 1.0);
        self.freeze_notify();
        self.notify_if(self.xalign.set(xalign), "xalign");
        self.notify_if(self.yalign.set(yalign), "yalign");
        self.thaw_notify();
    }

    /// Horizontal and vertical padding.
    pub fn padding(&self) -> (u32, u32) {
        (self.xpad.get(), self.ypad.get())
    }

    pub fn set_padding(&self, xpad: u32, ypad: u32) {
        self.freeze_notify();
        self.notify_if(self.xpad.set(xpad), "xpad");
        self.notify_if(self.ypad.set(ypad), "ypad");
        self.thaw_notify();
    }

    /// Fixed width and height; `-1` means the dimension is measured.
    pub fn fixed_size(&self) -> (i32, i32) {
        (self.width.get(), self.height.get())
    }

    pub fn set_fixed_size(&self, width: i32, height: i32) {
        self.freeze_notify();
        self.notify_if(self.width.set(width.max(-1)), "width");
        self.notify_if(self.height.set(height.max(-1)), "height");
        self.thaw_notify();
    }

    pub fn is_expander(&self) -> bool {
        self.is_expander.get()
    }

    pub fn set_is_expander(&self, is_expander: bool) {
        self.notify_if(self.is_expander.set(is_expander), "is-expander");
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded.get()
    }

    pub fn set_is_expanded(&self, is_expanded: bool) {
        self.notify_if(self.is_expanded.set(is_expanded), "is-expanded");
    }

    /// Fill color painted under the cell, if one is set.
    pub fn cell_background(&self) -> Option<Color> {
        self.cell_background.with(|hex| Color::from_hex(hex))
    }

    /// Set the fill color from `#rrggbb` or `#rrggbbaa`. An empty string
    /// clears it. Returns `false` for an unparsable color.
    pub fn set_cell_background(&self, hex: &str) -> bool {
        if !hex.is_empty() && Color::from_hex(hex).is_none() {
            return false;
        }
        self.notify_if(self.cell_background.set(hex.to_string()), "cell-background");
        true
    }

    /// Whether an edit widget currently stands in for this renderer.
    pub fn is_editing(&self) -> bool {
        self.editing.get()
    }

    fn set_editing(&self, editing: bool) {
        self.notify_if(self.editing.set(editing), "editing");
    }

    /// Suspend `notify` emission. Calls nest.
    pub fn freeze_notify(&self) {
        self.notify_queue.lock().depth += 1;
    }

    /// Resume `notify` emission. Notifications queued while frozen are
    /// delivered once each when the outermost freeze is released.
    pub fn thaw_notify(&self) {
        let pending = {
            let mut queue = self.notify_queue.lock();
            if queue.depth == 0 {
                tracing::warn!(
                    target: targets::RENDERER,
                    renderer = ?self.id,
                    "thaw_notify called without a matching freeze_notify"
                );
                return;
            }
            queue.depth -= 1;
            if queue.depth > 0 {
                return;
            }
            std::mem::take(&mut queue.pending)
        };
        for name in pending {
            self.notify.emit(name);
        }
    }

    /// Report a property change, honouring any freeze in effect.
    pub fn notify_property(&self, name: &'static str) {
        {
            let mut queue = self.notify_queue.lock();
            if queue.depth > 0 {
                if !queue.pending.contains(&name) {
                    queue.pending.push(name);
                }
                return;
            }
        }
        self.notify.emit(name);
    }

    /// Call [`notify_property`](Self::notify_property) if `changed`.
    pub fn notify_if(&self, changed: bool, name: &'static str) {
        if changed {
            self.notify_property(name);
        }
    }

    fn set_base_property(&self, name: &'static str, value: &Value) -> Result<bool, PropertyError> {
        let invalid = |reason: &str| PropertyError::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let changed = match name {
            "visible" => self.visible.set(value.as_bool().ok_or_else(|| invalid("expected bool"))?),
            "sensitive" => self
                .sensitive
                .set(value.as_bool().ok_or_else(|| invalid("expected bool"))?),
            "mode" => self
                .mode
                .set(CellRendererMode::from_value(value).ok_or_else(|| invalid("unknown mode"))?),
            "xalign" | "yalign" => {
                let align = value.as_float().ok_or_else(|| invalid("expected float"))?;
                if !(0.0..=1.0).contains(&align) {
                    return Err(invalid("alignment must be within 0.0..=1.0"));
                }
                if name == "xalign" {
                    self.xalign.set(align as f32)
                } else {
                    self.yalign.set(align as f32)
                }
            }
            "xpad" => self.xpad.set(value.as_uint().ok_or_else(|| invalid("expected uint"))?),
            "ypad" => self.ypad.set(value.as_uint().ok_or_else(|| invalid("expected uint"))?),
            "width" | "height" => {
                let size = value.as_int().ok_or_else(|| invalid("expected int"))?;
                if size < -1 {
                    return Err(invalid("fixed size must be -1 or larger"));
                }
                if name == "width" {
                    self.width.set(size)
                } else {
                    self.height.set(size)
                }
            }
            "is-expander" => self
                .is_expander
                .set(value.as_bool().ok_or_else(|| invalid("expected bool"))?),
            "is-expanded" => self
                .is_expanded
                .set(value.as_bool().ok_or_else(|| invalid("expected bool"))?),
            "cell-background" => {
                let hex = value.as_str().ok_or_else(|| invalid("expected string"))?;
                if !hex.is_empty() && Color::from_hex(hex).is_none() {
                    return Err(invalid("expected #rrggbb or #rrggbbaa"));
                }
                self.cell_background.set(hex.to_string())
            }
            _ => {
                return Err(PropertyError::NotFound {
                    name: name.to_string(),
                });
            }
        };
        Ok(changed)
    }

    fn base_property(&self, name: &str) -> Option<Value> {
        Some(match name {
            "visible" => Value::Bool(self.is_visible()),
            "sensitive" => Value::Bool(self.is_sensitive()),
            "mode" => Value::from(self.mode()),
            "xalign" => Value::from(self.xalign.get()),
            "yalign" => Value::from(self.yalign.get()),
            "xpad" => Value::UInt(self.xpad.get()),
            "ypad" => Value::UInt(self.ypad.get()),
            "width" => Value::Int(self.width.get()),
            "height" => Value::Int(self.height.get()),
            "is-expander" => Value::Bool(self.is_expander()),
            "is-expanded" => Value::Bool(self.is_expanded()),
            "cell-background" => Value::String(self.cell_background.get()),
            "editing" => Value::Bool(self.is_editing()),
            _ => return None,
        })
    }
}

impl fmt::Debug for CellRendererBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRendererBase")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("visible", &self.is_visible())
            .field("mode", &self.mode())
            .finish()
    }
}

/// The hooks implemented by a concrete renderer.
///
/// Most callers should use [`CellRendererExt`], which adds fixed-size
/// overrides, mode checks and editing bookkeeping around these hooks.
pub trait CellRenderer: Send + Sync {
    // =========================================================================
    // Required Methods
    // =========================================================================

    /// The shared base state.
    fn renderer_base(&self) -> &CellRendererBase;

    /// Minimum and natural width.
    fn measure_width(&self, widget: &dyn HostWidget) -> (i32, i32);

    /// Minimum and natural height.
    fn measure_height(&self, widget: &dyn HostWidget) -> (i32, i32);

    /// Draw the cell. `cell` is the area inside the widget padding.
    fn paint(
        &self,
        target: &mut dyn RenderTarget,
        widget: &dyn HostWidget,
        background: Rect,
        cell: Rect,
        flags: CellState,
    );

    // =========================================================================
    // Optional Hooks
    // =========================================================================

    /// Properties beyond [`BASE_PROPERTIES`].
    fn own_properties(&self) -> &'static [PropertyInfo] {
        &[]
    }

    /// Write one of [`own_properties`](Self::own_properties). The value has
    /// already been transformed to the declared type. Returns whether the
    /// stored value changed; the caller emits the notification.
    fn set_own_property(&self, name: &'static str, _value: &Value) -> Result<bool, PropertyError> {
        Err(PropertyError::NotFound {
            name: name.to_string(),
        })
    }

    /// Read one of [`own_properties`](Self::own_properties).
    fn own_property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn request_mode(&self) -> SizeRequestMode {
        SizeRequestMode::HeightForWidth
    }

    fn measure_height_for_width(&self, widget: &dyn HostWidget, _width: i32) -> (i32, i32) {
        self.measure_height(widget)
    }

    fn measure_width_for_height(&self, widget: &dyn HostWidget, _height: i32) -> (i32, i32) {
        self.measure_width(widget)
    }

    /// Handle activation. Only called in [`CellRendererMode::Activatable`].
    fn on_activate(
        &self,
        _event: Option<&CellEvent>,
        _widget: &dyn HostWidget,
        _path: &str,
        _background: Rect,
        _cell: Rect,
        _flags: CellState,
    ) -> bool {
        false
    }

    /// Produce an edit widget. Only called in [`CellRendererMode::Editable`].
    fn on_start_editing(
        &self,
        _event: Option<&CellEvent>,
        _widget: &dyn HostWidget,
        _path: &str,
        _background: Rect,
        _cell: Rect,
        _flags: CellState,
    ) -> Option<CellEditableRef> {
        None
    }
}

/// Public renderer API. Implemented for every [`CellRenderer`].
pub trait CellRendererExt: CellRenderer {
    fn id(&self) -> RendererId {
        self.renderer_base().id()
    }

    /// Every property this renderer understands, base properties first.
    fn list_properties(&self) -> Vec<PropertyInfo> {
        BASE_PROPERTIES
            .iter()
            .chain(self.own_properties())
            .copied()
            .collect()
    }

    /// Look up a property descriptor by name.
    fn find_property(&self, name: &str) -> Option<PropertyInfo> {
        BASE_PROPERTIES
            .iter()
            .chain(self.own_properties())
            .find(|info| info.name == name)
            .copied()
    }

    fn has_property(&self, name: &str) -> bool {
        self.find_property(name).is_some()
    }

    fn property_type(&self, name: &str) -> Option<ValueType> {
        self.find_property(name).map(|info| info.value_type)
    }

    /// Write a property by name.
    ///
    /// The value is transformed to the declared type first. A `notify` is
    /// emitted only when the stored value actually changes.
    fn set_property(&self, name: &str, value: Value) -> Result<(), PropertyError> {
        let info = self.find_property(name).ok_or_else(|| PropertyError::NotFound {
            name: name.to_string(),
        })?;
        if info.read_only {
            return Err(PropertyError::ReadOnly {
                name: info.name.to_string(),
            });
        }
        let value = value
            .transform(info.value_type)
            .map_err(|_| PropertyError::TypeMismatch {
                name: info.name.to_string(),
                expected: info.value_type,
                got: value.value_type(),
            })?;

        let base = self.renderer_base();
        let changed = if BASE_PROPERTIES.iter().any(|p| p.name == info.name) {
            base.set_base_property(info.name, &value)?
        } else {
            self.set_own_property(info.name, &value)?
        };
        base.notify_if(changed, info.name);
        Ok(())
    }

    /// Read a property by name.
    fn property(&self, name: &str) -> Option<Value> {
        self.renderer_base()
            .base_property(name)
            .or_else(|| self.own_property(name))
    }

    fn freeze_notify(&self) {
        self.renderer_base().freeze_notify();
    }

    fn thaw_notify(&self) {
        self.renderer_base().thaw_notify();
    }

    /// Minimum and natural width, honouring a fixed width.
    fn preferred_width(&self, widget: &dyn HostWidget) -> (i32, i32) {
        match self.renderer_base().fixed_size() {
            (width, _) if width >= 0 => (width, width),
            _ => self.measure_width(widget),
        }
    }

    /// Minimum and natural height, honouring a fixed height.
    fn preferred_height(&self, widget: &dyn HostWidget) -> (i32, i32) {
        match self.renderer_base().fixed_size() {
            (_, height) if height >= 0 => (height, height),
            _ => self.measure_height(widget),
        }
    }

    fn preferred_height_for_width(&self, widget: &dyn HostWidget, width: i32) -> (i32, i32) {
        match self.renderer_base().fixed_size() {
            (_, height) if height >= 0 => (height, height),
            _ => self.measure_height_for_width(widget, width),
        }
    }

    fn preferred_width_for_height(&self, widget: &dyn HostWidget, height: i32) -> (i32, i32) {
        match self.renderer_base().fixed_size() {
            (width, _) if width >= 0 => (width, width),
            _ => self.measure_width_for_height(widget, height),
        }
    }

    /// Minimum and natural size in both dimensions.
    fn preferred_size(&self, widget: &dyn HostWidget) -> ((i32, i32), (i32, i32)) {
        match self.request_mode() {
            SizeRequestMode::WidthForHeight => {
                let height = self.preferred_height(widget);
                let min_width = self.preferred_width_for_height(widget, height.0).0;
                let nat_width = self.preferred_width_for_height(widget, height.1).1;
                ((min_width, nat_width), height)
            }
            _ => {
                let width = self.preferred_width(widget);
                let min_height = self.preferred_height_for_width(widget, width.0).0;
                let nat_height = self.preferred_height_for_width(widget, width.1).1;
                (width, (min_height, nat_height))
            }
        }
    }

    /// The part of `cell` the renderer actually draws into.
    ///
    /// The area is trimmed to the natural size and placed according to the
    /// alignment, mirrored horizontally for right-to-left hosts.
    fn aligned_area(&self, widget: &dyn HostWidget, _flags: CellState, cell: Rect) -> Rect {
        let mut aligned = cell;
        if self.request_mode() == SizeRequestMode::WidthForHeight {
            let (_, natural) = self.preferred_height(widget);
            aligned.size.height = aligned.height().min(natural);
            let (_, opposite) = self.preferred_width_for_height(widget, aligned.height());
            aligned.size.width = aligned.width().min(opposite);
        } else {
            let (_, natural) = self.preferred_width(widget);
            aligned.size.width = aligned.width().min(natural);
            let (_, opposite) = self.preferred_height_for_width(widget, aligned.width());
            aligned.size.height = aligned.height().min(opposite);
        }

        let (xalign, yalign) = self.renderer_base().alignment();
        let xalign = match widget.text_direction() {
            TextDirection::Rtl => 1.0 - xalign,
            TextDirection::Ltr => xalign,
        };
        let x_offset = ((xalign * (cell.width() - aligned.width()) as f32) as i32).max(0);
        let y_offset = ((yalign * (cell.height() - aligned.height()) as f32) as i32).max(0);
        aligned.offset(x_offset, y_offset)
    }

    /// Visual state derived from the renderer, the host and the row flags.
    fn state_flags(&self, widget: &dyn HostWidget, flags: CellState) -> PaintState {
        PaintState {
            insensitive: flags.insensitive
                || !self.renderer_base().is_sensitive()
                || !widget.is_sensitive(),
            selected: flags.selected,
            prelight: flags.prelit,
            focused: flags.focused && widget.has_focus(),
        }
    }

    /// Draw the cell, clipped to the background area. A cell background
    /// color is filled first unless the row is selected.
    fn render(
        &self,
        target: &mut dyn RenderTarget,
        widget: &dyn HostWidget,
        background: Rect,
        cell: Rect,
        flags: CellState,
    ) {
        target.save();
        target.clip_rect(background);
        if !flags.selected
            && let Some(color) = self.renderer_base().cell_background()
        {
            target.fill_rect(background, color);
        }
        self.paint(target, widget, background, cell, flags);
        target.restore();
    }

    /// Activate the cell. Returns `false` unless the renderer is activatable
    /// and handled the activation.
    fn activate(
        &self,
        event: Option<&CellEvent>,
        widget: &dyn HostWidget,
        path: &str,
        background: Rect,
        cell: Rect,
        flags: CellState,
    ) -> bool {
        if self.renderer_base().mode() != CellRendererMode::Activatable {
            return false;
        }
        self.on_activate(event, widget, path, background, cell, flags)
    }

    /// Begin editing. Returns the edit widget on success.
    fn start_editing(
        &self,
        event: Option<&CellEvent>,
        widget: &dyn HostWidget,
        path: &str,
        background: Rect,
        cell: Rect,
        flags: CellState,
    ) -> Option<CellEditableRef> {
        let base = self.renderer_base();
        if base.mode() != CellRendererMode::Editable {
            return None;
        }
        let editable = self.on_start_editing(event, widget, path, background, cell, flags)?;
        tracing::debug!(target: targets::EDITING, renderer = ?base.id(), path, "renderer started editing");
        base.editing_started.emit((Arc::clone(&editable), path.to_string()));
        base.set_editing(true);
        Some(editable)
    }

    /// Leave the editing state. `editing_canceled` fires only if editing was
    /// in progress and `canceled` is set.
    fn stop_editing(&self, canceled: bool) {
        let base = self.renderer_base();
        if !base.is_editing() {
            return;
        }
        base.set_editing(false);
        tracing::debug!(target: targets::EDITING, renderer = ?base.id(), canceled, "renderer stopped editing");
        if canceled {
            base.editing_canceled.emit(());
        }
    }

    fn is_visible(&self) -> bool {
        self.renderer_base().is_visible()
    }

    fn mode(&self) -> CellRendererMode {
        self.renderer_base().mode()
    }

    /// Whether activating this cell would do something.
    fn can_activate(&self) -> bool {
        self.mode() != CellRendererMode::Inert
    }
}

impl<T: CellRenderer + ?Sized> CellRendererExt for T {}

/// Compare renderer handles by identity.
pub fn same_renderer(a: &CellRendererRef, b: &CellRendererRef) -> bool {
    a.renderer_base().id() == b.renderer_base().id()
}

static_assertions::assert_impl_all!(CellRendererBase: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use std::sync::atomic::AtomicUsize;

    struct Fixed {
        base: CellRendererBase,
        size: (i32, i32),
    }

    impl Fixed {
        fn new(width: i32, height: i32) -> Self {
            Self {
                base: CellRendererBase::new("Fixed"),
                size: (width, height),
            }
        }
    }

    impl CellRenderer for Fixed {
        fn renderer_base(&self) -> &CellRendererBase {
            &self.base
        }

        fn measure_width(&self, _widget: &dyn HostWidget) -> (i32, i32) {
            (self.size.0 / 2, self.size.0)
        }

        fn measure_height(&self, _widget: &dyn HostWidget) -> (i32, i32) {
            (self.size.1, self.size.1)
        }

        fn paint(
            &self,
            _target: &mut dyn RenderTarget,
            _widget: &dyn HostWidget,
            _background: Rect,
            _cell: Rect,
            _flags: CellState,
        ) {
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Fixed::new(1, 1);
        let b = Fixed::new(1, 1);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_fixed_size_overrides_measure() {
        let host = StaticHost::new();
        let cell = Fixed::new(40, 10);
        assert_eq!(cell.preferred_width(&host), (20, 40));
        cell.renderer_base().set_fixed_size(25, -1);
        assert_eq!(cell.preferred_width(&host), (25, 25));
        assert_eq!(cell.preferred_height(&host), (10, 10));
    }

    #[test]
    fn test_aligned_area_centers_and_mirrors() {
        let host = StaticHost::new();
        let cell = Fixed::new(20, 10);
        let area = Rect::new(0, 0, 100, 30);
        assert_eq!(
            cell.aligned_area(&host, CellState::new(), area),
            Rect::new(40, 10, 20, 10)
        );

        cell.renderer_base().set_alignment(0.0, 0.0);
        assert_eq!(
            cell.aligned_area(&host, CellState::new(), area),
            Rect::new(0, 0, 20, 10)
        );

        let rtl = StaticHost::new().with_direction(TextDirection::Rtl);
        assert_eq!(
            cell.aligned_area(&rtl, CellState::new(), area),
            Rect::new(80, 0, 20, 10)
        );
    }

    #[test]
    fn test_aligned_area_never_offsets_negative() {
        let host = StaticHost::new();
        let cell = Fixed::new(200, 10);
        let area = Rect::new(5, 5, 50, 10);
        assert_eq!(
            cell.aligned_area(&host, CellState::new(), area),
            Rect::new(5, 5, 50, 10)
        );
    }

    #[test]
    fn test_set_property_transforms_and_notifies_once() {
        let cell = Fixed::new(1, 1);
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        cell.renderer_base().notify.connect(move |name| {
            assert_eq!(*name, "xpad");
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        cell.set_property("xpad", Value::Int(3)).unwrap();
        cell.set_property("xpad", Value::Float(3.0)).unwrap();
        assert_eq!(cell.property("xpad"), Some(Value::UInt(3)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_property_errors() {
        let cell = Fixed::new(1, 1);
        assert!(matches!(
            cell.set_property("editing", Value::Bool(true)),
            Err(PropertyError::ReadOnly { .. })
        ));
        assert!(matches!(
            cell.set_property("visible", Value::from("yes")),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            cell.set_property("xalign", Value::Float(2.0)),
            Err(PropertyError::Invalid { .. })
        ));
        assert!(matches!(
            cell.set_property("mode", Value::Int(7)),
            Err(PropertyError::Invalid { .. })
        ));
    }

    #[test]
    fn test_freeze_collapses_notifications() {
        let cell = Fixed::new(1, 1);
        let names = Arc::new(Mutex::new(Vec::new()));
        let names_clone = names.clone();
        cell.renderer_base()
            .notify
            .connect(move |name| names_clone.lock().push(*name));

        cell.freeze_notify();
        cell.freeze_notify();
        cell.renderer_base().set_visible(false);
        cell.renderer_base().set_visible(true);
        cell.renderer_base().set_sensitive(false);
        cell.thaw_notify();
        assert!(names.lock().is_empty());
        cell.thaw_notify();
        assert_eq!(*names.lock(), vec!["visible", "sensitive"]);
    }

    #[test]
    fn test_activate_requires_activatable_mode() {
        let host = StaticHost::new();
        let cell = Fixed::new(1, 1);
        let rect = Rect::new(0, 0, 1, 1);
        assert!(!cell.activate(None, &host, "0", rect, rect, CellState::new()));
        assert!(cell
            .start_editing(None, &host, "0", rect, rect, CellState::new())
            .is_none());
    }

    #[test]
    fn test_stop_editing_without_edit_is_silent() {
        let cell = Fixed::new(1, 1);
        let canceled = Arc::new(AtomicUsize::new(0));
        let canceled_clone = canceled.clone();
        cell.renderer_base().editing_canceled.connect(move |_| {
            canceled_clone.fetch_add(1, Ordering::SeqCst);
        });
        cell.stop_editing(true);
        assert_eq!(canceled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_state_flags_follow_host() {
        let host = StaticHost::new();
        host.set_sensitive(false);
        let cell = Fixed::new(1, 1);
        let state = cell.state_flags(&host, CellState::new().with_selected(true));
        assert!(state.insensitive);
        assert!(state.selected);
    }

    #[test]
    fn test_cell_background_fills_unless_selected() {
        use trellis_render::{DisplayList, DrawCommand};

        let cell = Fixed::new(10, 10);
        assert!(!cell.renderer_base().set_cell_background("plum"));
        cell.set_property("cell-background", Value::from("#ff0000")).unwrap();
        assert_eq!(cell.property("cell-background"), Some(Value::from("#ff0000")));

        let host = StaticHost::new();
        let rect = Rect::new(0, 0, 10, 10);
        let mut list = DisplayList::new();
        cell.render(&mut list, &host, rect, rect, CellState::new());
        assert!(list.commands().contains(&DrawCommand::Fill {
            rect,
            color: Color::new(1.0, 0.0, 0.0, 1.0),
        }));

        let mut selected = DisplayList::new();
        cell.render(&mut selected, &host, rect, rect, CellState::new().with_selected(true));
        assert!(!selected
            .commands()
            .iter()
            .any(|cmd| matches!(cmd, DrawCommand::Fill { .. })));
    }
}

//! Check box and radio cell renderer.

use std::sync::Arc;

use trellis_core::logging::targets;
use trellis_core::{Property, PropertyError, PropertyInfo, Signal, Value, ValueType};
use trellis_render::{CheckMark, Rect, RenderTarget};

use super::{CellRenderer, CellRendererBase, CellRendererExt};
use crate::events::CellEvent;
use crate::host::HostWidget;
use crate::state::{CellRendererMode, CellState};

const TOGGLE_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("active", ValueType::Bool),
    PropertyInfo::new("inconsistent", ValueType::Bool),
    PropertyInfo::new("activatable", ValueType::Bool),
    PropertyInfo::new("radio", ValueType::Bool),
    PropertyInfo::new("indicator-size", ValueType::Int),
];

const DEFAULT_INDICATOR_SIZE: i32 = 16;

/// Renders a check box or radio indicator.
///
/// The renderer does not flip `active` itself. Activation emits
/// [`toggled`](Self::toggled) with the row path and the application updates
/// its model, which flows back through the attribute binding.
pub struct CellRendererToggle {
    base: CellRendererBase,
    active: Property<bool>,
    inconsistent: Property<bool>,
    activatable: Property<bool>,
    radio: Property<bool>,
    indicator_size: Property<i32>,
    /// Emitted with the row path when the toggle is activated.
    pub toggled: Signal<String>,
}

impl CellRendererToggle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: CellRendererBase::new("CellRendererToggle")
                .with_padding(2, 2)
                .with_mode(CellRendererMode::Activatable),
            active: Property::new(false),
            inconsistent: Property::new(false),
            activatable: Property::new(true),
            radio: Property::new(false),
            indicator_size: Property::new(DEFAULT_INDICATOR_SIZE),
            toggled: Signal::new(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn set_active(&self, active: bool) {
        self.base.notify_if(self.active.set(active), "active");
    }

    pub fn set_inconsistent(&self, inconsistent: bool) {
        self.base
            .notify_if(self.inconsistent.set(inconsistent), "inconsistent");
    }

    pub fn is_activatable(&self) -> bool {
        self.activatable.get()
    }

    /// Allow or forbid activation. Also switches the renderer mode.
    pub fn set_activatable(&self, activatable: bool) {
        self.base.freeze_notify();
        let changed = self.apply_activatable(activatable);
        self.base.notify_if(changed, "activatable");
        self.base.thaw_notify();
    }

    fn apply_activatable(&self, activatable: bool) -> bool {
        self.base.set_mode(if activatable {
            CellRendererMode::Activatable
        } else {
            CellRendererMode::Inert
        });
        self.activatable.set(activatable)
    }

    pub fn set_radio(&self, radio: bool) {
        self.base.notify_if(self.radio.set(radio), "radio");
    }

    fn indicator_extent(&self) -> (i32, i32) {
        let (xpad, ypad) = self.base.padding();
        let size = self.indicator_size.get();
        (size + 2 * xpad as i32, size + 2 * ypad as i32)
    }
}

impl CellRenderer for CellRendererToggle {
    fn renderer_base(&self) -> &CellRendererBase {
        &self.base
    }

    fn own_properties(&self) -> &'static [PropertyInfo] {
        TOGGLE_PROPERTIES
    }

    fn set_own_property(&self, name: &'static str, value: &Value) -> Result<bool, PropertyError> {
        let flag = value.as_bool().unwrap_or(false);
        Ok(match name {
            "active" => self.active.set(flag),
            "inconsistent" => self.inconsistent.set(flag),
            "activatable" => self.apply_activatable(flag),
            "radio" => self.radio.set(flag),
            "indicator-size" => {
                let size = value.as_int().unwrap_or(DEFAULT_INDICATOR_SIZE);
                if size < 0 {
                    return Err(PropertyError::Invalid {
                        name: name.to_string(),
                        reason: "indicator size must not be negative".to_string(),
                    });
                }
                self.indicator_size.set(size)
            }
            _ => {
                return Err(PropertyError::NotFound {
                    name: name.to_string(),
                });
            }
        })
    }

    fn own_property(&self, name: &str) -> Option<Value> {
        match name {
            "active" => Some(Value::Bool(self.active.get())),
            "inconsistent" => Some(Value::Bool(self.inconsistent.get())),
            "activatable" => Some(Value::Bool(self.activatable.get())),
            "radio" => Some(Value::Bool(self.radio.get())),
            "indicator-size" => Some(Value::Int(self.indicator_size.get())),
            _ => None,
        }
    }

    fn measure_width(&self, _widget: &dyn HostWidget) -> (i32, i32) {
        let (width, _) = self.indicator_extent();
        (width, width)
    }

    fn measure_height(&self, _widget: &dyn HostWidget) -> (i32, i32) {
        let (_, height) = self.indicator_extent();
        (height, height)
    }

    fn paint(
        &self,
        target: &mut dyn RenderTarget,
        widget: &dyn HostWidget,
        _background: Rect,
        cell: Rect,
        flags: CellState,
    ) {
        let (xpad, ypad) = self.base.padding();
        let area = self
            .aligned_area(widget, flags, cell)
            .offset(xpad as i32, ypad as i32);
        let size = self.indicator_size.get();
        let indicator = Rect::new(area.left(), area.top(), size, size);
        let mut state = self.state_flags(widget, flags);
        if !self.activatable.get() {
            state.insensitive = true;
        }
        let mark = CheckMark {
            active: self.active.get(),
            inconsistent: self.inconsistent.get(),
            radio: self.radio.get(),
        };
        target.draw_check(indicator, mark, state);
    }

    fn on_activate(
        &self,
        _event: Option<&CellEvent>,
        _widget: &dyn HostWidget,
        path: &str,
        _background: Rect,
        _cell: Rect,
        _flags: CellState,
    ) -> bool {
        if !self.activatable.get() {
            return false;
        }
        tracing::debug!(target: targets::RENDERER, renderer = ?self.base.id(), path, "toggled");
        self.toggled.emit(path.to_string());
        true
    }
}

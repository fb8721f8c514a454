//! Text cell renderer.

use std::sync::{Arc, Weak};

use trellis_core::logging::targets;
use trellis_core::{Property, PropertyError, PropertyInfo, Signal, Value, ValueType};
use trellis_render::{Border, PaintState, Rect, RenderTarget};

use super::{CellRenderer, CellRendererBase, CellRendererExt};
use crate::editable::{CellEditable, CellEditableExt, CellEditableRef, EntryEditable};
use crate::events::CellEvent;
use crate::host::HostWidget;
use crate::state::{CellRendererMode, CellState};

const TEXT_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("text", ValueType::String),
    PropertyInfo::new("editable", ValueType::Bool),
    PropertyInfo::new("placeholder-text", ValueType::String),
    PropertyInfo::new("ellipsize", ValueType::Bool),
];

/// Fixed-pitch metrics used to estimate text extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    /// Advance of one character.
    pub char_width: i32,
    /// Height of one line.
    pub line_height: i32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8,
            line_height: 16,
        }
    }
}

impl TextMetrics {
    pub fn new(char_width: i32, line_height: i32) -> Self {
        Self {
            char_width,
            line_height,
        }
    }

    /// Width of `text` in pixels.
    pub fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.char_width
    }
}

/// Renders a single line of text and optionally edits it in place.
///
/// ```
/// use trellis::renderer::{CellRendererExt, CellRendererText, TextMetrics};
/// use trellis::StaticHost;
///
/// let cell = CellRendererText::with_metrics(TextMetrics::new(10, 20));
/// cell.set_text("hello");
/// // 5 characters plus 2px of padding on each side.
/// assert_eq!(cell.preferred_width(&StaticHost::new()), (54, 54));
/// ```
pub struct CellRendererText {
    base: CellRendererBase,
    this: Weak<CellRendererText>,
    metrics: TextMetrics,
    text: Property<String>,
    placeholder: Property<String>,
    editable: Property<bool>,
    ellipsize: Property<bool>,
    /// Emitted with `(path, new_text)` when an edit is committed.
    pub edited: Signal<(String, String)>,
}

impl CellRendererText {
    pub fn new() -> Arc<Self> {
        Self::with_metrics(TextMetrics::default())
    }

    pub fn with_metrics(metrics: TextMetrics) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            base: CellRendererBase::new("CellRendererText")
                .with_alignment(0.0, 0.5)
                .with_padding(2, 2),
            this: this.clone(),
            metrics,
            text: Property::new(String::new()),
            placeholder: Property::new(String::new()),
            editable: Property::new(false),
            ellipsize: Property::new(false),
            edited: Signal::new(),
        })
    }

    pub fn text(&self) -> String {
        self.text.get()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let changed = self.text.set(text.into());
        self.base.notify_if(changed, "text");
    }

    pub fn is_editable(&self) -> bool {
        self.editable.get()
    }

    /// Make the cell editable. Also switches the renderer mode.
    pub fn set_editable(&self, editable: bool) {
        self.base.freeze_notify();
        let changed = self.apply_editable(editable);
        self.base.notify_if(changed, "editable");
        self.base.thaw_notify();
    }

    fn apply_editable(&self, editable: bool) -> bool {
        self.base.set_mode(if editable {
            CellRendererMode::Editable
        } else {
            CellRendererMode::Inert
        });
        self.editable.set(editable)
    }

    pub fn set_placeholder_text(&self, text: impl Into<String>) {
        let changed = self.placeholder.set(text.into());
        self.base.notify_if(changed, "placeholder-text");
    }

    /// When set, the minimum width shrinks to a few characters.
    pub fn set_ellipsize(&self, ellipsize: bool) {
        self.base.notify_if(self.ellipsize.set(ellipsize), "ellipsize");
    }

    fn padding_border(&self) -> Border {
        let (xpad, ypad) = self.base.padding();
        Border {
            left: xpad as i32,
            right: xpad as i32,
            top: ypad as i32,
            bottom: ypad as i32,
        }
    }

    fn on_entry_done(&self, entry: &EntryEditable, path: &str) {
        let canceled = entry.editing_canceled();
        self.stop_editing(canceled);
        if canceled {
            return;
        }
        let new_text = entry.text();
        tracing::debug!(target: targets::EDITING, path, new_text = %new_text, "text edited");
        self.edited.emit((path.to_string(), new_text));
    }
}

impl CellRenderer for CellRendererText {
    fn renderer_base(&self) -> &CellRendererBase {
        &self.base
    }

    fn own_properties(&self) -> &'static [PropertyInfo] {
        TEXT_PROPERTIES
    }

    fn set_own_property(&self, name: &'static str, value: &Value) -> Result<bool, PropertyError> {
        let string = || value.as_str().unwrap_or_default().to_string();
        match name {
            "text" => Ok(self.text.set(string())),
            "placeholder-text" => Ok(self.placeholder.set(string())),
            "editable" => Ok(self.apply_editable(value.as_bool().unwrap_or(false))),
            "ellipsize" => Ok(self.ellipsize.set(value.as_bool().unwrap_or(false))),
            _ => Err(PropertyError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    fn own_property(&self, name: &str) -> Option<Value> {
        match name {
            "text" => Some(Value::String(self.text())),
            "placeholder-text" => Some(Value::String(self.placeholder.get())),
            "editable" => Some(Value::Bool(self.is_editable())),
            "ellipsize" => Some(Value::Bool(self.ellipsize.get())),
            _ => None,
        }
    }

    fn measure_width(&self, _widget: &dyn HostWidget) -> (i32, i32) {
        let pad = self.padding_border().horizontal();
        let text = self.text.get();
        let natural = self.metrics.text_width(&text) + pad;
        let minimum = if self.ellipsize.get() {
            let shown = text.chars().count().min(3) as i32;
            shown * self.metrics.char_width + pad
        } else {
            natural
        };
        (minimum, natural)
    }

    fn measure_height(&self, _widget: &dyn HostWidget) -> (i32, i32) {
        let height = self.metrics.line_height + self.padding_border().vertical();
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
        let area = self
            .aligned_area(widget, flags, cell)
            .shrink(self.padding_border());
        let text = self.text.get();
        if text.is_empty() && self.is_editable() {
            let placeholder = self.placeholder.get();
            if !placeholder.is_empty() {
                let state = PaintState {
                    insensitive: true,
                    ..self.state_flags(widget, flags)
                };
                target.draw_text(area, &placeholder, state);
            }
            return;
        }
        target.draw_text(area, &text, self.state_flags(widget, flags));
    }

    fn on_start_editing(
        &self,
        _event: Option<&CellEvent>,
        _widget: &dyn HostWidget,
        path: &str,
        _background: Rect,
        _cell: Rect,
        _flags: CellState,
    ) -> Option<CellEditableRef> {
        if !self.is_editable() {
            return None;
        }
        let entry = EntryEditable::new(self.text());
        let renderer = self.this.clone();
        let weak_entry = Arc::downgrade(&entry);
        let path = path.to_string();
        entry.editable_base().editing_done.connect(move |_| {
            if let (Some(renderer), Some(entry)) = (renderer.upgrade(), weak_entry.upgrade()) {
                renderer.on_entry_done(&entry, &path);
            }
        });
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Key;
    use crate::host::StaticHost;
    use parking_lot::Mutex;
    use trellis_render::{DisplayList, DrawCommand};

    #[test]
    fn test_text_property_round_trip() {
        let cell = CellRendererText::new();
        cell.set_property("text", Value::from("abc")).unwrap();
        assert_eq!(cell.text(), "abc");
        assert_eq!(cell.property("text"), Some(Value::from("abc")));
        cell.set_property("text", Value::Int(5)).unwrap();
        assert_eq!(cell.text(), "5");
    }

    #[test]
    fn test_editable_switches_mode() {
        let cell = CellRendererText::new();
        cell.set_property("editable", Value::Bool(true)).unwrap();
        assert_eq!(cell.mode(), CellRendererMode::Editable);
        cell.set_editable(false);
        assert_eq!(cell.mode(), CellRendererMode::Inert);
    }

    #[test]
    fn test_ellipsize_lowers_minimum() {
        let host = StaticHost::new();
        let cell = CellRendererText::with_metrics(TextMetrics::new(10, 10));
        cell.set_text("abcdefgh");
        assert_eq!(cell.preferred_width(&host), (84, 84));
        cell.set_ellipsize(true);
        assert_eq!(cell.preferred_width(&host), (34, 84));
    }

    #[test]
    fn test_paint_placeholder_when_empty() {
        let host = StaticHost::new();
        let cell = CellRendererText::new();
        cell.set_editable(true);
        cell.set_placeholder_text("type here");
        let mut list = DisplayList::new();
        let rect = Rect::new(0, 0, 200, 20);
        cell.render(&mut list, &host, rect, rect, CellState::new());
        assert!(list.commands().iter().any(|cmd| matches!(
            cmd,
            DrawCommand::Text { text, state, .. } if text == "type here" && state.insensitive
        )));
    }

    #[test]
    fn test_edit_commit_emits_edited() {
        let host = StaticHost::new();
        let cell = CellRendererText::new();
        cell.set_text("old");
        cell.set_editable(true);

        let edits = Arc::new(Mutex::new(Vec::new()));
        let edits_clone = edits.clone();
        cell.edited
            .connect(move |(path, text)| edits_clone.lock().push((path.clone(), text.clone())));

        let rect = Rect::new(0, 0, 100, 20);
        let editable = cell
            .start_editing(None, &host, "3", rect, rect, CellState::new())
            .unwrap();
        assert!(cell.renderer_base().is_editing());

        editable.start_editing(None);
        for key in [Key::Backspace, Key::Character('!'), Key::Enter] {
            editable.key_press(&CellEvent::key(key));
        }

        assert!(!cell.renderer_base().is_editing());
        assert_eq!(*edits.lock(), vec![("3".to_string(), "ol!".to_string())]);
    }

    #[test]
    fn test_edit_cancel_stops_without_edited() {
        let host = StaticHost::new();
        let cell = CellRendererText::new();
        cell.set_editable(true);

        let edits = Arc::new(Mutex::new(0));
        let edits_clone = edits.clone();
        cell.edited.connect(move |_| *edits_clone.lock() += 1);
        let canceled = Arc::new(Mutex::new(0));
        let canceled_clone = canceled.clone();
        cell.renderer_base()
            .editing_canceled
            .connect(move |_| *canceled_clone.lock() += 1);

        let rect = Rect::new(0, 0, 100, 20);
        let editable = cell
            .start_editing(None, &host, "0", rect, rect, CellState::new())
            .unwrap();
        editable.start_editing(None);
        editable.key_press(&CellEvent::key(Key::Escape));

        assert_eq!(*edits.lock(), 0);
        assert_eq!(*canceled.lock(), 1);
    }
}

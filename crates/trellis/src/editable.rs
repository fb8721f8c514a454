//! Edit widgets produced by editable renderers.
//!
//! When an editable cell is activated, its renderer hands back a
//! [`CellEditable`]. The area announces it through `add_editable`; the host
//! parents it with [`CellEditableExt::set_parented`] and the area then starts
//! the edit and gives it keyboard focus. The widget ends its life by emitting
//! `editing_done` (commit) and `remove_widget` (tear me down).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use trellis_core::Signal;
use trellis_core::logging::targets;

use crate::events::{CellEvent, Key};

/// A shared handle to an edit widget.
pub type CellEditableRef = Arc<dyn CellEditable>;

/// State and signals shared by every edit widget.
#[derive(Default)]
pub struct CellEditableBase {
    parented: AtomicBool,
    has_focus: AtomicBool,
    editing: AtomicBool,
    editing_canceled: AtomicBool,
    /// Emitted when the user commits or cancels the edit.
    pub editing_done: Signal<()>,
    /// Emitted when the widget should be removed from the host.
    pub remove_widget: Signal<()>,
}

impl CellEditableBase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for CellEditableBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellEditableBase")
            .field("parented", &self.parented.load(Ordering::SeqCst))
            .field("has_focus", &self.has_focus.load(Ordering::SeqCst))
            .field("editing_canceled", &self.editing_canceled.load(Ordering::SeqCst))
            .finish()
    }
}

/// Hooks implemented by a concrete edit widget.
pub trait CellEditable: Send + Sync {
    fn editable_base(&self) -> &CellEditableBase;

    /// Called once the widget is parented and about to receive input.
    fn on_start_editing(&self, _event: Option<&CellEvent>) {}

    /// Handle a key press forwarded by the host. Returns `true` if the key
    /// was consumed.
    fn key_press(&self, _event: &CellEvent) -> bool {
        false
    }
}

/// Public edit widget API. Implemented for every [`CellEditable`].
pub trait CellEditableExt: CellEditable {
    /// Begin the edit session.
    fn start_editing(&self, event: Option<&CellEvent>) {
        self.editable_base().editing.store(true, Ordering::SeqCst);
        self.on_start_editing(event);
    }

    fn is_editing(&self) -> bool {
        self.editable_base().editing.load(Ordering::SeqCst)
    }

    /// Take keyboard focus.
    fn grab_focus(&self) {
        self.editable_base().has_focus.store(true, Ordering::SeqCst);
    }

    fn has_focus(&self) -> bool {
        self.editable_base().has_focus.load(Ordering::SeqCst)
    }

    /// Record whether the host has put the widget into its tree.
    fn set_parented(&self, parented: bool) {
        self.editable_base().parented.store(parented, Ordering::SeqCst);
    }

    fn is_parented(&self) -> bool {
        self.editable_base().parented.load(Ordering::SeqCst)
    }

    /// Whether the edit ended by cancellation.
    fn editing_canceled(&self) -> bool {
        self.editable_base().editing_canceled.load(Ordering::SeqCst)
    }

    fn set_editing_canceled(&self, canceled: bool) {
        self.editable_base()
            .editing_canceled
            .store(canceled, Ordering::SeqCst);
    }

    /// Emit `editing_done`.
    fn editing_done(&self) {
        let base = self.editable_base();
        base.editing.store(false, Ordering::SeqCst);
        base.editing_done.emit(());
    }

    /// Emit `remove_widget` and drop keyboard focus.
    fn remove_widget(&self) {
        let base = self.editable_base();
        base.has_focus.store(false, Ordering::SeqCst);
        base.remove_widget.emit(());
    }
}

impl<T: CellEditable + ?Sized> CellEditableExt for T {}

/// Compare edit widget handles by identity.
pub fn same_editable(a: &CellEditableRef, b: &CellEditableRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A single-line text entry.
///
/// Enter commits and Escape cancels; either way the entry emits
/// `editing_done` followed by `remove_widget`.
///
/// ```
/// use trellis::editable::{CellEditable, CellEditableExt, EntryEditable};
/// use trellis::{CellEvent, Key};
///
/// let entry = EntryEditable::new("draft");
/// entry.start_editing(None);
/// entry.set_text("final");
/// assert!(entry.key_press(&CellEvent::key(Key::Enter)));
/// assert!(!entry.editing_canceled());
/// ```
#[derive(Debug, Default)]
pub struct EntryEditable {
    base: CellEditableBase,
    text: RwLock<String>,
}

impl EntryEditable {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            base: CellEditableBase::new(),
            text: RwLock::new(text.into()),
        })
    }

    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }

    fn finish(&self, canceled: bool) {
        tracing::trace!(target: targets::EDITING, canceled, "entry finished");
        self.set_editing_canceled(canceled);
        self.editing_done();
        self.remove_widget();
    }
}

impl CellEditable for EntryEditable {
    fn editable_base(&self) -> &CellEditableBase {
        &self.base
    }

    fn on_start_editing(&self, _event: Option<&CellEvent>) {
        self.set_editing_canceled(false);
    }

    fn key_press(&self, event: &CellEvent) -> bool {
        let CellEvent::KeyPress(key) = event else {
            return false;
        };
        match key.key {
            Key::Enter => self.finish(false),
            Key::Escape => self.finish(true),
            Key::Character(c) => self.text.write().push(c),
            Key::Backspace => {
                self.text.write().pop();
            }
            _ => return false,
        }
        true
    }
}

static_assertions::assert_impl_all!(EntryEditable: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_enter_commits_then_removes() {
        let entry = EntryEditable::new("");
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = order.clone();
        entry.base.editing_done.connect(move |_| o.lock().push("done"));
        let o = order.clone();
        entry.base.remove_widget.connect(move |_| o.lock().push("remove"));

        entry.start_editing(None);
        for c in "ab".chars() {
            entry.key_press(&CellEvent::key(Key::Character(c)));
        }
        entry.key_press(&CellEvent::key(Key::Backspace));
        assert!(entry.key_press(&CellEvent::key(Key::Enter)));

        assert_eq!(entry.text(), "a");
        assert!(!entry.editing_canceled());
        assert_eq!(*order.lock(), vec!["done", "remove"]);
    }

    #[test]
    fn test_escape_cancels() {
        let entry = EntryEditable::new("keep");
        entry.start_editing(None);
        assert!(entry.key_press(&CellEvent::key(Key::Escape)));
        assert!(entry.editing_canceled());
        assert!(!entry.is_editing());
    }

    #[test]
    fn test_parent_and_focus_flags() {
        let entry = EntryEditable::new("");
        assert!(!entry.is_parented());
        entry.set_parented(true);
        entry.grab_focus();
        assert!(entry.is_parented() && entry.has_focus());
        entry.remove_widget();
        assert!(!entry.has_focus());
    }

    #[test]
    fn test_identity() {
        let a: CellEditableRef = EntryEditable::new("");
        let b: CellEditableRef = EntryEditable::new("");
        assert!(same_editable(&a, &a.clone()));
        assert!(!same_editable(&a, &b));
    }
}

//! Synchronous signals.
//!
//! A [`Signal`] is a list of slots. [`Signal::emit`] runs every slot, in the
//! order they were connected, on the calling thread before it returns. Areas
//! rely on this: by the time `set_focus_cell` or `stop_editing` returns, every
//! observer of `focus_changed` or `remove_editable` has run.
//!
//! Emission works on a snapshot of the slot list and holds no lock while a
//! slot runs, so a slot may connect, disconnect or emit again. A slot
//! connected during an emission first runs on the next one. A slot
//! disconnected during an emission is skipped if it has not run yet.
//!
//! ```
//! use trellis_core::Signal;
//!
//! let edited = Signal::<(String, String)>::new();
//! let id = edited.connect(|(path, text)| println!("row {path} is now {text}"));
//! edited.emit(("0".into(), "Milk".into()));
//! assert!(edited.disconnect(id));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connected slot, valid until it is disconnected.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of slots receiving `&Args`.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Add a slot. It runs after every slot connected before it.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Remove a slot. Returns `false` if `id` was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.slots.lock().contains_key(id)
    }

    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Run every connected slot with `args`.
    pub fn emit(&self, args: Args) {
        let snapshot: Vec<(ConnectionId, Slot<Args>)> = self
            .slots
            .lock()
            .iter()
            .map(|(id, slot)| (id, Arc::clone(slot)))
            .collect();
        if snapshot.is_empty() {
            return;
        }
        tracing::trace!(target: targets::SIGNAL, slots = snapshot.len(), "emit");

        for (id, slot) in snapshot {
            if self.is_connected(id) {
                slot(&args);
            }
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

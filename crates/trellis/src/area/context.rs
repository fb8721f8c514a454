//! Per-run size accumulators.
//!
//! A host asks its area for a context, requests every row it intends to show
//! against that one context and reads back the largest minimum and natural
//! sizes seen. After [`CellAreaContextExt::allocate`] the area lays rows out
//! against the recorded allocation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use trellis_core::Signal;
use trellis_core::logging::targets;

use super::CellAreaRef;

/// A shared handle to a context.
pub type CellAreaContextRef = Arc<dyn CellAreaContext>;

/// Which accumulated size changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    MinimumWidth,
    NaturalWidth,
    MinimumHeight,
    NaturalHeight,
}

#[derive(Debug, Default, Clone, Copy)]
struct ContextSizes {
    min_width: i32,
    nat_width: i32,
    min_height: i32,
    nat_height: i32,
    alloc_width: Option<i32>,
    alloc_height: Option<i32>,
}

/// State shared by every context: the owning area, the accumulated request
/// and the allocation.
pub struct CellAreaContextBase {
    area: CellAreaRef,
    sizes: Mutex<ContextSizes>,
    /// Emitted once per field that grows on push or shrinks on reset.
    pub size_changed: Signal<ContextField>,
}

impl CellAreaContextBase {
    /// A zeroed, unallocated context for `area`.
    pub fn new(area: CellAreaRef) -> Self {
        Self {
            area,
            sizes: Mutex::new(ContextSizes::default()),
            size_changed: Signal::new(),
        }
    }

    /// The area this context was created by.
    pub fn area(&self) -> &CellAreaRef {
        &self.area
    }

    /// Grow the accumulated width to include `(minimum, natural)`.
    pub fn push_preferred_width(&self, minimum: i32, natural: i32) {
        let changed = {
            let mut guard = self.sizes.lock();
            let sizes = &mut *guard;
            grow_pair(
                (&mut sizes.min_width, &mut sizes.nat_width),
                (minimum, natural),
                (ContextField::MinimumWidth, ContextField::NaturalWidth),
            )
        };
        self.emit_changes(&changed);
    }

    /// Grow the accumulated height to include `(minimum, natural)`.
    pub fn push_preferred_height(&self, minimum: i32, natural: i32) {
        let changed = {
            let mut guard = self.sizes.lock();
            let sizes = &mut *guard;
            grow_pair(
                (&mut sizes.min_height, &mut sizes.nat_height),
                (minimum, natural),
                (ContextField::MinimumHeight, ContextField::NaturalHeight),
            )
        };
        self.emit_changes(&changed);
    }

    pub fn preferred_width(&self) -> (i32, i32) {
        let sizes = self.sizes.lock();
        (sizes.min_width, sizes.nat_width)
    }

    pub fn preferred_height(&self) -> (i32, i32) {
        let sizes = self.sizes.lock();
        (sizes.min_height, sizes.nat_height)
    }

    /// Allocated width and height; `None` where not allocated.
    pub fn allocation(&self) -> (Option<i32>, Option<i32>) {
        let sizes = self.sizes.lock();
        (sizes.alloc_width, sizes.alloc_height)
    }

    fn set_allocation(&self, width: Option<i32>, height: Option<i32>) {
        let mut sizes = self.sizes.lock();
        sizes.alloc_width = width;
        sizes.alloc_height = height;
    }

    fn reset_sizes(&self) {
        let changed = {
            let mut guard = self.sizes.lock();
            let sizes = &mut *guard;
            let mut changed = Vec::new();
            for (slot, field) in [
                (&mut sizes.min_width, ContextField::MinimumWidth),
                (&mut sizes.nat_width, ContextField::NaturalWidth),
                (&mut sizes.min_height, ContextField::MinimumHeight),
                (&mut sizes.nat_height, ContextField::NaturalHeight),
            ] {
                if *slot != 0 {
                    *slot = 0;
                    changed.push(field);
                }
            }
            sizes.alloc_width = None;
            sizes.alloc_height = None;
            changed
        };
        self.emit_changes(&changed);
    }

    fn emit_changes(&self, changed: &[ContextField]) {
        for field in changed {
            self.size_changed.emit(*field);
        }
    }
}

fn grow_pair(
    slots: (&mut i32, &mut i32),
    incoming: (i32, i32),
    fields: (ContextField, ContextField),
) -> Vec<ContextField> {
    let mut changed = Vec::new();
    if incoming.0 > *slots.0 {
        *slots.0 = incoming.0;
        changed.push(fields.0);
    }
    if incoming.1 > *slots.1 {
        *slots.1 = incoming.1;
        changed.push(fields.1);
    }
    changed
}

impl fmt::Debug for CellAreaContextBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes = *self.sizes.lock();
        f.debug_struct("CellAreaContextBase")
            .field("width", &(sizes.min_width, sizes.nat_width))
            .field("height", &(sizes.min_height, sizes.nat_height))
            .field("allocation", &(sizes.alloc_width, sizes.alloc_height))
            .finish()
    }
}

/// Hooks for context implementations.
pub trait CellAreaContext: Send + Sync {
    fn context_base(&self) -> &CellAreaContextBase;

    /// Downcast support, used by areas to reach their own context type.
    fn as_any(&self) -> &dyn Any;

    /// Clear any state beyond the base sizes. Called after the base reset.
    fn on_reset(&self) {}

    /// Called after the base allocation has been recorded.
    fn on_allocate(&self, _width: Option<i32>, _height: Option<i32>) {}

    /// Aggregate height of all requested rows for `width`, if the context
    /// tracks it.
    fn group_height_for_width(&self, _width: i32) -> Option<(i32, i32)> {
        None
    }

    /// Aggregate width of all requested rows for `height`, if the context
    /// tracks it.
    fn group_width_for_height(&self, _height: i32) -> Option<(i32, i32)> {
        None
    }
}

/// Public context API. Implemented for every [`CellAreaContext`].
pub trait CellAreaContextExt: CellAreaContext {
    fn area(&self) -> &CellAreaRef {
        self.context_base().area()
    }

    fn push_preferred_width(&self, minimum: i32, natural: i32) {
        self.context_base().push_preferred_width(minimum, natural);
    }

    fn push_preferred_height(&self, minimum: i32, natural: i32) {
        self.context_base().push_preferred_height(minimum, natural);
    }

    fn preferred_width(&self) -> (i32, i32) {
        self.context_base().preferred_width()
    }

    fn preferred_height(&self) -> (i32, i32) {
        self.context_base().preferred_height()
    }

    fn preferred_height_for_width(&self, width: i32) -> Option<(i32, i32)> {
        self.group_height_for_width(width)
    }

    fn preferred_width_for_height(&self, height: i32) -> Option<(i32, i32)> {
        self.group_width_for_height(height)
    }

    /// Record the final allocation. A negative dimension means the context
    /// is not allocated in that orientation.
    fn allocate(&self, width: i32, height: i32) {
        let width = (width >= 0).then_some(width);
        let height = (height >= 0).then_some(height);
        tracing::trace!(target: targets::CONTEXT, ?width, ?height, "allocate");
        self.context_base().set_allocation(width, height);
        self.on_allocate(width, height);
    }

    fn allocation(&self) -> (Option<i32>, Option<i32>) {
        self.context_base().allocation()
    }

    /// Return to the initial state: zero request, no allocation.
    fn reset(&self) {
        tracing::trace!(target: targets::CONTEXT, "reset");
        self.context_base().reset_sizes();
        self.on_reset();
    }
}

impl<T: CellAreaContext + ?Sized> CellAreaContextExt for T {}

/// A context that only tracks the base sizes.
#[derive(Debug)]
pub struct BasicCellAreaContext {
    base: CellAreaContextBase,
}

impl BasicCellAreaContext {
    pub fn new(area: CellAreaRef) -> Arc<Self> {
        Arc::new(Self {
            base: CellAreaContextBase::new(area),
        })
    }
}

impl CellAreaContext for BasicCellAreaContext {
    fn context_base(&self) -> &CellAreaContextBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static_assertions::assert_impl_all!(CellAreaContextBase: Send, Sync);

//! Tests for the guarantees every cell area gives, exercised through a box
//! area and through a minimal area class defined here.

use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::Level;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use trellis::area::{
    BasicCellAreaContext, CellArea, CellAreaBase, CellAreaBox, CellAreaContext,
    CellAreaContextExt, CellAreaContextRef, CellAreaExt, CellPropertyFlags, CellPropertySpec,
    install_cell_property,
};
use trellis::model::{ListStore, TreeIter};
use trellis::renderer::{CellRendererExt, CellRendererRef, CellRendererText, CellRendererToggle};
use trellis::{CellAreaError, CellState, DirectionType, HostWidget, StaticHost};
use trellis_core::{Value, ValueType};
use trellis_render::{DisplayList, Rect};

// =============================================================================
// A stacking area
// =============================================================================

const PROP_WEIGHT: u32 = 1;

/// Stacks its cells top to bottom, each at its natural height. Carries one
/// laxly validated cell property, "weight", clamped to 0..=10.
struct StackArea {
    base: CellAreaBase,
    cells: RwLock<Vec<(CellRendererRef, i32)>>,
}

impl StackArea {
    fn new() -> Arc<Self> {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            let spec = CellPropertySpec::new(PROP_WEIGHT, "weight", ValueType::Int, Value::Int(1))
                .with_flags(CellPropertyFlags::READWRITE.lax())
                .with_validator(|value| {
                    let weight = value.as_int().unwrap_or(0);
                    let clamped = weight.clamp(0, 10);
                    *value = Value::Int(clamped);
                    clamped != weight
                });
            install_cell_property(TypeId::of::<StackArea>(), "StackArea", spec).unwrap();
        });
        Arc::new_cyclic(|this: &Weak<StackArea>| {
            let area: Weak<dyn CellArea> = this.clone();
            Self {
                base: CellAreaBase::new("StackArea", area),
                cells: RwLock::new(Vec::new()),
            }
        })
    }
}

impl CellArea for StackArea {
    fn area_base(&self) -> &CellAreaBase {
        &self.base
    }

    fn add_cell(&self, renderer: &CellRendererRef) {
        self.cells.write().push((Arc::clone(renderer), 1));
    }

    fn remove_cell(&self, renderer: &CellRendererRef) {
        self.cells.write().retain(|(cell, _)| !Arc::ptr_eq(cell, renderer));
    }

    fn foreach_cell(&self, callback: &mut dyn FnMut(&CellRendererRef) -> bool) {
        let cells: Vec<_> = self.cells.read().iter().map(|(cell, _)| Arc::clone(cell)).collect();
        for cell in &cells {
            if callback(cell) {
                break;
            }
        }
    }

    fn foreach_cell_alloc(
        &self,
        _context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
        _background: Rect,
        callback: &mut dyn FnMut(&CellRendererRef, Rect, Rect) -> bool,
    ) {
        let mut y = cell_area.top();
        for cell in self.cells() {
            if !cell.is_visible() {
                continue;
            }
            let (_, height) = cell.preferred_height(widget);
            let rect = Rect::new(cell_area.left(), y, cell_area.width(), height);
            y += height;
            if callback(&cell, rect, rect) {
                break;
            }
        }
    }

    fn new_context(&self) -> Option<CellAreaContextRef> {
        Some(BasicCellAreaContext::new(self.base.area()?))
    }

    fn measure_width(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        let mut size = (0, 0);
        for cell in self.cells() {
            let (minimum, natural) = cell.preferred_width(widget);
            size = (size.0.max(minimum), size.1.max(natural));
        }
        context.push_preferred_width(size.0, size.1);
        size
    }

    fn measure_height(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        let mut size = (0, 0);
        for cell in self.cells() {
            let (minimum, natural) = cell.preferred_height(widget);
            size = (size.0 + minimum, size.1 + natural);
        }
        context.push_preferred_height(size.0, size.1);
        size
    }

    fn write_cell_property(&self, renderer: &CellRendererRef, spec: &CellPropertySpec, value: &Value) {
        if spec.id() != PROP_WEIGHT {
            return;
        }
        let weight = value.as_int().unwrap_or(1);
        for (cell, stored) in self.cells.write().iter_mut() {
            if Arc::ptr_eq(cell, renderer) {
                *stored = weight;
            }
        }
    }

    fn read_cell_property(&self, renderer: &CellRendererRef, spec: &CellPropertySpec) -> Option<Value> {
        let cells = self.cells.read();
        let (_, weight) = cells.iter().find(|(cell, _)| Arc::ptr_eq(cell, renderer))?;
        (spec.id() == PROP_WEIGHT).then_some(Value::Int(*weight))
    }
}

/// An area without any hooks of its own.
struct HollowArea {
    base: CellAreaBase,
}

impl HollowArea {
    fn new() -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<HollowArea>| {
            let area: Weak<dyn CellArea> = this.clone();
            Self {
                base: CellAreaBase::new("HollowArea", area),
            }
        })
    }
}

impl CellArea for HollowArea {
    fn area_base(&self) -> &CellAreaBase {
        &self.base
    }
}

fn names_store() -> (ListStore, TreeIter) {
    let store = ListStore::new(&[ValueType::String]);
    let row = store.append(vec![Value::from("Ada")]).unwrap();
    (store, row)
}

// =============================================================================
// Custom Area Classes
// =============================================================================

#[test]
fn test_custom_area_lays_out_through_shared_operations() {
    let area = StackArea::new();
    let top: CellRendererRef = CellRendererText::new();
    let bottom: CellRendererRef = CellRendererToggle::new();
    area.add(&top).unwrap();
    area.add(&bottom).unwrap();

    let host = StaticHost::new();
    let context = area.create_context().unwrap();
    assert_eq!(area.preferred_height(&*context, &host), (40, 40));
    assert_eq!(context.preferred_height(), (40, 40));

    let row = Rect::new(0, 0, 50, 40);
    let (hit, allocation) = area.cell_at_position(&*context, &host, row, 10, 25).unwrap();
    assert!(Arc::ptr_eq(&hit, &bottom));
    assert_eq!(allocation, Rect::new(0, 20, 50, 20));
}

#[test]
fn test_lax_cell_property_stores_coerced_value() {
    let area = StackArea::new();
    let cell: CellRendererRef = CellRendererText::new();
    area.add(&cell).unwrap();

    area.cell_set_property(&cell, "weight", Value::Int(42)).unwrap();
    assert_eq!(area.cell_get_property(&cell, "weight").unwrap(), Value::Int(10));

    area.cell_set(&cell, &[("weight", Value::Int(3))]).unwrap();
    assert_eq!(area.cell_get_property(&cell, "weight").unwrap(), Value::Int(3));
}

#[test]
fn test_strict_cell_property_rejects_out_of_range() {
    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererText::new();
    area.pack_start(&cell, false, false, true);

    let err = area.cell_set_property(&cell, "pack-type", Value::Int(7)).unwrap_err();
    assert!(matches!(err, CellAreaError::ValidationFailed { name: "pack-type", .. }));

    area.cell_set_property(&cell, "expand", Value::Int(1)).unwrap();
    assert_eq!(area.cell_get_property(&cell, "expand").unwrap(), Value::Bool(true));
}

#[test]
fn test_cell_property_lookup_returns_shared_spec() {
    let area = CellAreaBox::new();
    let first = area.find_cell_property("expand").unwrap();
    let second = area.find_cell_property("expand").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(area.find_cell_property("weight").is_none());

    let stack = StackArea::new();
    let names: Vec<_> = stack.list_cell_properties().iter().map(|spec| spec.name()).collect();
    assert_eq!(names, vec!["weight"]);
}

#[test]
fn test_hollow_area_degrades_quietly() {
    let area = HollowArea::new();
    let cell: CellRendererRef = CellRendererText::new();
    assert!(area.add(&cell).is_ok());
    assert!(area.create_context().is_none());
    assert!(!area.focus(DirectionType::TabForward));
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn test_reentrant_apply_is_rejected() {
    let (store, row) = names_store();
    let area = StackArea::new();
    let cell: CellRendererRef = CellRendererText::new();
    area.add(&cell).unwrap();

    let nested = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&nested);
    let weak = Arc::downgrade(&area);
    area.set_cell_data_func(
        &cell,
        Some(Box::new(move |_, model, iter| {
            if let Some(area) = weak.upgrade() {
                *slot.lock() = Some(area.apply_attributes(model, iter, false, false));
            }
        })),
    )
    .unwrap();

    area.apply_attributes(&store, &row, false, false).unwrap();
    assert_eq!(*nested.lock(), Some(Err(CellAreaError::ReentrantApply)));

    // The guard is released once the outer apply returns.
    area.set_cell_data_func(&cell, None).unwrap();
    assert!(area.apply_attributes(&store, &row, false, false).is_ok());
}

#[test]
fn test_data_func_released_on_replace_and_remove() {
    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererText::new();
    area.pack_start(&cell, true, false, true);

    let token = Arc::new(());
    let held = Arc::clone(&token);
    area.set_cell_data_func(
        &cell,
        Some(Box::new(move |_, _, _| {
            let _ = Arc::strong_count(&held);
        })),
    )
    .unwrap();
    assert_eq!(Arc::strong_count(&token), 2);
    area.set_cell_data_func(&cell, None).unwrap();
    assert_eq!(Arc::strong_count(&token), 1);

    let held = Arc::clone(&token);
    area.set_cell_data_func(
        &cell,
        Some(Box::new(move |_, _, _| {
            let _ = Arc::strong_count(&held);
        })),
    )
    .unwrap();
    area.remove(&cell).unwrap();
    assert_eq!(Arc::strong_count(&token), 1);
}

#[test]
fn test_expander_flags_written_only_on_change() {
    let (store, row) = names_store();
    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererText::new();
    area.pack_start(&cell, true, false, true);
    area.attribute_connect(&cell, "text", 0).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    cell.renderer_base().notify.connect(move |name| {
        if *name == "is-expander" {
            seen.fetch_add(1, Ordering::SeqCst);
        }
    });

    area.apply_attributes(&store, &row, true, false).unwrap();
    area.apply_attributes(&store, &row, true, false).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(cell.renderer_base().is_expander());
}

#[test]
fn test_connect_rejects_unknown_and_duplicate() {
    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererText::new();
    let stray: CellRendererRef = CellRendererText::new();
    area.pack_start(&cell, true, false, true);

    assert!(matches!(
        area.attribute_connect(&cell, "colour", 0),
        Err(CellAreaError::UnknownProperty { .. })
    ));
    assert!(matches!(
        area.attribute_connect(&stray, "text", 0),
        Err(CellAreaError::ForeignRenderer(_))
    ));
    area.attribute_connect(&cell, "text", 0).unwrap();
    assert!(matches!(
        area.attribute_connect(&cell, "text", 1),
        Err(CellAreaError::DuplicateBinding { column: 0, .. })
    ));
    assert_eq!(area.attribute_get_column(&cell, "text"), Some(0));
}

// =============================================================================
// Focus
// =============================================================================

#[test]
fn test_focus_changed_fires_on_every_set() {
    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererToggle::new();
    area.pack_start(&cell, false, false, true);

    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    area.area_base().focus_changed.connect(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    area.set_focus_cell(Some(&cell));
    area.set_focus_cell(Some(&cell));
    area.set_focus_cell(None);
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn test_focus_on_empty_and_single_cell_areas() {
    let area = CellAreaBox::new();
    assert!(!area.focus(DirectionType::TabForward));

    let cell: CellRendererRef = CellRendererToggle::new();
    area.pack_start(&cell, false, false, true);
    assert!(area.focus(DirectionType::TabForward));
    assert!(Arc::ptr_eq(&area.focus_cell().unwrap(), &cell));
    assert!(!area.focus(DirectionType::TabForward));
}

#[test]
fn test_sibling_edges_are_exclusive() {
    let area = CellAreaBox::new();
    let check: CellRendererRef = CellRendererToggle::new();
    let label: CellRendererRef = CellRendererText::new();
    let other: CellRendererRef = CellRendererToggle::new();
    area.pack_start(&check, false, false, true);
    area.pack_start(&label, true, false, true);
    area.pack_start(&other, false, false, true);

    assert_eq!(area.add_focus_sibling(&check, &check), Err(CellAreaError::SiblingOfSelf));
    area.add_focus_sibling(&check, &label).unwrap();
    assert!(area.add_focus_sibling(&other, &label).is_err());
    assert!(area.is_focus_sibling(&check, &label));
    assert!(area.remove_focus_sibling(&check, &label));
    assert!(area.focus_from_sibling(&label).is_none());
}

// =============================================================================
// Hit Testing and Painting
// =============================================================================

#[test]
fn test_hit_test_edges() {
    let area = CellAreaBox::new();
    let left: CellRendererRef = CellRendererToggle::new();
    let right: CellRendererRef = CellRendererToggle::new();
    area.pack_start(&left, false, false, true);
    area.pack_start(&right, false, false, true);

    let host = StaticHost::new();
    let context = area.create_context().unwrap();
    let row = Rect::new(0, 0, 40, 20);

    let (hit, _) = area.cell_at_position(&*context, &host, row, 20, 5).unwrap();
    assert!(Arc::ptr_eq(&hit, &right));
    let (hit, _) = area.cell_at_position(&*context, &host, row, 0, 0).unwrap();
    assert!(Arc::ptr_eq(&hit, &left));
    assert!(area.cell_at_position(&*context, &host, row, 40, 5).is_none());
    assert!(area.cell_at_position(&*context, &host, row, -1, 5).is_none());
}

#[test]
fn test_focus_rect_covers_holder_and_siblings() {
    let area = CellAreaBox::new();
    let check: CellRendererRef = CellRendererToggle::new();
    let label: CellRendererRef = CellRendererText::new();
    area.pack_start(&check, false, false, true);
    area.pack_start(&label, true, false, true);
    area.add_focus_sibling(&check, &label).unwrap();
    area.set_focus_cell(Some(&check));

    let host = StaticHost::new();
    let context = area.create_context().unwrap();
    let row = Rect::new(0, 0, 100, 20);
    let focused = CellState::new().with_focused(true);

    let mut list = DisplayList::new();
    area.render(&*context, &host, &mut list, row, row, focused, true);
    let rects = list.focus_rects();
    assert_eq!(rects.len(), 1);
    assert_eq!(rects[0].left(), 0);
    assert!(rects[0].right() > 20);

    host.set_visible_focus(false);
    let mut hidden = DisplayList::new();
    area.render(&*context, &host, &mut hidden, row, row, focused, true);
    assert!(hidden.focus_rects().is_empty());
}

#[test]
fn test_context_reset_and_copy() {
    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererToggle::new();
    area.pack_start(&cell, false, false, true);

    let host = StaticHost::new();
    let context = area.create_context().unwrap();
    area.preferred_width(&*context, &host);
    context.allocate(20, -1);

    let copy = area.copy_context(&*context).unwrap();
    assert_eq!(copy.preferred_width(), context.preferred_width());
    assert_eq!(copy.allocation(), (Some(20), None));

    context.reset();
    assert_eq!(context.preferred_width(), (0, 0));
    assert_eq!(context.allocation(), (None, None));
    assert_eq!(copy.preferred_width(), (20, 20));
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Collects the target of every warning.
#[derive(Clone, Default)]
struct WarnTargets(Arc<Mutex<Vec<String>>>);

impl<S: tracing::Subscriber> Layer<S> for WarnTargets {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::WARN {
            self.0.lock().push(metadata.target().to_string());
        }
    }
}

#[test]
fn test_failures_warn_under_their_subsystem() {
    let warnings = WarnTargets::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());

    let area = CellAreaBox::new();
    let cell: CellRendererRef = CellRendererText::new();
    let stray: CellRendererRef = CellRendererText::new();
    area.pack_start(&cell, true, false, true);

    tracing::subscriber::with_default(subscriber, || {
        assert!(area.attribute_connect(&cell, "colour", 0).is_err());
        assert!(area.cell_set_property(&cell, "weight", Value::Int(1)).is_err());
        assert!(area.add_focus_sibling(&cell, &stray).is_err());
        assert!(area.remove(&stray).is_err());
    });

    assert_eq!(
        *warnings.0.lock(),
        vec![
            "trellis::attributes",
            "trellis::cell_property",
            "trellis::focus",
            "trellis::area",
        ]
    );
}

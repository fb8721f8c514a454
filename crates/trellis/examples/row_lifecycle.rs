//! Row lifecycle walkthrough.
//!
//! Drives one box area through what a list view does with it: apply each
//! row, measure, allocate, paint into a display list, toggle a check box
//! with a click and rename an item from the keyboard.
//!
//! Run with: RUST_LOG=trellis=debug cargo run -p trellis --example row_lifecycle

use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use trellis::area::{CellArea, CellAreaBox, CellAreaContextExt, CellAreaDebug, CellAreaExt};
use trellis::editable::CellEditableExt;
use trellis::model::ListStore;
use trellis::renderer::{CellRendererRef, CellRendererText, CellRendererToggle};
use trellis::{CellEvent, CellState, Key, StaticHost};
use trellis_core::{TreeFormatOptions, Value, ValueType};
use trellis_render::{DisplayList, Rect};

const ROW_HEIGHT: i32 = 20;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = ListStore::new(&[ValueType::Bool, ValueType::String]);
    let rows: Vec<_> = [(false, "Milk"), (true, "Bread"), (false, "Eggs")]
        .into_iter()
        .map(|(done, item)| {
            store
                .append(vec![Value::Bool(done), Value::from(item)])
                .expect("row matches the column types")
        })
        .collect();

    let area = CellAreaBox::new();
    area.set_spacing(4);
    let check = CellRendererToggle::new();
    let label = CellRendererText::new();
    label.set_editable(true);
    let check_cell: CellRendererRef = check.clone();
    let label_cell: CellRendererRef = label.clone();
    area.pack_start(&check_cell, false, false, true);
    area.pack_start(&label_cell, true, false, true);
    area.attribute_connect(&check_cell, "active", 0)
        .expect("toggle has an active property");
    area.attribute_connect(&label_cell, "text", 1)
        .expect("text renderer has a text property");

    // A view parents the edit widget when the area hands it out.
    area.area_base().add_editable.connect(|added| {
        println!("  editing row {} at {:?}", added.path, added.cell_area);
        added.editable.set_parented(true);
    });

    let toggled = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&toggled);
    check.toggled.connect(move |path| sink.lock().push(path.clone()));
    let edited = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&edited);
    label.edited.connect(move |edit| sink.lock().push(edit.clone()));

    // Measure every row into one shared context, then allocate.
    let host = StaticHost::new();
    let context = area.create_context().expect("box areas create contexts");
    for row in &rows {
        area.apply_attributes(&store, row, false, false)
            .expect("not re-entered");
        area.preferred_width(&*context, &host);
    }
    let (minimum, natural) = context.preferred_width();
    println!("column width: minimum {minimum}, natural {natural}");
    context.allocate(natural, -1);

    println!("painted rows:");
    for (index, row) in rows.iter().enumerate() {
        area.apply_attributes(&store, row, false, false)
            .expect("not re-entered");
        let rect = Rect::new(0, index as i32 * ROW_HEIGHT, natural, ROW_HEIGHT);
        let mut list = DisplayList::new();
        area.render(&*context, &host, &mut list, rect, rect, CellState::new(), false);
        for command in list.commands() {
            println!("  {command:?}");
        }
    }

    // Click the first row's check box.
    let first = Rect::new(0, 0, natural, ROW_HEIGHT);
    area.apply_attributes(&store, &rows[0], false, false)
        .expect("not re-entered");
    area.event(&*context, &host, &CellEvent::click(4, 4), first, CellState::new());
    for path in toggled.lock().drain(..) {
        println!("toggled row {path}");
        store
            .set_value(&rows[0], 0, Value::Bool(!check.is_active()))
            .expect("column 0 holds booleans");
    }

    // Rename the second row from the keyboard.
    let second = Rect::new(0, ROW_HEIGHT, natural, ROW_HEIGHT);
    area.apply_attributes(&store, &rows[1], false, false)
        .expect("not re-entered");
    if area.activate(&*context, &host, second, CellState::new().with_focused(true), true)
        && let Some(widget) = area.edit_widget()
    {
        for c in " rolls".chars() {
            widget.key_press(&CellEvent::key(Key::Character(c)));
        }
        widget.key_press(&CellEvent::key(Key::Enter));
    }
    for (path, text) in edited.lock().drain(..) {
        println!("row {path} renamed to {text:?}");
        store
            .set_value(&rows[1], 1, Value::from(text))
            .expect("column 1 holds strings");
    }

    area.apply_attributes(&store, &rows[1], false, false)
        .expect("not re-entered");
    println!("{}", CellAreaDebug::with_options(TreeFormatOptions::detailed()).format(&*area));
}

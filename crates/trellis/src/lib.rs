//! Trellis - cell-area layout and rendering for list, tree and icon views.
//!
//! A view widget draws each row through a [`CellArea`](area::CellArea): a
//! container of cell renderers that binds renderer properties to model
//! columns, negotiates row sizes through a shared context, paints the row,
//! routes clicks and keys to the right cell and runs in-place editing.
//!
//! # Modules
//!
//! - [`area`]: cell areas, contexts, cell properties and the box layout
//! - [`renderer`]: the renderer contract and the text and toggle renderers
//! - [`editable`]: edit widgets handed out by editable renderers
//! - [`model`]: the tree model contract and a flat [`ListStore`](model::ListStore)
//! - [`host`]: what an area needs to know about the widget hosting it
//!
//! # Example
//!
//! ```
//! use trellis::area::{CellAreaBox, CellAreaContextExt, CellAreaExt};
//! use trellis::model::ListStore;
//! use trellis::renderer::{CellRendererRef, CellRendererText, CellRendererToggle};
//! use trellis::{CellState, StaticHost};
//! use trellis_core::{Value, ValueType};
//! use trellis_render::{DisplayList, Rect};
//!
//! let store = ListStore::new(&[ValueType::Bool, ValueType::String]);
//! let row = store.append(vec![Value::Bool(true), Value::from("Milk")]).unwrap();
//!
//! let area = CellAreaBox::new();
//! let check: CellRendererRef = CellRendererToggle::new();
//! let label: CellRendererRef = CellRendererText::new();
//! area.pack_start(&check, false, false, true);
//! area.pack_start(&label, true, false, true);
//! area.attribute_connect(&check, "active", 0).unwrap();
//! area.attribute_connect(&label, "text", 1).unwrap();
//!
//! let host = StaticHost::new();
//! let context = area.create_context().unwrap();
//! area.apply_attributes(&store, &row, false, false).unwrap();
//! let (_, width) = area.preferred_width(&*context, &host);
//! context.allocate(width, -1);
//!
//! let mut list = DisplayList::new();
//! let rect = Rect::new(0, 0, width, 20);
//! area.render(&*context, &host, &mut list, rect, rect, CellState::new(), false);
//! let texts: Vec<String> = list.texts().into_iter().map(|(_, text)| text).collect();
//! assert_eq!(texts, vec!["Milk"]);
//! ```

pub mod area;
pub mod editable;
pub mod error;
pub mod events;
pub mod host;
pub mod model;
pub mod renderer;
pub mod state;

pub use error::{CellAreaError, CellAreaResult, PathParseError};
pub use events::{
    ButtonEvent, CellEvent, Key, KeyPressEvent, KeyboardModifiers, MouseButton,
};
pub use host::{HostConfig, HostWidget, StaticHost};
pub use state::{
    CellRendererMode, CellState, DirectionType, Orientation, PackType, SizeRequestMode,
    TextDirection,
};

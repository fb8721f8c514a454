//! Text dumps of an area's cells, bindings and focus/edit state.

use trellis_core::logging::{TreeFormatOptions, TreeWriter};

use super::{CellArea, CellAreaExt};
use crate::renderer::{CellRendererExt, CellRendererRef, same_renderer};

/// Formats a cell area as a text tree.
///
/// ```
/// use trellis::area::{CellAreaBox, CellAreaDebug, CellAreaExt};
/// use trellis::renderer::{CellRendererRef, CellRendererText};
///
/// let area = CellAreaBox::new();
/// let cell: CellRendererRef = CellRendererText::new();
/// area.pack_start(&cell, true, false, true);
/// area.attribute_connect(&cell, "text", 0).unwrap();
///
/// let dump = CellAreaDebug::new().format(&*area);
/// assert!(dump.starts_with("CellAreaBox\n"));
/// assert!(dump.contains("CellRendererText"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellAreaDebug {
    options: TreeFormatOptions,
}

impl CellAreaDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format `area` and its renderers in layout order.
    pub fn format<A: CellArea + ?Sized>(&self, area: &A) -> String {
        let base = area.area_base();
        let focus = base.focus_cell();
        let edited = base.edited_cell();
        let is = |renderer: &CellRendererRef, slot: &Option<CellRendererRef>| {
            slot.as_ref().is_some_and(|other| same_renderer(renderer, other))
        };

        let mut tree = TreeWriter::new(self.options.clone());
        let mut root = area.class_name().to_string();
        if self.options.show_details
            && let Some(path) = base.current_path()
        {
            root.push_str(&format!(" (row {path})"));
        }
        tree.node(0, true, root);

        let cells = area.cells();
        let count = cells.len();
        for (index, renderer) in cells.iter().enumerate() {
            let mut label = String::new();
            if self.options.show_types {
                label.push_str(renderer.renderer_base().type_name());
            } else {
                label.push_str("cell");
            }
            if self.options.show_ids {
                label.push_str(&format!(" [{}]", renderer.id()));
            }
            if is(renderer, &focus) {
                label.push_str(" (focus)");
            }
            if is(renderer, &edited) {
                label.push_str(" (editing)");
            }
            if !renderer.is_visible() {
                label.push_str(" (hidden)");
            }
            tree.node(1, index + 1 == count, label);

            for binding in base.bindings(renderer.id()) {
                tree.detail(1, format_args!("{} <- column {}", binding.name, binding.column));
            }
            if base.has_data_func(renderer.id()) {
                tree.detail(1, "data func");
            }
            let siblings = area.focus_siblings(renderer);
            if !siblings.is_empty() {
                let ids: Vec<String> = siblings.iter().map(|s| s.id().to_string()).collect();
                tree.detail(1, format_args!("focus siblings {}", ids.join(", ")));
            }
        }
        tree.finish()
    }
}

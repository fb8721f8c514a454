//! A cell area that lays renderers out in a row or a column.

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, Once, Weak};

use parking_lot::{Mutex, RwLock};

use trellis_core::logging::targets;
use trellis_core::{Value, ValueType};
use trellis_render::Rect;

use super::box_context::{CellAreaBoxContext, GroupLayout, distribute};
use super::cell_property::{CellPropertySpec, install_cell_property};
use super::context::{CellAreaContext, CellAreaContextExt, CellAreaContextRef};
use super::{CellArea, CellAreaBase, CellAreaExt};
use crate::host::HostWidget;
use crate::renderer::{CellRendererExt, CellRendererRef, same_renderer};
use crate::state::{DirectionType, Orientation, PackType, SizeRequestMode, TextDirection};

const CLASS_NAME: &str = "CellAreaBox";

const PROP_EXPAND: u32 = 1;
const PROP_ALIGN: u32 = 2;
const PROP_FIXED_SIZE: u32 = 3;
const PROP_PACK_TYPE: u32 = 4;

fn install_cell_properties() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let class = TypeId::of::<CellAreaBox>();
        let specs = [
            CellPropertySpec::new(PROP_EXPAND, "expand", ValueType::Bool, Value::Bool(false)),
            CellPropertySpec::new(PROP_ALIGN, "align", ValueType::Bool, Value::Bool(false)),
            CellPropertySpec::new(PROP_FIXED_SIZE, "fixed-size", ValueType::Bool, Value::Bool(true)),
            CellPropertySpec::new(PROP_PACK_TYPE, "pack-type", ValueType::Int, Value::from(PackType::Start))
                .with_validator(|value| {
                    let raw = value.as_int().unwrap_or(0);
                    let clamped = raw.clamp(0, 1);
                    *value = Value::Int(clamped);
                    raw != clamped
                }),
        ];
        for spec in specs {
            let _ = install_cell_property(class, CLASS_NAME, spec);
        }
    });
}

/// Layout parameters of a [`CellAreaBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxAreaConfig {
    /// Direction cells are laid out in.
    pub orientation: Orientation,
    /// Pixels between adjacent visible cells.
    pub spacing: i32,
}

impl BoxAreaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_spacing(mut self, spacing: i32) -> Self {
        self.spacing = spacing.max(0);
        self
    }
}

#[derive(Clone)]
struct BoxCell {
    renderer: CellRendererRef,
    pack: PackType,
    expand: bool,
    align: bool,
    fixed: bool,
}

impl BoxCell {
    fn new(renderer: &CellRendererRef) -> Self {
        Self {
            renderer: Arc::clone(renderer),
            pack: PackType::Start,
            expand: false,
            align: false,
            fixed: true,
        }
    }
}

/// A visible cell with its group.
struct LayoutCell {
    renderer: CellRendererRef,
    group: usize,
    expand: bool,
}

/// Start-packed cells in packing order, then end-packed cells reversed.
fn layout_order(cells: &[BoxCell]) -> Vec<BoxCell> {
    let starts = cells.iter().filter(|cell| cell.pack == PackType::Start);
    let ends = cells.iter().rev().filter(|cell| cell.pack == PackType::End);
    starts.chain(ends).cloned().collect()
}

/// Split ordered cells into groups. A group starts at an aligned cell, on
/// either side of a cell that is not fixed-size and at the first end-packed
/// cell. Returns each cell's group and whether each group expands.
fn group_cells(cells: &[BoxCell]) -> (Vec<usize>, Vec<bool>) {
    let mut groups = Vec::with_capacity(cells.len());
    let mut expand: Vec<bool> = Vec::new();
    let mut previous: Option<&BoxCell> = None;
    for cell in cells {
        let split = previous.is_none_or(|prev| {
            cell.align
                || !cell.fixed
                || !prev.fixed
                || (cell.pack == PackType::End && prev.pack == PackType::Start)
        });
        if split {
            expand.push(false);
        }
        let index = expand.len() - 1;
        expand[index] |= cell.expand;
        groups.push(index);
        previous = Some(cell);
    }
    (groups, expand)
}

fn sum_with_spacing(requests: &[(i32, i32)], spacing: i32) -> (i32, i32) {
    let gaps = spacing * (requests.len() as i32 - 1).max(0);
    requests
        .iter()
        .fold((gaps, gaps), |(min, nat), request| (min + request.0, nat + request.1))
}

fn max_request(requests: impl IntoIterator<Item = (i32, i32)>) -> (i32, i32) {
    requests
        .into_iter()
        .fold((0, 0), |(min, nat), request| (min.max(request.0), nat.max(request.1)))
}

fn mirror(rect: Rect, frame: Rect) -> Rect {
    Rect::new(
        frame.left() + frame.right() - rect.right(),
        rect.top(),
        rect.width(),
        rect.height(),
    )
}

/// Lays its renderers out along one orientation.
///
/// Cells packed with `align` line up across rows that share a context;
/// `expand` cells receive the space left over after every cell got its
/// natural size.
///
/// ```
/// use trellis::area::{CellAreaBox, CellAreaContextExt, CellAreaExt};
/// use trellis::renderer::{CellRendererRef, CellRendererToggle};
/// use trellis::StaticHost;
///
/// let area = CellAreaBox::new();
/// area.set_spacing(4);
/// let a: CellRendererRef = CellRendererToggle::new();
/// let b: CellRendererRef = CellRendererToggle::new();
/// area.pack_start(&a, false, false, true);
/// area.pack_end(&b, false, false, true);
///
/// let context = area.create_context().unwrap();
/// let host = StaticHost::new();
/// assert_eq!(area.preferred_width(&*context, &host), (44, 44));
/// assert_eq!(context.preferred_width(), (44, 44));
/// ```
pub struct CellAreaBox {
    base: CellAreaBase,
    config: RwLock<BoxAreaConfig>,
    /// Cells in packing order.
    cells: RwLock<Vec<BoxCell>>,
    contexts: Mutex<Vec<Weak<CellAreaBoxContext>>>,
}

impl CellAreaBox {
    /// A horizontal box with no spacing.
    pub fn new() -> Arc<Self> {
        Self::with_config(BoxAreaConfig::default())
    }

    pub fn with_config(config: BoxAreaConfig) -> Arc<Self> {
        install_cell_properties();
        Arc::new_cyclic(|this: &Weak<CellAreaBox>| {
            let area: Weak<dyn CellArea> = this.clone();
            Self {
                base: CellAreaBase::new(CLASS_NAME, area),
                config: RwLock::new(config),
                cells: RwLock::new(Vec::new()),
                contexts: Mutex::new(Vec::new()),
            }
        })
    }

    pub fn config(&self) -> BoxAreaConfig {
        *self.config.read()
    }

    pub fn orientation(&self) -> Orientation {
        self.config.read().orientation
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        let changed = {
            let mut config = self.config.write();
            std::mem::replace(&mut config.orientation, orientation) != orientation
        };
        if changed {
            self.refresh_contexts();
        }
    }

    pub fn spacing(&self) -> i32 {
        self.config.read().spacing
    }

    /// Negative spacing is treated as zero.
    pub fn set_spacing(&self, spacing: i32) {
        let spacing = spacing.max(0);
        let changed = {
            let mut config = self.config.write();
            std::mem::replace(&mut config.spacing, spacing) != spacing
        };
        if changed {
            self.refresh_contexts();
        }
    }

    // =========================================================================
    // Packing
    // =========================================================================

    /// Add `renderer` after the cells already packed at the start.
    pub fn pack_start(&self, renderer: &CellRendererRef, expand: bool, align: bool, fixed: bool) {
        self.pack(renderer, PackType::Start, expand, align, fixed);
    }

    /// Add `renderer` before the cells already packed at the end.
    pub fn pack_end(&self, renderer: &CellRendererRef, expand: bool, align: bool, fixed: bool) {
        self.pack(renderer, PackType::End, expand, align, fixed);
    }

    fn pack(&self, renderer: &CellRendererRef, pack: PackType, expand: bool, align: bool, fixed: bool) {
        if self.add(renderer).is_err() {
            return;
        }
        self.update_cell(renderer, |cell| {
            cell.pack = pack;
            cell.expand = expand;
            cell.align = align;
            cell.fixed = fixed;
        });
        self.refresh_contexts();
    }

    /// Move `renderer` to `position` in packing order. Positions past the
    /// end move it last.
    pub fn reorder(&self, renderer: &CellRendererRef, position: usize) {
        let moved = {
            let mut cells = self.cells.write();
            match cells.iter().position(|cell| same_renderer(&cell.renderer, renderer)) {
                Some(index) => {
                    let cell = cells.remove(index);
                    let position = position.min(cells.len());
                    cells.insert(position, cell);
                    true
                }
                None => false,
            }
        };
        if moved {
            self.refresh_contexts();
        } else {
            tracing::warn!(target: targets::AREA, renderer = ?renderer.id(), "cannot reorder a renderer that is not in the box");
        }
    }

    fn update_cell(&self, renderer: &CellRendererRef, update: impl FnOnce(&mut BoxCell)) -> bool {
        let mut cells = self.cells.write();
        match cells.iter_mut().find(|cell| same_renderer(&cell.renderer, renderer)) {
            Some(cell) => {
                update(cell);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    fn group_layout(&self) -> GroupLayout {
        let config = self.config();
        let (_, expand) = group_cells(&layout_order(&self.cells.read()));
        GroupLayout {
            orientation: config.orientation,
            spacing: config.spacing,
            expand,
        }
    }

    /// Visible cells in layout order, with the group structure of all cells.
    fn snapshot(&self) -> (Vec<LayoutCell>, GroupLayout) {
        let config = self.config();
        let ordered = layout_order(&self.cells.read());
        let (groups, expand) = group_cells(&ordered);
        let visible = ordered
            .into_iter()
            .zip(groups)
            .filter(|(cell, _)| cell.renderer.is_visible())
            .map(|(cell, group)| LayoutCell {
                renderer: cell.renderer,
                group,
                expand: cell.expand,
            })
            .collect();
        let layout = GroupLayout {
            orientation: config.orientation,
            spacing: config.spacing,
            expand,
        };
        (visible, layout)
    }

    fn refresh_contexts(&self) {
        let layout = self.group_layout();
        let contexts: Vec<Arc<CellAreaBoxContext>> = {
            let mut contexts = self.contexts.lock();
            contexts.retain(|context| context.strong_count() > 0);
            contexts.iter().filter_map(Weak::upgrade).collect()
        };
        for context in contexts {
            context.set_layout(&layout);
        }
    }

    fn track_context(&self, context: &Arc<CellAreaBoxContext>) {
        self.contexts.lock().push(Arc::downgrade(context));
    }

    fn requests(
        &self,
        cells: &[LayoutCell],
        orientation: Orientation,
        widget: &dyn HostWidget,
        for_size: i32,
    ) -> Vec<(i32, i32)> {
        cells
            .iter()
            .map(|cell| self.request_renderer(&cell.renderer, orientation, widget, for_size))
            .collect()
    }

    /// Request along the box, accumulated per group.
    fn request_along(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        let (cells, layout) = self.snapshot();
        let requests = self.requests(&cells, layout.orientation, widget, -1);

        let mut groups: Vec<Option<(i32, i32)>> = vec![None; layout.expand.len()];
        for (cell, &(min, nat)) in cells.iter().zip(&requests) {
            let slot = &mut groups[cell.group];
            *slot = Some(match *slot {
                None => (min, nat),
                Some((m, n)) => (m + layout.spacing + min, n + layout.spacing + nat),
            });
        }

        match context.as_any().downcast_ref::<CellAreaBoxContext>() {
            Some(box_context) => {
                box_context.set_layout(&layout);
                box_context.push_group_requests(&groups);
            }
            None => {
                let (min, nat) = sum_with_spacing(&requests, layout.spacing);
                match layout.orientation {
                    Orientation::Horizontal => context.push_preferred_width(min, nat),
                    Orientation::Vertical => context.push_preferred_height(min, nat),
                }
            }
        }
        sum_with_spacing(&requests, layout.spacing)
    }

    /// Request across the box: the largest cell.
    fn request_across(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        let (cells, layout) = self.snapshot();
        let across = layout.orientation.opposite();
        let (min, nat) = max_request(self.requests(&cells, across, widget, -1));
        match across {
            Orientation::Horizontal => context.push_preferred_width(min, nat),
            Orientation::Vertical => context.push_preferred_height(min, nat),
        }
        (min, nat)
    }

    /// Request across the box once `length` has been shared out along it.
    fn request_across_for(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        length: i32,
    ) -> (i32, i32) {
        let (cells, layout) = self.snapshot();
        let requests = self.requests(&cells, layout.orientation, widget, -1);
        let expand: Vec<bool> = cells.iter().map(|cell| cell.expand).collect();
        let sizes = distribute(&requests, &expand, length, layout.spacing);
        let across = layout.orientation.opposite();
        let (min, nat) = max_request(
            cells
                .iter()
                .zip(&sizes)
                .map(|(cell, &size)| self.request_renderer(&cell.renderer, across, widget, size)),
        );
        if let Some(box_context) = context.as_any().downcast_ref::<CellAreaBoxContext>() {
            box_context.push_for_size(length, min, nat);
        }
        (min, nat)
    }

    /// Request along the box when every cell is `breadth` wide across it.
    fn request_along_for(&self, widget: &dyn HostWidget, breadth: i32) -> (i32, i32) {
        let (cells, layout) = self.snapshot();
        let requests = self.requests(&cells, layout.orientation, widget, breadth);
        sum_with_spacing(&requests, layout.spacing)
    }

    /// Offset and size of each visible cell along the box, in layout order.
    fn place_cells(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
    ) -> Vec<(CellRendererRef, i32, i32)> {
        let (cells, layout) = self.snapshot();
        let length = match layout.orientation {
            Orientation::Horizontal => cell_area.width(),
            Orientation::Vertical => cell_area.height(),
        };
        let requests = self.requests(&cells, layout.orientation, widget, -1);
        let expand: Vec<bool> = cells.iter().map(|cell| cell.expand).collect();

        let grouped = context
            .as_any()
            .downcast_ref::<CellAreaBoxContext>()
            .and_then(|box_context| box_context.allocation_for(length))
            .filter(|groups| {
                groups.len() == layout.expand.len()
                    && cells.iter().all(|cell| groups[cell.group].is_some())
            });

        let mut placed = Vec::with_capacity(cells.len());
        match grouped {
            Some(groups) => {
                for (index, group) in groups.iter().enumerate() {
                    let Some((position, size)) = *group else {
                        continue;
                    };
                    let members: Vec<usize> =
                        (0..cells.len()).filter(|&i| cells[i].group == index).collect();
                    let member_requests: Vec<(i32, i32)> = members.iter().map(|&i| requests[i]).collect();
                    let member_expand: Vec<bool> = members.iter().map(|&i| expand[i]).collect();
                    let sizes = distribute(&member_requests, &member_expand, size, layout.spacing);
                    let mut offset = position;
                    for (&i, &size) in members.iter().zip(&sizes) {
                        placed.push((Arc::clone(&cells[i].renderer), offset, size));
                        offset += size + layout.spacing;
                    }
                }
            }
            None => {
                let sizes = distribute(&requests, &expand, length, layout.spacing);
                let mut offset = 0;
                for (cell, &size) in cells.iter().zip(&sizes) {
                    placed.push((Arc::clone(&cell.renderer), offset, size));
                    offset += size + layout.spacing;
                }
            }
        }
        placed
    }
}

impl fmt::Debug for CellAreaBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellAreaBox")
            .field("config", &self.config())
            .field("cells", &self.cells.read().len())
            .field("base", &self.base)
            .finish()
    }
}

impl CellArea for CellAreaBox {
    fn area_base(&self) -> &CellAreaBase {
        &self.base
    }

    fn add_cell(&self, renderer: &CellRendererRef) {
        self.cells.write().push(BoxCell::new(renderer));
        self.refresh_contexts();
    }

    fn remove_cell(&self, renderer: &CellRendererRef) {
        self.cells
            .write()
            .retain(|cell| !same_renderer(&cell.renderer, renderer));
        self.refresh_contexts();
    }

    fn foreach_cell(&self, callback: &mut dyn FnMut(&CellRendererRef) -> bool) {
        let ordered = layout_order(&self.cells.read());
        for cell in &ordered {
            if callback(&cell.renderer) {
                break;
            }
        }
    }

    fn foreach_cell_alloc(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        cell_area: Rect,
        background: Rect,
        callback: &mut dyn FnMut(&CellRendererRef, Rect, Rect) -> bool,
    ) {
        let config = self.config();
        let rtl = config.orientation == Orientation::Horizontal
            && widget.text_direction() == TextDirection::Rtl;
        let along = |rect: Rect, start: i32, end: i32| match config.orientation {
            Orientation::Horizontal => Rect::new(start, rect.top(), end - start, rect.height()),
            Orientation::Vertical => Rect::new(rect.left(), start, rect.width(), end - start),
        };
        let (area_start, background_start, background_end) = match config.orientation {
            Orientation::Horizontal => (cell_area.left(), background.left(), background.right()),
            Orientation::Vertical => (cell_area.top(), background.top(), background.bottom()),
        };

        let placed = self.place_cells(context, widget, cell_area);
        let count = placed.len();
        for (n, (renderer, offset, size)) in placed.iter().enumerate() {
            let start = area_start + offset;
            let end = start + size;
            // Backgrounds cover the spacing and reach the row's edges.
            let background_from = if n == 0 { background_start.min(start) } else { start };
            let background_to = if n + 1 == count {
                background_end.max(end)
            } else {
                end + config.spacing
            };
            let mut cell = along(cell_area, start, end);
            let mut cell_background = along(background, background_from, background_to);
            if rtl {
                cell = mirror(cell, cell_area);
                cell_background = mirror(cell_background, background);
            }
            if callback(renderer, cell, cell_background) {
                break;
            }
        }
    }

    fn new_context(&self) -> Option<CellAreaContextRef> {
        let area = self.base.area()?;
        let context = CellAreaBoxContext::new(area, self.group_layout());
        self.track_context(&context);
        Some(context)
    }

    fn duplicate_context(&self, context: &dyn CellAreaContext) -> Option<CellAreaContextRef> {
        let area = self.base.area()?;
        let copy = match context.as_any().downcast_ref::<CellAreaBoxContext>() {
            Some(box_context) => box_context.duplicate(area),
            None => {
                let fresh = CellAreaBoxContext::new(area, self.group_layout());
                let (min_width, nat_width) = context.preferred_width();
                let (min_height, nat_height) = context.preferred_height();
                fresh.push_preferred_width(min_width, nat_width);
                fresh.push_preferred_height(min_height, nat_height);
                let (width, height) = context.allocation();
                fresh.allocate(width.unwrap_or(-1), height.unwrap_or(-1));
                fresh
            }
        };
        copy.set_layout(&self.group_layout());
        self.track_context(&copy);
        Some(copy)
    }

    fn request_mode(&self) -> SizeRequestMode {
        match self.orientation() {
            Orientation::Horizontal => SizeRequestMode::HeightForWidth,
            Orientation::Vertical => SizeRequestMode::WidthForHeight,
        }
    }

    fn measure_width(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        match self.orientation() {
            Orientation::Horizontal => self.request_along(context, widget),
            Orientation::Vertical => self.request_across(context, widget),
        }
    }

    fn measure_height(&self, context: &dyn CellAreaContext, widget: &dyn HostWidget) -> (i32, i32) {
        match self.orientation() {
            Orientation::Horizontal => self.request_across(context, widget),
            Orientation::Vertical => self.request_along(context, widget),
        }
    }

    fn measure_height_for_width(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        width: i32,
    ) -> (i32, i32) {
        match self.orientation() {
            Orientation::Horizontal => self.request_across_for(context, widget, width),
            Orientation::Vertical => self.request_along_for(widget, width),
        }
    }

    fn measure_width_for_height(
        &self,
        context: &dyn CellAreaContext,
        widget: &dyn HostWidget,
        height: i32,
    ) -> (i32, i32) {
        match self.orientation() {
            Orientation::Horizontal => self.request_along_for(widget, height),
            Orientation::Vertical => self.request_across_for(context, widget, height),
        }
    }

    fn write_cell_property(&self, renderer: &CellRendererRef, spec: &CellPropertySpec, value: &Value) {
        let flag = value.as_bool().unwrap_or(false);
        let updated = self.update_cell(renderer, |cell| match spec.id() {
            PROP_EXPAND => cell.expand = flag,
            PROP_ALIGN => cell.align = flag,
            PROP_FIXED_SIZE => cell.fixed = flag,
            PROP_PACK_TYPE => cell.pack = PackType::from_value(value).unwrap_or_default(),
            _ => {}
        });
        if updated {
            self.refresh_contexts();
        }
    }

    fn read_cell_property(&self, renderer: &CellRendererRef, spec: &CellPropertySpec) -> Option<Value> {
        let cells = self.cells.read();
        let cell = cells
            .iter()
            .find(|cell| same_renderer(&cell.renderer, renderer))?;
        Some(match spec.id() {
            PROP_EXPAND => Value::Bool(cell.expand),
            PROP_ALIGN => Value::Bool(cell.align),
            PROP_FIXED_SIZE => Value::Bool(cell.fixed),
            PROP_PACK_TYPE => Value::from(cell.pack),
            _ => spec.default_value().clone(),
        })
    }

    fn move_focus(&self, direction: DirectionType) -> bool {
        let forward = match (direction, self.orientation()) {
            (DirectionType::TabForward, _)
            | (DirectionType::Right, Orientation::Horizontal)
            | (DirectionType::Down, Orientation::Vertical) => Some(true),
            (DirectionType::TabBackward, _)
            | (DirectionType::Left, Orientation::Horizontal)
            | (DirectionType::Up, Orientation::Vertical) => Some(false),
            _ => None,
        };

        let activatable = self.is_activatable();
        let focusable: Vec<CellRendererRef> = self
            .cells()
            .into_iter()
            .filter(|cell| {
                cell.is_visible()
                    && self.focus_from_sibling(cell).is_none()
                    && (!activatable || cell.can_activate())
            })
            .collect();
        if focusable.is_empty() {
            return false;
        }

        let current = self
            .focus_cell()
            .and_then(|focus| focusable.iter().position(|cell| same_renderer(cell, &focus)));
        let next = match (forward, current) {
            (Some(false), None) => Some(focusable.len() - 1),
            (_, None) => Some(0),
            (Some(true), Some(index)) => Some(index + 1).filter(|&next| next < focusable.len()),
            (Some(false), Some(index)) => index.checked_sub(1),
            // Moving across the box leaves it.
            (None, Some(_)) => None,
        };
        match next {
            Some(index) => {
                self.set_focus_cell(Some(&focusable[index]));
                true
            }
            None => {
                // The same area is entered again on the next row.
                self.set_focus_cell(None);
                false
            }
        }
    }
}

static_assertions::assert_impl_all!(CellAreaBox: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::CellAreaContextExt;
    use crate::error::CellAreaError;
    use crate::host::StaticHost;
    use crate::renderer::{CellRendererText, CellRendererToggle};

    fn toggle() -> CellRendererRef {
        CellRendererToggle::new()
    }

    fn text(content: &str) -> CellRendererRef {
        let cell = CellRendererText::new();
        cell.set_text(content);
        cell
    }

    fn allocations(area: &CellAreaBox, context: &dyn CellAreaContext, host: &StaticHost, row: Rect) -> Vec<Rect> {
        let mut rects = Vec::new();
        area.foreach_alloc(context, host, row, row, |_, cell, _| {
            rects.push(cell);
            false
        });
        rects
    }

    // =========================================================================
    // Packing
    // =========================================================================

    #[test]
    fn test_layout_order_starts_then_reversed_ends() {
        let area = CellAreaBox::new();
        let cells: Vec<CellRendererRef> = (0..4).map(|_| toggle()).collect();
        area.pack_start(&cells[0], false, false, true);
        area.pack_end(&cells[1], false, false, true);
        area.pack_start(&cells[2], false, false, true);
        area.pack_end(&cells[3], false, false, true);

        let order = area.cells();
        let expected = [&cells[0], &cells[2], &cells[3], &cells[1]];
        assert_eq!(order.len(), 4);
        for (got, want) in order.iter().zip(expected) {
            assert!(same_renderer(got, want));
        }
    }

    #[test]
    fn test_pack_twice_is_rejected() {
        let area = CellAreaBox::new();
        let cell = toggle();
        area.pack_start(&cell, true, false, true);
        area.pack_end(&cell, false, false, true);
        assert_eq!(area.cells().len(), 1);
        assert_eq!(area.cell_get_property(&cell, "expand").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_reorder_moves_in_packing_order() {
        let area = CellAreaBox::new();
        let a = toggle();
        let b = toggle();
        area.pack_start(&a, false, false, true);
        area.pack_start(&b, false, false, true);
        area.reorder(&b, 0);
        assert!(same_renderer(&area.cells()[0], &b));
        area.reorder(&b, 99);
        assert!(same_renderer(&area.cells()[1], &b));
    }

    #[test]
    fn test_groups_split_at_align_fixed_and_end() {
        let cell = |pack, align, fixed| BoxCell {
            renderer: toggle(),
            pack,
            expand: false,
            align,
            fixed,
        };
        let cells = vec![
            cell(PackType::Start, false, true),
            cell(PackType::Start, false, true),
            cell(PackType::Start, true, true),
            cell(PackType::Start, false, false),
            cell(PackType::Start, false, true),
            cell(PackType::End, false, true),
        ];
        let (groups, expand) = group_cells(&cells);
        assert_eq!(groups, vec![0, 0, 1, 2, 3, 4]);
        assert_eq!(expand.len(), 5);
    }

    // =========================================================================
    // Cell Properties
    // =========================================================================

    #[test]
    fn test_cell_properties_installed_once() {
        let area = CellAreaBox::new();
        let _second = CellAreaBox::new();
        let names: Vec<_> = area.list_cell_properties().iter().map(|spec| spec.name()).collect();
        assert_eq!(names, vec!["expand", "align", "fixed-size", "pack-type"]);
        assert_eq!(
            area.find_cell_property("fixed-size").unwrap().default_value(),
            &Value::Bool(true)
        );
    }

    #[test]
    fn test_pack_type_property_reorders_and_validates() {
        let area = CellAreaBox::new();
        let a = toggle();
        let b = toggle();
        area.pack_start(&a, false, false, true);
        area.pack_start(&b, false, false, true);

        area.cell_set_property(&a, "pack-type", Value::Int(1)).unwrap();
        assert!(same_renderer(&area.cells()[1], &a));
        assert_eq!(area.cell_get_property(&a, "pack-type").unwrap(), Value::Int(1));

        assert!(matches!(
            area.cell_set_property(&b, "pack-type", Value::Int(7)),
            Err(CellAreaError::ValidationFailed { .. })
        ));
        assert_eq!(area.cell_get_property(&b, "pack-type").unwrap(), Value::Int(0));
    }

    // =========================================================================
    // Requests and Allocation
    // =========================================================================

    #[test]
    fn test_horizontal_request_sums_and_takes_max_height() {
        let area = CellAreaBox::with_config(BoxAreaConfig::new().with_spacing(3));
        let host = StaticHost::new();
        area.pack_start(&toggle(), false, false, true);
        area.pack_start(&text("abcd"), false, false, true);
        let context = area.create_context().unwrap();

        // 20 + 3 + (4 * 8 + 4)
        assert_eq!(area.preferred_width(&*context, &host), (59, 59));
        assert_eq!(area.preferred_height(&*context, &host), (20, 20));
        assert_eq!(context.preferred_width(), (59, 59));
        assert_eq!(context.preferred_height(), (20, 20));
    }

    #[test]
    fn test_invisible_cells_take_no_space() {
        let area = CellAreaBox::with_config(BoxAreaConfig::new().with_spacing(3));
        let hidden = toggle();
        hidden.renderer_base().set_visible(false);
        area.pack_start(&toggle(), false, false, true);
        area.pack_start(&hidden, false, false, true);
        let context = area.create_context().unwrap();
        assert_eq!(area.preferred_width(&*context, &StaticHost::new()), (20, 20));
    }

    #[test]
    fn test_vertical_box_stacks() {
        let area = CellAreaBox::with_config(
            BoxAreaConfig::new()
                .with_orientation(Orientation::Vertical)
                .with_spacing(1),
        );
        let host = StaticHost::new();
        area.pack_start(&toggle(), false, false, true);
        area.pack_start(&toggle(), false, false, true);
        let context = area.create_context().unwrap();
        assert_eq!(area.request_mode(), SizeRequestMode::WidthForHeight);
        assert_eq!(area.preferred_height(&*context, &host), (41, 41));
        assert_eq!(area.preferred_width(&*context, &host), (20, 20));

        let rects = allocations(&area, &*context, &host, Rect::new(0, 0, 20, 41));
        assert_eq!(rects, vec![Rect::new(0, 0, 20, 20), Rect::new(0, 21, 20, 20)]);
    }

    #[test]
    fn test_height_for_width_is_cached_not_accumulated() {
        let area = CellAreaBox::new();
        let host = StaticHost::new();
        area.pack_start(&text("hi"), false, false, true);
        let context = area.create_context().unwrap();

        assert_eq!(area.preferred_height_for_width(&*context, &host, 100), (20, 20));
        assert_eq!(context.preferred_height_for_width(100), Some((20, 20)));
        assert_eq!(context.preferred_height(), (0, 0));
    }

    #[test]
    fn test_expand_takes_leftover() {
        let area = CellAreaBox::new();
        let host = StaticHost::new();
        area.pack_start(&toggle(), true, false, true);
        area.pack_start(&toggle(), false, false, true);
        let context = area.create_context().unwrap();

        let rects = allocations(&area, &*context, &host, Rect::new(10, 5, 100, 20));
        assert_eq!(rects, vec![Rect::new(10, 5, 80, 20), Rect::new(90, 5, 20, 20)]);
    }

    #[test]
    fn test_aligned_cells_line_up_across_rows() {
        let store_rows = ["a", "abcdef"];
        let area = CellAreaBox::new();
        let host = StaticHost::new();
        let label = CellRendererText::new();
        let label_ref: CellRendererRef = label.clone();
        let check = toggle();
        area.pack_start(&label_ref, false, false, true);
        area.pack_start(&check, false, true, true);
        let context = area.create_context().unwrap();

        for row in store_rows {
            label.set_text(row);
            area.preferred_width(&*context, &host);
        }
        // Widest label: 6 * 8 + 4.
        assert_eq!(context.preferred_width(), (72, 72));
        context.allocate(72, -1);

        label.set_text("a");
        let row = Rect::new(0, 0, 72, 20);
        let check_x = area.cell_allocation(&*context, &host, &check, row).unwrap().left();
        assert_eq!(check_x, 52);
    }

    #[test]
    fn test_rtl_mirrors_horizontal_allocation() {
        let area = CellAreaBox::new();
        let host = StaticHost::new().with_direction(TextDirection::Rtl);
        let first = toggle();
        area.pack_start(&first, false, false, true);
        area.pack_start(&toggle(), false, false, true);
        let context = area.create_context().unwrap();

        let rect = area
            .cell_allocation(&*context, &host, &first, Rect::new(0, 0, 40, 20))
            .unwrap();
        assert_eq!(rect, Rect::new(20, 0, 20, 20));
    }

    #[test]
    fn test_rtl_backgrounds_reach_row_edges() {
        let area = CellAreaBox::new();
        let host = StaticHost::new().with_direction(TextDirection::Rtl);
        area.pack_start(&toggle(), false, false, true);
        area.pack_start(&toggle(), false, false, true);
        let context = area.create_context().unwrap();

        // The background extends past the cells on the left only.
        let cells = Rect::new(10, 0, 40, 20);
        let background = Rect::new(0, 0, 50, 20);
        let mut seen = Vec::new();
        area.foreach_alloc(&*context, &host, cells, background, |_, cell, cell_background| {
            seen.push((cell, cell_background));
            false
        });
        assert_eq!(
            seen,
            vec![
                (Rect::new(30, 0, 20, 20), Rect::new(20, 0, 30, 20)),
                (Rect::new(10, 0, 20, 20), Rect::new(0, 0, 20, 20)),
            ]
        );
    }

    #[test]
    fn test_regrouping_drops_context_groups() {
        let area = CellAreaBox::new();
        let host = StaticHost::new();
        let a = toggle();
        area.pack_start(&a, false, false, true);
        let context = area.create_context().unwrap();
        area.preferred_width(&*context, &host);

        let box_context = context.as_any().downcast_ref::<CellAreaBoxContext>().unwrap();
        assert_eq!(box_context.group_request(0), Some((20, 20)));
        area.pack_start(&toggle(), false, true, true);
        assert_eq!(box_context.n_groups(), 2);
        assert_eq!(box_context.group_request(0), None);
    }

    // =========================================================================
    // Focus
    // =========================================================================

    #[test]
    fn test_focus_walks_and_leaves() {
        let area = CellAreaBox::new();
        let a = toggle();
        let b = toggle();
        area.pack_start(&a, false, false, true);
        area.pack_start(&b, false, false, true);

        assert!(area.focus(DirectionType::TabForward));
        assert!(same_renderer(&area.focus_cell().unwrap(), &a));
        assert!(area.focus(DirectionType::Right));
        assert!(same_renderer(&area.focus_cell().unwrap(), &b));
        assert!(!area.focus(DirectionType::TabForward));
        assert!(area.focus_cell().is_none());
        assert!(area.focus(DirectionType::Left));
        assert!(same_renderer(&area.focus_cell().unwrap(), &b));
        assert!(!area.focus(DirectionType::Down));
        assert!(area.focus_cell().is_none());
    }

    #[test]
    fn test_focus_reenters_after_leaving() {
        let area = CellAreaBox::new();
        let cell = toggle();
        area.pack_start(&cell, false, false, true);

        // One row after another, all moving forward.
        assert!(area.focus(DirectionType::TabForward));
        assert!(!area.focus(DirectionType::TabForward));
        assert!(area.focus(DirectionType::TabForward));
        assert!(same_renderer(&area.focus_cell().unwrap(), &cell));
    }

    #[test]
    fn test_focus_skips_siblings_and_inert_cells() {
        let area = CellAreaBox::new();
        let holder = toggle();
        let sibling = toggle();
        let label = text("x");
        let last = toggle();
        area.pack_start(&holder, false, false, true);
        area.pack_start(&sibling, false, false, true);
        area.pack_start(&label, false, false, true);
        area.pack_start(&last, false, false, true);
        area.add_focus_sibling(&holder, &sibling).unwrap();

        assert!(area.focus(DirectionType::TabForward));
        assert!(area.focus(DirectionType::TabForward));
        assert!(same_renderer(&area.focus_cell().unwrap(), &last));
    }

    #[test]
    fn test_backward_entry_starts_at_last() {
        let area = CellAreaBox::new();
        let a = toggle();
        let b = toggle();
        area.pack_start(&a, false, false, true);
        area.pack_start(&b, false, false, true);
        assert!(area.focus(DirectionType::TabBackward));
        assert!(same_renderer(&area.focus_cell().unwrap(), &b));
    }
}

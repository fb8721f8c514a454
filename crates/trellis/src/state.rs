//! Small enums and flag sets shared across the engine.

use trellis_core::{Value, ValueType};

/// Per-row flags passed to render, event and activate calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CellState {
    /// The row is selected.
    pub selected: bool,
    /// The pointer is over the row.
    pub prelit: bool,
    /// The row is drawn insensitive.
    pub insensitive: bool,
    /// The row is in a sorted column.
    pub sorted: bool,
    /// The row holds the host's keyboard cursor.
    pub focused: bool,
    /// The row has children.
    pub expandable: bool,
    /// The row's children are shown.
    pub expanded: bool,
}

impl CellState {
    /// No flags set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selected flag.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Sets the prelit flag.
    pub fn with_prelit(mut self, prelit: bool) -> Self {
        self.prelit = prelit;
        self
    }

    /// Sets the insensitive flag.
    pub fn with_insensitive(mut self, insensitive: bool) -> Self {
        self.insensitive = insensitive;
        self
    }

    /// Sets the focused flag.
    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Sets the expandable and expanded flags.
    pub fn with_expansion(mut self, expandable: bool, expanded: bool) -> Self {
        self.expandable = expandable;
        self.expanded = expanded;
        self
    }
}

/// How a renderer reacts to activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellRendererMode {
    /// The cell only displays data.
    #[default]
    Inert,
    /// The cell can be clicked (toggles, buttons).
    Activatable,
    /// The cell can be edited in place.
    Editable,
}

impl CellRendererMode {
    /// Value type used when the mode travels through a property bag.
    pub const VALUE_TYPE: ValueType = ValueType::Int;

    /// Decode a mode from its integer property form.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.transform(ValueType::Int).ok()?.as_int()? {
            0 => Some(Self::Inert),
            1 => Some(Self::Activatable),
            2 => Some(Self::Editable),
            _ => None,
        }
    }
}

impl From<CellRendererMode> for Value {
    fn from(mode: CellRendererMode) -> Self {
        Value::Int(match mode {
            CellRendererMode::Inert => 0,
            CellRendererMode::Activatable => 1,
            CellRendererMode::Editable => 2,
        })
    }
}

/// Which dimension a layout prefers to negotiate first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeRequestMode {
    /// Width first, then height for that width.
    #[default]
    HeightForWidth,
    /// Height first, then width for that height.
    WidthForHeight,
    /// Size does not depend on the other dimension.
    ConstantSize,
}

/// Layout orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Cells are placed left to right.
    #[default]
    Horizontal,
    /// Cells are placed top to bottom.
    Vertical,
}

impl Orientation {
    /// The perpendicular orientation.
    pub fn opposite(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Text direction of the host widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left; horizontal layouts are mirrored.
    Rtl,
}

/// Direction of a keyboard focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionType {
    /// Tab.
    TabForward,
    /// Shift+Tab.
    TabBackward,
    Up,
    Down,
    Left,
    Right,
}

/// Which end of a box a cell is packed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackType {
    /// Packed from the start (left or top).
    #[default]
    Start,
    /// Packed from the end (right or bottom).
    End,
}

impl PackType {
    /// Decode a pack type from its integer property form.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.transform(ValueType::Int).ok()?.as_int()? {
            0 => Some(Self::Start),
            1 => Some(Self::End),
            _ => None,
        }
    }
}

impl From<PackType> for Value {
    fn from(pack: PackType) -> Self {
        Value::Int(match pack {
            PackType::Start => 0,
            PackType::End => 1,
        })
    }
}

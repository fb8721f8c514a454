//! Input events delivered to cell areas.
//!
//! The host widget translates its own input into [`CellEvent`]s with
//! coordinates in the same space as the cell rectangles it passes to the
//! area. Only the kinds of events a cell area reacts to are modelled.

use trellis_render::Point;

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Returns `true` if no modifier is held.
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (usually left).
    Left,
    /// Secondary button (usually right).
    Right,
    /// Middle button (scroll wheel click).
    Middle,
}

/// Keys a cell area or an edit widget may react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// The cancel key.
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Space,
    Home,
    End,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// A key that produced printable text.
    Character(char),
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPressEvent {
    /// The key that was pressed.
    pub key: Key,
    /// Modifiers held during the press.
    pub modifiers: KeyboardModifiers,
}

impl KeyPressEvent {
    /// A key press without modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::NONE,
        }
    }
}

/// A mouse button press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// The button.
    pub button: MouseButton,
    /// Pointer position, in the host's cell coordinate space.
    pub position: Point,
    /// Modifiers held during the press.
    pub modifiers: KeyboardModifiers,
    /// 1 for a single click, 2 for a double click.
    pub click_count: u8,
}

impl ButtonEvent {
    /// A single click of `button` at `position`.
    pub fn new(button: MouseButton, position: Point) -> Self {
        Self {
            button,
            position,
            modifiers: KeyboardModifiers::NONE,
            click_count: 1,
        }
    }
}

/// An event routed to a cell area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEvent {
    /// A key was pressed.
    KeyPress(KeyPressEvent),
    /// A mouse button was pressed.
    ButtonPress(ButtonEvent),
    /// A mouse button was released.
    ButtonRelease(ButtonEvent),
    /// The pointer moved.
    Motion {
        /// Pointer position.
        position: Point,
    },
}

impl CellEvent {
    /// Shorthand for a key press without modifiers.
    pub fn key(key: Key) -> Self {
        CellEvent::KeyPress(KeyPressEvent::new(key))
    }

    /// Shorthand for a primary-button single click.
    pub fn click(x: i32, y: i32) -> Self {
        CellEvent::ButtonPress(ButtonEvent::new(MouseButton::Left, Point::new(x, y)))
    }

    /// The pointer position, for pointer events.
    pub fn position(&self) -> Option<Point> {
        match self {
            CellEvent::ButtonPress(ev) | CellEvent::ButtonRelease(ev) => Some(ev.position),
            CellEvent::Motion { position } => Some(*position),
            CellEvent::KeyPress(_) => None,
        }
    }
}

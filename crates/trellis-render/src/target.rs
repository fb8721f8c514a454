//! The drawing surface contract.
//!
//! Cell renderers never produce pixels themselves; they describe what to draw
//! through [`RenderTarget`]. A host backs the trait with a real surface, or
//! with a [`DisplayList`](crate::DisplayList) to replay later.
//!
//! # State Stack
//!
//! Targets keep a save/restore stack that includes the clip region. Every
//! `save` must be paired with a `restore`:
//!
//! ```
//! use trellis_render::{DisplayList, Rect, RenderTarget};
//!
//! let mut target = DisplayList::new();
//! target.save();
//! target.clip_rect(Rect::new(0, 0, 100, 20));
//! target.draw_focus(Rect::new(2, 2, 50, 16));
//! target.restore();
//! assert!(target.finish().is_ok());
//! ```

use crate::types::{Color, Rect};

/// Appearance of a check or radio indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckMark {
    /// The indicator is checked.
    pub active: bool,
    /// The indicator shows the mixed state.
    pub inconsistent: bool,
    /// Draw as a radio button instead of a check box.
    pub radio: bool,
}

/// Visual state used to pick colors when drawing a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintState {
    /// The cell is insensitive and drawn dimmed.
    pub insensitive: bool,
    /// The row is selected.
    pub selected: bool,
    /// The pointer is over the row.
    pub prelight: bool,
    /// The cell holds keyboard focus.
    pub focused: bool,
}

/// The 2D drawing interface offered to cell renderers.
pub trait RenderTarget {
    /// Push the current state (clip) onto the stack.
    fn save(&mut self);

    /// Pop the most recently saved state.
    fn restore(&mut self);

    /// Intersect the clip region with a rectangle.
    fn clip_rect(&mut self, rect: Rect);

    /// The current clip bounds, or `None` when unclipped.
    fn clip_bounds(&self) -> Option<Rect>;

    /// Fill a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw a single line of text inside `rect`.
    fn draw_text(&mut self, rect: Rect, text: &str, state: PaintState);

    /// Draw a check or radio indicator.
    fn draw_check(&mut self, rect: Rect, mark: CheckMark, state: PaintState);

    /// Draw the keyboard focus indicator around `rect`.
    fn draw_focus(&mut self, rect: Rect);
}

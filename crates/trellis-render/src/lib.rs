//! Geometry and drawing contract for Trellis.
//!
//! This crate defines the integer geometry used by cell layout and the
//! [`RenderTarget`] trait through which cell renderers draw. It does not
//! rasterize anything; hosts adapt their own surface to `RenderTarget`, or
//! record into a [`DisplayList`].
//!
//! ```
//! use trellis_render::{DisplayList, PaintState, Rect, RenderTarget};
//!
//! let mut list = DisplayList::new();
//! list.draw_text(Rect::new(0, 0, 80, 16), "hello", PaintState::default());
//! assert_eq!(list.texts()[0].1, "hello");
//! ```

mod display_list;
mod error;
mod target;
mod types;

pub use display_list::{DisplayList, DrawCommand};
pub use error::{RenderError, RenderResult};
pub use target::{CheckMark, PaintState, RenderTarget};
pub use types::{Border, Color, Point, Rect, Size};

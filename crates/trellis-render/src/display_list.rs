//! A recording render target.

use crate::error::{RenderError, RenderResult};
use crate::target::{CheckMark, PaintState, RenderTarget};
use crate::types::{Color, Rect};

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// State pushed.
    Save,
    /// State popped.
    Restore,
    /// Clip intersected with a rectangle.
    Clip(Rect),
    /// Solid fill.
    Fill { rect: Rect, color: Color },
    /// Text run.
    Text {
        rect: Rect,
        text: String,
        state: PaintState,
    },
    /// Check or radio indicator.
    Check {
        rect: Rect,
        mark: CheckMark,
        state: PaintState,
    },
    /// Focus indicator.
    Focus(Rect),
}

/// A [`RenderTarget`] that records every call for later replay or inspection.
#[derive(Debug, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
    clip_stack: Vec<Option<Rect>>,
    clip: Option<Rect>,
    error: Option<RenderError>,
}

impl DisplayList {
    /// Create an empty display list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Recorded focus rectangles, in drawing order.
    pub fn focus_rects(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Focus(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Recorded text runs, in drawing order.
    pub fn texts(&self) -> Vec<(Rect, String)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { rect, text, .. } => Some((*rect, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Drop all recorded commands and reset the state stack.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Finish recording and return the command list.
    ///
    /// Fails if `save`/`restore` calls were unbalanced.
    pub fn finish(self) -> RenderResult<Vec<DrawCommand>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.clip_stack.is_empty() {
            return Err(RenderError::UnclosedSave {
                depth: self.clip_stack.len(),
            });
        }
        Ok(self.commands)
    }
}

impl RenderTarget for DisplayList {
    fn save(&mut self) {
        self.clip_stack.push(self.clip);
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        match self.clip_stack.pop() {
            Some(clip) => {
                self.clip = clip;
                self.commands.push(DrawCommand::Restore);
            }
            None => {
                tracing::warn!(target: "trellis_render", "restore without a matching save");
                self.error.get_or_insert(RenderError::UnbalancedRestore);
            }
        }
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.clip = Some(match self.clip {
            Some(current) => current.intersect(&rect).unwrap_or(Rect::new(rect.left(), rect.top(), 0, 0)),
            None => rect,
        });
        self.commands.push(DrawCommand::Clip(rect));
    }

    fn clip_bounds(&self) -> Option<Rect> {
        self.clip
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Fill { rect, color });
    }

    fn draw_text(&mut self, rect: Rect, text: &str, state: PaintState) {
        self.commands.push(DrawCommand::Text {
            rect,
            text: text.to_string(),
            state,
        });
    }

    fn draw_check(&mut self, rect: Rect, mark: CheckMark, state: PaintState) {
        self.commands.push(DrawCommand::Check { rect, mark, state });
    }

    fn draw_focus(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::Focus(rect));
    }
}

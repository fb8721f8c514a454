//! The host widget contract.
//!
//! A cell area is always driven by some layouting widget (a tree view, an
//! icon view, a combo box). The area only needs a handful of facts from it,
//! collected in [`HostWidget`].

use parking_lot::RwLock;

use trellis_render::Border;

use crate::state::TextDirection;

/// What a cell area needs to know about the widget it is laid out in.
pub trait HostWidget: Send + Sync {
    /// Style padding around each cell, used to compute inner cell areas.
    fn padding(&self) -> Border;

    /// Whether a focus indicator should currently be drawn.
    fn has_visible_focus(&self) -> bool;

    /// Whether the widget holds keyboard focus.
    fn has_focus(&self) -> bool {
        self.has_visible_focus()
    }

    /// Whether the widget is sensitive to input.
    fn is_sensitive(&self) -> bool {
        true
    }

    /// Text direction; horizontal layouts mirror under right-to-left.
    fn text_direction(&self) -> TextDirection {
        TextDirection::Ltr
    }
}

/// Configuration for a [`StaticHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    /// Cell padding.
    pub padding: Border,
    /// Focus indicator visible.
    pub visible_focus: bool,
    /// Keyboard focus held.
    pub has_focus: bool,
    /// Widget sensitive.
    pub sensitive: bool,
    /// Text direction.
    pub direction: TextDirection,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            padding: Border::ZERO,
            visible_focus: true,
            has_focus: true,
            sensitive: true,
            direction: TextDirection::Ltr,
        }
    }
}

/// A [`HostWidget`] whose answers are set programmatically.
///
/// Useful for headless hosts and for driving an area outside a widget tree.
///
/// ```
/// use trellis::{HostWidget, StaticHost, TextDirection};
/// use trellis_render::Border;
///
/// let host = StaticHost::new()
///     .with_padding(Border::uniform(2))
///     .with_direction(TextDirection::Rtl);
/// assert_eq!(host.padding().left, 2);
/// host.set_visible_focus(false);
/// assert!(!host.has_visible_focus());
/// ```
#[derive(Debug, Default)]
pub struct StaticHost {
    config: RwLock<HostConfig>,
}

impl StaticHost {
    /// A focused, sensitive, left-to-right host with no padding.
    pub fn new() -> Self {
        Self::default()
    }

    /// A host built from an explicit configuration.
    pub fn with_config(config: HostConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Builder-style padding.
    pub fn with_padding(self, padding: Border) -> Self {
        self.config.write().padding = padding;
        self
    }

    /// Builder-style text direction.
    pub fn with_direction(self, direction: TextDirection) -> Self {
        self.config.write().direction = direction;
        self
    }

    /// Change whether the focus indicator is visible.
    pub fn set_visible_focus(&self, visible: bool) {
        self.config.write().visible_focus = visible;
    }

    /// Change whether the host holds keyboard focus.
    pub fn set_has_focus(&self, focus: bool) {
        self.config.write().has_focus = focus;
    }

    /// Change sensitivity.
    pub fn set_sensitive(&self, sensitive: bool) {
        self.config.write().sensitive = sensitive;
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> HostConfig {
        *self.config.read()
    }
}

impl HostWidget for StaticHost {
    fn padding(&self) -> Border {
        self.config.read().padding
    }

    fn has_visible_focus(&self) -> bool {
        self.config.read().visible_focus
    }

    fn has_focus(&self) -> bool {
        self.config.read().has_focus
    }

    fn is_sensitive(&self) -> bool {
        self.config.read().sensitive
    }

    fn text_direction(&self) -> TextDirection {
        self.config.read().direction
    }
}

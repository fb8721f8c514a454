//! Logging and debugging facilities for Trellis.
//!
//! This module provides:
//! - Target and span name constants for filtering `tracing` output
//! - [`PerfSpan`], a guard that times an operation
//! - [`TreeWriter`], the text-tree formatter behind the cell-area debug dumps
//!
//! # Tracing Integration
//!
//! Trellis never installs a subscriber. To see logs, install one in your
//! application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis=debug,trellis_core=warn")
//!     .init();
//! ```

use std::fmt::Write as FmtWrite;

/// Span names used throughout Trellis for tracing.
pub mod span_names {
    /// Attribute application for one row.
    pub const APPLY_ATTRIBUTES: &str = "trellis::apply_attributes";
    /// Size request of one row.
    pub const REQUEST: &str = "trellis::request";
    /// Rendering of one row.
    pub const RENDER: &str = "trellis::render";
    /// Event dispatch on one row.
    pub const EVENT: &str = "trellis::event";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Cell area base behaviour.
    pub const AREA: &str = "trellis::area";
    /// Attribute bindings and data funcs.
    pub const ATTRIBUTES: &str = "trellis::attributes";
    /// Cell-property class pool.
    pub const CELL_PROPERTY: &str = "trellis::cell_property";
    /// Request contexts.
    pub const CONTEXT: &str = "trellis::context";
    /// Editing state machine.
    pub const EDITING: &str = "trellis::editing";
    /// Focus navigation and focus siblings.
    pub const FOCUS: &str = "trellis::focus";
    /// Cell renderers.
    pub const RENDERER: &str = "trellis::renderer";
    /// Tree models.
    pub const MODEL: &str = "trellis::model";
    /// Performance spans.
    pub const PERF: &str = "trellis::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact representation with dashes.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show identifiers.
    pub show_ids: bool,
    /// Whether to show type names.
    pub show_types: bool,
    /// Whether to show per-node details (bindings, properties).
    pub show_details: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_types: true,
            show_details: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_details: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_types: false,
            show_details: false,
            ..Default::default()
        }
    }

    /// Builder-style style override.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }
}

/// Incremental text-tree writer.
///
/// Callers push nodes depth-first, telling the writer each node's depth and
/// whether it is the last child of its parent.
///
/// ```
/// use trellis_core::logging::{TreeFormatOptions, TreeStyle, TreeWriter};
///
/// let mut tree = TreeWriter::new(TreeFormatOptions::default().with_style(TreeStyle::Ascii));
/// tree.node(0, true, "area");
/// tree.node(1, false, "text");
/// tree.node(1, true, "toggle");
/// assert_eq!(tree.finish(), "area\n+-- text\n    toggle\n");
/// ```
#[derive(Debug, Clone)]
pub struct TreeWriter {
    options: TreeFormatOptions,
    output: String,
}

impl TreeWriter {
    /// Create a writer with the given options.
    pub fn new(options: TreeFormatOptions) -> Self {
        Self {
            options,
            output: String::new(),
        }
    }

    /// The options this writer was created with.
    pub fn options(&self) -> &TreeFormatOptions {
        &self.options
    }

    /// Append a node line. Nodes deeper than `max_depth` are skipped.
    pub fn node(&mut self, depth: usize, is_last: bool, label: impl std::fmt::Display) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let prefix = self.build_prefix(depth, is_last);
        let _ = writeln!(self.output, "{}{}", prefix, label);
    }

    /// Append a detail line under the node at `depth`.
    pub fn detail(&mut self, depth: usize, label: impl std::fmt::Display) {
        if !self.options.show_details || self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let prefix = self.build_detail_prefix(depth);
        let _ = writeln!(self.output, "{}  .{}", prefix, label);
    }

    /// Consume the writer and return the formatted text.
    pub fn finish(self) -> String {
        self.output
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "   "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }

        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    fn build_detail_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };

        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_unicode() {
        let mut tree = TreeWriter::new(TreeFormatOptions::default());
        tree.node(0, true, "root");
        tree.node(1, false, "a");
        tree.node(2, true, "a1");
        tree.node(1, true, "b");
        let out = tree.finish();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "root");
        assert_eq!(lines[1], "\u{251c}\u{2500}\u{2500} a");
        assert_eq!(lines[2], "\u{2502}  \u{2514}\u{2500}\u{2500} a1");
        assert_eq!(lines[3], "\u{2514}\u{2500}\u{2500} b");
    }

    #[test]
    fn test_tree_max_depth() {
        let options = TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        };
        let mut tree = TreeWriter::new(options.with_style(TreeStyle::Compact));
        tree.node(0, true, "root");
        tree.node(1, true, "child");
        tree.node(2, true, "grandchild");
        let out = tree.finish();
        assert!(out.contains("child"));
        assert!(!out.contains("grandchild"));
    }

    #[test]
    fn test_details_hidden_unless_requested() {
        let mut plain = TreeWriter::new(TreeFormatOptions::default());
        plain.node(0, true, "cell");
        plain.detail(0, "text <- column 0");
        assert!(!plain.finish().contains("column"));

        let mut detailed = TreeWriter::new(TreeFormatOptions::detailed());
        detailed.node(0, true, "cell");
        detailed.detail(0, "text <- column 0");
        assert!(detailed.finish().contains("  .text <- column 0"));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}

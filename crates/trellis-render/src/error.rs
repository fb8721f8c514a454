//! Error types for the render crate.

use thiserror::Error;

/// Errors reported when finishing a recorded frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// `restore` was called with no matching `save`.
    #[error("restore without a matching save")]
    UnbalancedRestore,

    /// The frame ended with saved states still on the stack.
    #[error("{depth} saved state(s) were never restored")]
    UnclosedSave { depth: usize },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

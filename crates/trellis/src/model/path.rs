//! Row paths.

use std::fmt;
use std::str::FromStr;

use crate::error::PathParseError;

/// The position of a row as a list of indices from the root.
///
/// Paths print and parse in colon-separated form: the third child of the
/// first top-level row is `"0:2"`.
///
/// ```
/// use trellis::model::TreePath;
///
/// let path: TreePath = "0:2".parse().unwrap();
/// assert_eq!(path.indices(), &[0, 2]);
/// assert_eq!(path.to_string(), "0:2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TreePath {
    indices: Vec<u32>,
}

impl TreePath {
    /// A path from explicit indices.
    pub fn new(indices: impl Into<Vec<u32>>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    /// The path of a top-level row.
    pub fn from_index(index: u32) -> Self {
        Self {
            indices: vec![index],
        }
    }

    /// The indices, outermost first.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of levels in the path.
    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// Append a child index.
    pub fn push(&mut self, index: u32) {
        self.indices.push(index);
    }

    /// Remove the last level. Returns `false` if the path was already empty.
    pub fn up(&mut self) -> bool {
        self.indices.pop().is_some()
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.indices.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathParseError::Empty);
        }
        s.split(':')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| PathParseError::InvalidIndex(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(TreePath::new)
    }
}

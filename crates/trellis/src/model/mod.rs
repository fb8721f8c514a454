//! Tree model contract.
//!
//! A cell area never iterates a model itself. The host hands it one row at a
//! time as a [`TreeIter`], and the area pulls bound columns through
//! [`TreeModel::value`] while applying attributes.
//!
//! # Implementing a model
//!
//! ```
//! use trellis::model::{TreeIter, TreeModel, TreePath};
//! use trellis_core::{Value, ValueType};
//!
//! struct Squares;
//!
//! impl TreeModel for Squares {
//!     fn n_columns(&self) -> u32 { 1 }
//!     fn column_type(&self, _column: u32) -> Option<ValueType> { Some(ValueType::Int) }
//!     fn iter(&self, path: &TreePath) -> Option<TreeIter> {
//!         match path.indices() {
//!             [row] if *row < 10 => Some(TreeIter::new(0, *row as usize)),
//!             _ => None,
//!         }
//!     }
//!     fn path(&self, iter: &TreeIter) -> Option<TreePath> {
//!         Some(TreePath::from_index(iter.data() as u32))
//!     }
//!     fn value(&self, iter: &TreeIter, _column: u32) -> Option<Value> {
//!         let n = iter.data() as i32;
//!         Some(Value::Int(n * n))
//!     }
//! }
//!
//! let model = Squares;
//! let iter = model.iter(&TreePath::from_index(3)).unwrap();
//! assert_eq!(model.value(&iter, 0), Some(Value::Int(9)));
//! ```

mod list_store;
mod path;

pub use list_store::ListStore;
pub use path::TreePath;

use trellis_core::{Value, ValueType};

/// An opaque row cursor handed out by a [`TreeModel`].
///
/// The `stamp` lets a model recognise its own iterators; `data` is whatever
/// the model needs to find the row again (an index for list models).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeIter {
    stamp: u64,
    data: usize,
}

impl TreeIter {
    /// Create an iterator. Intended for model implementations.
    pub const fn new(stamp: u64, data: usize) -> Self {
        Self { stamp, data }
    }

    /// The stamp of the model that produced this iterator.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// The model-private payload.
    pub fn data(&self) -> usize {
        self.data
    }
}

/// Read access to rows of typed columns.
pub trait TreeModel: Send + Sync {
    /// Number of columns.
    fn n_columns(&self) -> u32;

    /// The declared type of a column, or `None` if out of range.
    fn column_type(&self, column: u32) -> Option<ValueType>;

    /// Resolve a path to an iterator.
    fn iter(&self, path: &TreePath) -> Option<TreeIter>;

    /// The path of the row an iterator points at.
    fn path(&self, iter: &TreeIter) -> Option<TreePath>;

    /// The value stored at `(iter, column)`.
    fn value(&self, iter: &TreeIter, column: u32) -> Option<Value>;

    /// Iterator for the first top-level row.
    fn iter_first(&self) -> Option<TreeIter> {
        self.iter(&TreePath::from_index(0))
    }

    /// Iterator for the row after `iter` at the same level.
    fn iter_next(&self, iter: &TreeIter) -> Option<TreeIter> {
        let mut path = self.path(iter)?;
        let last = path.indices().last().copied()?;
        path.up();
        path.push(last + 1);
        self.iter(&path)
    }
}

//! A flat list model with typed columns.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use trellis_core::logging::targets;
use trellis_core::{CoreError, PropertyError, Signal, Value, ValueType};

use super::{TreeIter, TreeModel, TreePath};

static STORE_STAMP: AtomicU64 = AtomicU64::new(1);

/// A list of rows, each holding one value per declared column.
///
/// Values are converted to the column type on the way in, so readers always
/// see the declared type.
///
/// ```
/// use trellis::model::{ListStore, TreeModel, TreePath};
/// use trellis_core::{Value, ValueType};
///
/// let store = ListStore::new(&[ValueType::String, ValueType::Bool]);
/// let iter = store.append(vec![Value::from("hello"), Value::from(1)]).unwrap();
/// assert_eq!(store.value(&iter, 1), Some(Value::Bool(true)));
/// assert_eq!(store.path(&iter), Some(TreePath::from_index(0)));
/// ```
pub struct ListStore {
    columns: Vec<ValueType>,
    rows: RwLock<Vec<Vec<Option<Value>>>>,
    stamp: u64,
    /// Emitted with the path of a row whose values changed.
    pub row_changed: Signal<TreePath>,
    /// Emitted with the path of a newly inserted row.
    pub row_inserted: Signal<TreePath>,
    /// Emitted with the former path of a removed row.
    pub row_deleted: Signal<TreePath>,
}

impl ListStore {
    /// Create an empty store with the given column types.
    pub fn new(columns: &[ValueType]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: RwLock::new(Vec::new()),
            stamp: STORE_STAMP.fetch_add(1, Ordering::Relaxed),
            row_changed: Signal::new(),
            row_inserted: Signal::new(),
            row_deleted: Signal::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if the store has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Append a row. Missing trailing values are left unset.
    pub fn append(&self, values: Vec<Value>) -> Result<TreeIter, CoreError> {
        let index = self.len();
        self.insert(index, values)
    }

    /// Insert a row at `index` (clamped to the end).
    pub fn insert(&self, index: usize, values: Vec<Value>) -> Result<TreeIter, CoreError> {
        let row = self.convert_row(values)?;
        let index = {
            let mut rows = self.rows.write();
            let index = index.min(rows.len());
            rows.insert(index, row);
            index
        };
        self.row_inserted.emit(TreePath::from_index(index as u32));
        Ok(TreeIter::new(self.stamp, index))
    }

    /// Replace one value.
    pub fn set_value(&self, iter: &TreeIter, column: u32, value: Value) -> Result<(), CoreError> {
        let value = self.convert(column, value)?;
        let row = self.check_iter(iter)?;
        {
            let mut rows = self.rows.write();
            let cells = rows.get_mut(row).ok_or_else(|| row_not_found(row))?;
            cells[column as usize] = Some(value);
        }
        self.row_changed.emit(TreePath::from_index(row as u32));
        Ok(())
    }

    /// Remove a row. Returns `false` if the iterator is stale.
    pub fn remove(&self, iter: &TreeIter) -> bool {
        let Ok(row) = self.check_iter(iter) else {
            return false;
        };
        let removed = {
            let mut rows = self.rows.write();
            if row < rows.len() {
                rows.remove(row);
                true
            } else {
                false
            }
        };
        if removed {
            self.row_deleted.emit(TreePath::from_index(row as u32));
        }
        removed
    }

    /// Remove every row.
    pub fn clear(&self) {
        let count = {
            let mut rows = self.rows.write();
            let count = rows.len();
            rows.clear();
            count
        };
        for row in (0..count).rev() {
            self.row_deleted.emit(TreePath::from_index(row as u32));
        }
    }

    fn check_iter(&self, iter: &TreeIter) -> Result<usize, CoreError> {
        if iter.stamp() != self.stamp {
            tracing::warn!(target: targets::MODEL, "iterator does not belong to this store");
            return Err(row_not_found(iter.data()).into());
        }
        Ok(iter.data())
    }

    fn convert(&self, column: u32, value: Value) -> Result<Value, CoreError> {
        let Some(ty) = self.columns.get(column as usize) else {
            return Err(PropertyError::NotFound {
                name: format!("column {column}"),
            }
            .into());
        };
        Ok(value.transform(*ty)?)
    }

    fn convert_row(&self, values: Vec<Value>) -> Result<Vec<Option<Value>>, CoreError> {
        if values.len() > self.columns.len() {
            return Err(PropertyError::NotFound {
                name: format!("column {}", self.columns.len()),
            }
            .into());
        }
        let mut row = vec![None; self.columns.len()];
        for (column, value) in values.into_iter().enumerate() {
            row[column] = Some(self.convert(column as u32, value)?);
        }
        Ok(row)
    }
}

fn row_not_found(row: usize) -> PropertyError {
    PropertyError::NotFound {
        name: format!("row {row}"),
    }
}

impl TreeModel for ListStore {
    fn n_columns(&self) -> u32 {
        self.columns.len() as u32
    }

    fn column_type(&self, column: u32) -> Option<ValueType> {
        self.columns.get(column as usize).copied()
    }

    fn iter(&self, path: &TreePath) -> Option<TreeIter> {
        match path.indices() {
            [row] if (*row as usize) < self.len() => Some(TreeIter::new(self.stamp, *row as usize)),
            _ => None,
        }
    }

    fn path(&self, iter: &TreeIter) -> Option<TreePath> {
        (iter.stamp() == self.stamp && iter.data() < self.len())
            .then(|| TreePath::from_index(iter.data() as u32))
    }

    fn value(&self, iter: &TreeIter, column: u32) -> Option<Value> {
        if iter.stamp() != self.stamp {
            return None;
        }
        let rows = self.rows.read();
        rows.get(iter.data())?.get(column as usize)?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_append_and_read() {
        let store = ListStore::new(&[ValueType::String, ValueType::Int]);
        let iter = store
            .append(vec![Value::from("a"), Value::Float(4.7)])
            .unwrap();
        assert_eq!(store.value(&iter, 0), Some(Value::from("a")));
        assert_eq!(store.value(&iter, 1), Some(Value::Int(4)));
        assert_eq!(store.value(&iter, 2), None);
    }

    #[test]
    fn test_rejects_untransformable_values() {
        let store = ListStore::new(&[ValueType::Int]);
        assert!(store.append(vec![Value::from("seven")]).is_err());
        assert!(store.append(vec![Value::Int(1), Value::Int(2)]).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_value_emits_row_changed() {
        let store = ListStore::new(&[ValueType::String]);
        let iter = store.append(vec![Value::from("hello")]).unwrap();

        let changed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let changed_clone = changed.clone();
        store
            .row_changed
            .connect(move |path| changed_clone.lock().push(path.clone()));

        store.set_value(&iter, 0, Value::from("world")).unwrap();
        assert_eq!(store.value(&iter, 0), Some(Value::from("world")));
        assert_eq!(*changed.lock(), vec![TreePath::from_index(0)]);
    }

    #[test]
    fn test_foreign_iter_is_rejected() {
        let a = ListStore::new(&[ValueType::Bool]);
        let b = ListStore::new(&[ValueType::Bool]);
        let iter = a.append(vec![Value::Bool(true)]).unwrap();
        b.append(vec![Value::Bool(false)]).unwrap();
        assert_eq!(b.value(&iter, 0), None);
        assert!(b.set_value(&iter, 0, Value::Bool(true)).is_err());
        assert!(!b.remove(&iter));
    }

    #[test]
    fn test_iteration() {
        let store = ListStore::new(&[ValueType::Int]);
        for n in 0..3 {
            store.append(vec![Value::Int(n)]).unwrap();
        }
        let mut seen = Vec::new();
        let mut iter = store.iter_first();
        while let Some(it) = iter {
            seen.push(store.value(&it, 0).and_then(|v| v.as_int()));
            iter = store.iter_next(&it);
        }
        assert_eq!(seen, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = ListStore::new(&[ValueType::Int]);
        let first = store.append(vec![Value::Int(1)]).unwrap();
        store.append(vec![Value::Int(2)]).unwrap();
        assert!(store.remove(&first));
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}

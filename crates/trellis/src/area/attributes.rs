//! Attribute bindings: which model column feeds which renderer property.

use std::fmt;
use std::sync::Arc;

use crate::model::{TreeIter, TreeModel};
use crate::renderer::CellRendererRef;

/// User hook run after a renderer's bound attributes have been applied.
///
/// The closure's captured state is dropped exactly once: when the hook is
/// replaced, when its renderer leaves the area, or when the area is dropped.
pub type CellDataFunc = Box<dyn Fn(&CellRendererRef, &dyn TreeModel, &TreeIter) + Send + Sync>;

pub(crate) type SharedDataFunc =
    Arc<dyn Fn(&CellRendererRef, &dyn TreeModel, &TreeIter) + Send + Sync>;

/// One `property <- column` link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Canonical renderer property name.
    pub name: &'static str,
    pub column: u32,
}

/// Everything an area knows about one renderer's data source.
#[derive(Default)]
pub(crate) struct CellInfo {
    pub(crate) bindings: Vec<AttributeBinding>,
    pub(crate) data_func: Option<SharedDataFunc>,
}

impl CellInfo {
    pub(crate) fn column_of(&self, name: &str) -> Option<u32> {
        self.bindings
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| binding.column)
    }

    /// Returns `true` if a binding was removed.
    pub(crate) fn unbind(&mut self, name: &str) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.name != name);
        self.bindings.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.data_func.is_none()
    }
}

impl fmt::Debug for CellInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellInfo")
            .field("bindings", &self.bindings)
            .field("has_data_func", &self.data_func.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_unbind() {
        let mut info = CellInfo::default();
        assert!(info.is_empty());
        info.bindings.push(AttributeBinding {
            name: "text",
            column: 2,
        });
        assert_eq!(info.column_of("text"), Some(2));
        assert_eq!(info.column_of("visible"), None);
        assert!(!info.unbind("visible"));
        assert!(info.unbind("text"));
        assert!(info.is_empty());
    }
}

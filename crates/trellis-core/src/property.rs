//! Change-detecting storage and property-bag descriptors.
//!
//! Renderers keep each of their fields in a [`Property`] so a setter can
//! tell whether anything changed before it queues a notification. The named
//! properties they expose to attribute bindings are described by
//! [`PropertyInfo`].
//!
//! ```
//! use trellis_core::Property;
//!
//! let visible = Property::new(true);
//! assert!(!visible.set(true));
//! assert!(visible.set(false));
//! assert!(!visible.get());
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::value::ValueType;

/// A value behind a lock whose setter reports changes.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Store `value` without comparing it to the current one.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value`. Returns `true` if it differs from what was there.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value.read(), f)
    }
}

/// One named, runtime-typed property of a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Canonical name, e.g. `"text"` or `"is-expander"`.
    pub name: &'static str,
    pub value_type: ValueType,
    pub read_only: bool,
}

impl PropertyInfo {
    pub const fn new(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            read_only: false,
        }
    }

    pub const fn read_only(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            read_only: true,
        }
    }
}

/// Why a property write or lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    NotFound {
        name: String,
    },
    /// The value cannot be transformed to the declared type.
    TypeMismatch {
        name: String,
        expected: ValueType,
        got: ValueType,
    },
    ReadOnly {
        name: String,
    },
    /// The value converts but is not acceptable.
    Invalid {
        name: String,
        reason: String,
    },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "no property named '{name}'"),
            Self::TypeMismatch {
                name,
                expected,
                got,
            } => write!(f, "property '{name}' holds {expected}, not {got}"),
            Self::ReadOnly { name } => write!(f, "property '{name}' cannot be written"),
            Self::Invalid { name, reason } => write!(f, "rejected value for '{name}': {reason}"),
        }
    }
}

impl std::error::Error for PropertyError {}

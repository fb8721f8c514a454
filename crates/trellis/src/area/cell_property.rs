//! Cell properties: per-area-class parameters attached to each child
//! renderer.
//!
//! An area class installs its specs once, typically from a
//! [`std::sync::Once`] in its constructor. Specs live in a process-wide pool
//! keyed by the class's [`TypeId`] and are never released, so the
//! [`Arc`] handed back by [`find_cell_property`] is the same object on every
//! lookup.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use trellis_core::logging::targets;
use trellis_core::{Value, ValueType};

use crate::error::{CellAreaError, CellAreaResult};

/// Validates and possibly coerces a value in place. Returns `true` if the
/// value had to be changed.
pub type CellPropertyValidator = Box<dyn Fn(&mut Value) -> bool + Send + Sync>;

/// Access flags of a cell property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPropertyFlags {
    pub readable: bool,
    pub writable: bool,
    /// Only settable at construction. Not supported for cell properties.
    pub construct_only: bool,
    /// Accept values the validator had to coerce instead of rejecting them.
    pub lax_validation: bool,
}

impl CellPropertyFlags {
    pub const READWRITE: Self = Self {
        readable: true,
        writable: true,
        construct_only: false,
        lax_validation: false,
    };

    pub const READABLE: Self = Self {
        writable: false,
        ..Self::READWRITE
    };

    /// The same flags with lax validation turned on.
    pub const fn lax(self) -> Self {
        Self {
            lax_validation: true,
            ..self
        }
    }
}

impl Default for CellPropertyFlags {
    fn default() -> Self {
        Self::READWRITE
    }
}

/// Describes one cell property of an area class.
///
/// ```
/// use trellis::area::{CellPropertyFlags, CellPropertySpec};
/// use trellis_core::{Value, ValueType};
///
/// let spec = CellPropertySpec::new(1, "weight", ValueType::Int, Value::Int(0))
///     .with_validator(|value| {
///         let clamped = value.as_int().unwrap_or(0).clamp(0, 10);
///         let changed = *value != Value::Int(clamped);
///         *value = Value::Int(clamped);
///         changed
///     })
///     .with_flags(CellPropertyFlags::READWRITE.lax());
///
/// let mut value = Value::Int(42);
/// assert!(spec.validate(&mut value));
/// assert_eq!(value, Value::Int(10));
/// ```
pub struct CellPropertySpec {
    owner: &'static str,
    id: u32,
    name: &'static str,
    value_type: ValueType,
    flags: CellPropertyFlags,
    default: Value,
    validator: Option<CellPropertyValidator>,
}

impl CellPropertySpec {
    /// A read-write spec without a validator.
    pub fn new(id: u32, name: &'static str, value_type: ValueType, default: Value) -> Self {
        Self {
            owner: "",
            id,
            name,
            value_type,
            flags: CellPropertyFlags::READWRITE,
            default,
            validator: None,
        }
    }

    pub fn with_flags(mut self, flags: CellPropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&mut Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Name of the class that installed this spec; empty before install.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The canonical name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn flags(&self) -> CellPropertyFlags {
        self.flags
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Run the validator. Returns `true` if `value` was coerced.
    pub fn validate(&self, value: &mut Value) -> bool {
        match &self.validator {
            Some(validator) => validator(value),
            None => false,
        }
    }

    /// Transform `value` to the declared type and validate it, honouring
    /// lax validation. Returns the value to store.
    pub(crate) fn coerce(&self, value: &Value) -> CellAreaResult<Value> {
        let mut coerced =
            value
                .transform(self.value_type)
                .map_err(|_| CellAreaError::TypeMismatch {
                    name: self.name,
                    expected: self.value_type,
                    got: value.value_type(),
                })?;
        if self.validate(&mut coerced) && !self.flags.lax_validation {
            return Err(CellAreaError::ValidationFailed {
                name: self.name,
                value: value.to_string(),
            });
        }
        Ok(coerced)
    }
}

impl fmt::Debug for CellPropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellPropertySpec")
            .field("owner", &self.owner)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("flags", &self.flags)
            .field("default", &self.default)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

type ClassSpecs = HashMap<&'static str, Arc<CellPropertySpec>>;

fn pool() -> &'static RwLock<HashMap<TypeId, ClassSpecs>> {
    static POOL: OnceLock<RwLock<HashMap<TypeId, ClassSpecs>>> = OnceLock::new();
    POOL.get_or_init(Default::default)
}

/// Register `spec` for the area class identified by `class`.
///
/// Rejects id 0, construct-only specs and names already installed on the
/// class. Every rejection is logged.
pub fn install_cell_property(
    class: TypeId,
    class_name: &'static str,
    mut spec: CellPropertySpec,
) -> CellAreaResult<Arc<CellPropertySpec>> {
    let result = if spec.id == 0 {
        Err(CellAreaError::InvalidCellPropertyId(spec.name))
    } else if spec.flags.construct_only {
        Err(CellAreaError::ConstructOnly(spec.name))
    } else {
        let mut pool = pool().write();
        let specs = pool.entry(class).or_default();
        if specs.contains_key(spec.name) {
            Err(CellAreaError::DuplicateCellProperty {
                class: class_name,
                name: spec.name,
            })
        } else {
            spec.owner = class_name;
            let spec = Arc::new(spec);
            specs.insert(spec.name, Arc::clone(&spec));
            Ok(spec)
        }
    };

    match &result {
        Ok(spec) => {
            tracing::trace!(target: targets::CELL_PROPERTY, class = class_name, name = spec.name, id = spec.id, "installed cell property");
        }
        Err(err) => {
            tracing::warn!(target: targets::CELL_PROPERTY, class = class_name, %err, "cell property not installed");
        }
    }
    result
}

/// Look up a cell property of `class` by name.
pub fn find_cell_property(class: TypeId, name: &str) -> Option<Arc<CellPropertySpec>> {
    pool().read().get(&class)?.get(name).cloned()
}

/// Every cell property of `class`, ordered by id.
pub fn list_cell_properties(class: TypeId) -> Vec<Arc<CellPropertySpec>> {
    let mut specs: Vec<_> = pool()
        .read()
        .get(&class)
        .map(|specs| specs.values().cloned().collect())
        .unwrap_or_default();
    specs.sort_by_key(|spec| spec.id);
    specs
}

//! Runtime-typed values.
//!
//! Renderer properties, tree-model cells and cell properties are all
//! heterogeneously typed at runtime. [`Value`] is the tagged variant carried
//! between them and [`ValueType`] is its tag. [`Value::transform`] implements
//! the conversion table used whenever a value of one type is assigned to a
//! slot declared with another.
//!
//! # Transform table
//!
//! | from \ to | bool | int | uint | float | string | object |
//! |-----------|------|-----|------|-------|--------|--------|
//! | bool      | =    | yes | yes  | yes   | yes    |        |
//! | int       | yes  | =   | if >= 0 | yes | yes   |        |
//! | uint      | yes  | if fits | = | yes   | yes    |        |
//! | float     | yes  | saturating | saturating | = | yes |  |
//! | string    |      |     |      |       | =      |        |
//! | object    |      |     |      |       |        | =      |
//!
//! # Example
//!
//! ```
//! use trellis_core::{Value, ValueType};
//!
//! let v = Value::from(3);
//! assert_eq!(v.transform(ValueType::Float).unwrap(), Value::Float(3.0));
//! assert_eq!(v.transform(ValueType::String).unwrap(), Value::from("3"));
//! assert!(Value::from("x").transform(ValueType::Int).is_err());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ValueError;

/// The type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Boolean.
    Bool,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// Double precision float.
    Float,
    /// Owned UTF-8 string.
    String,
    /// Shared, type-erased object.
    Object,
}

impl ValueType {
    /// The default value of this type (`false`, `0`, empty string).
    ///
    /// Objects have no meaningful default, so `None` is returned for them.
    pub fn default_value(self) -> Option<Value> {
        match self {
            Self::Bool => Some(Value::Bool(false)),
            Self::Int => Some(Value::Int(0)),
            Self::UInt => Some(Value::UInt(0)),
            Self::Float => Some(Value::Float(0.0)),
            Self::String => Some(Value::String(String::new())),
            Self::Object => None,
        }
    }

    /// Returns `true` if a value of this type can be transformed into `to`.
    ///
    /// Numeric range failures are still possible at transform time.
    pub fn can_transform_to(self, to: ValueType) -> bool {
        use ValueType::*;
        match (self, to) {
            (a, b) if a == b => true,
            (Bool | Int | UInt | Float, Bool | Int | UInt | Float | String) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A shared, type-erased object value.
///
/// Equality is identity: two `ObjectValue`s are equal when they point to the
/// same allocation.
#[derive(Clone)]
pub struct ObjectValue(Arc<dyn Any + Send + Sync>);

impl ObjectValue {
    /// Wrap any shareable value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectValue({:p})", Arc::as_ptr(&self.0))
    }
}

/// A runtime-typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i32),
    /// Unsigned integer.
    UInt(u32),
    /// Floating point.
    Float(f64),
    /// String.
    String(String),
    /// Shared object.
    Object(ObjectValue),
}

impl Value {
    /// Create an object value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(ObjectValue::new(value))
    }

    /// The type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the integer if this is a `UInt`.
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object payload as `T` if this is an `Object` holding a `T`.
    pub fn as_object<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Convert this value to `to`, following the transform table.
    pub fn transform(&self, to: ValueType) -> Result<Value, ValueError> {
        let from = self.value_type();
        if from == to {
            return Ok(self.clone());
        }

        let no_transform = || ValueError::NoTransform { from, to };
        let out_of_range = || ValueError::OutOfRange {
            value: self.to_string(),
            to,
        };

        let converted = match (self, to) {
            (Value::Bool(b), ValueType::Int) => Value::Int(i32::from(*b)),
            (Value::Bool(b), ValueType::UInt) => Value::UInt(u32::from(*b)),
            (Value::Bool(b), ValueType::Float) => Value::Float(if *b { 1.0 } else { 0.0 }),

            (Value::Int(n), ValueType::Bool) => Value::Bool(*n != 0),
            (Value::Int(n), ValueType::UInt) => {
                Value::UInt(u32::try_from(*n).map_err(|_| out_of_range())?)
            }
            (Value::Int(n), ValueType::Float) => Value::Float(f64::from(*n)),

            (Value::UInt(n), ValueType::Bool) => Value::Bool(*n != 0),
            (Value::UInt(n), ValueType::Int) => {
                Value::Int(i32::try_from(*n).map_err(|_| out_of_range())?)
            }
            (Value::UInt(n), ValueType::Float) => Value::Float(f64::from(*n)),

            (Value::Float(n), ValueType::Bool) => Value::Bool(*n != 0.0),
            (Value::Float(n), ValueType::Int) => Value::Int(*n as i32),
            (Value::Float(n), ValueType::UInt) => Value::UInt(*n as u32),

            (Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Float(_), ValueType::String) => {
                Value::String(self.to_string())
            }

            _ => return Err(no_transform()),
        };

        Ok(converted)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::from(true).value_type(), ValueType::Bool);
        assert_eq!(Value::from(1u32).value_type(), ValueType::UInt);
        assert_eq!(Value::from(0.5f32).value_type(), ValueType::Float);
        assert_eq!(Value::object(7u8).value_type(), ValueType::Object);
    }

    #[test]
    fn test_numeric_transforms() {
        assert_eq!(Value::Int(0).transform(ValueType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(Value::Bool(true).transform(ValueType::Int).unwrap(), Value::Int(1));
        assert_eq!(Value::Float(2.9).transform(ValueType::Int).unwrap(), Value::Int(2));
        assert_eq!(Value::UInt(4).transform(ValueType::Float).unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_out_of_range_transform() {
        let err = Value::Int(-1).transform(ValueType::UInt).unwrap_err();
        assert_eq!(
            err,
            ValueError::OutOfRange {
                value: "-1".into(),
                to: ValueType::UInt
            }
        );
        assert!(Value::UInt(u32::MAX).transform(ValueType::Int).is_err());
    }

    #[test]
    fn test_string_only_transforms_to_itself() {
        let s = Value::from("hello");
        assert_eq!(s.transform(ValueType::String).unwrap(), s);
        assert_eq!(
            s.transform(ValueType::Bool).unwrap_err(),
            ValueError::NoTransform {
                from: ValueType::String,
                to: ValueType::Bool
            }
        );
        assert!(!ValueType::String.can_transform_to(ValueType::Int));
        assert!(ValueType::Int.can_transform_to(ValueType::String));
    }

    #[test]
    fn test_object_identity() {
        let a = Value::object(String::from("payload"));
        let b = a.clone();
        let c = Value::object(String::from("payload"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_object::<String>().map(String::as_str), Some("payload"));
        assert!(a.transform(ValueType::String).is_err());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(ValueType::String.default_value(), Some(Value::from("")));
        assert_eq!(ValueType::Object.default_value(), None);
    }
}

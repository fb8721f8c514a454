//! Error types for Trellis core.

use std::fmt;

use crate::property::PropertyError;
use crate::value::ValueType;

/// The main error type for core operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Property-related error.
    Property(PropertyError),
    /// Value conversion error.
    Value(ValueError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(err) => write!(f, "Property error: {err}"),
            Self::Value(err) => write!(f, "Value error: {err}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Property(err) => Some(err),
            Self::Value(err) => Some(err),
        }
    }
}

impl From<PropertyError> for CoreError {
    fn from(err: PropertyError) -> Self {
        Self::Property(err)
    }
}

impl From<ValueError> for CoreError {
    fn from(err: ValueError) -> Self {
        Self::Value(err)
    }
}

/// Value conversion errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// No transform exists between the two types.
    NoTransform {
        /// Source type.
        from: ValueType,
        /// Requested type.
        to: ValueType,
    },
    /// A transform exists but this particular value does not fit.
    OutOfRange {
        /// The offending value, formatted.
        value: String,
        /// Requested type.
        to: ValueType,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTransform { from, to } => {
                write!(f, "Cannot transform a value of type {from} into {to}")
            }
            Self::OutOfRange { value, to } => {
                write!(f, "Value {value} is out of range for type {to}")
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

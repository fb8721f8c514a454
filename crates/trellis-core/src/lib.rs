//! Core systems for Trellis.
//!
//! This crate provides the plumbing shared by the cell-area engine:
//!
//! - **Signals**: synchronous callback lists that tolerate re-entrant slots
//! - **Properties**: change-detecting fields and property-bag descriptors
//! - **Values**: the runtime-typed [`Value`] and its transform table
//! - **Logging**: tracing targets, perf spans and a tree formatter
//!
//! # Signal/Slot Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Value Example
//!
//! ```
//! use trellis_core::{Value, ValueType};
//!
//! let cell = Value::from(true);
//! assert_eq!(cell.transform(ValueType::Int).unwrap(), Value::Int(1));
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod signal;
pub mod value;

pub use error::{CoreError, Result, ValueError};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle, TreeWriter};
pub use property::{Property, PropertyError, PropertyInfo};
pub use signal::{ConnectionId, Signal};
pub use value::{ObjectValue, Value, ValueType};

//! Runtime values threaded through the replacement engine.
//!
//! # Heap Enforcement
//!
//! Immutable heap allocations go through factory methods on `Value`. The
//! `Heap<T>` wrapper type has a `pub(super)` constructor, so external code
//! cannot create heap values directly.
//!
//! ```text
//! let s = Value::string("hello");          // OK
//! let s = Value::Str(Heap::new(...));      // ERROR: Heap::new is pub(super)
//! ```
//!
//! # Equality
//!
//! Primitives and strings compare structurally. Everything mutable
//! (records, functions, classes, instances, handles) compares by identity:
//! two values are equal only when they are the same cell. That is the
//! equality the engine cares about when deciding whether a retarget is a
//! no-op or whether two references observe the same live state.

mod class;
mod function;
mod heap;
mod record;

use std::fmt;

pub use class::{Behavior, ClassKey, ClassValue, ConstructFn, InstanceValue, MethodTable};
pub use function::{FunctionValue, NativeFn};
pub use heap::Heap;
pub use record::RecordValue;

use crate::error::ValueError;
use crate::handle::Handle;
use crate::Name;

/// Runtime value in a live module graph.
#[derive(Clone)]
pub enum Value {
    /// Void (unit) value.
    Void,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(Heap<String>),
    /// Mutable record with named fields.
    Record(RecordValue),
    /// Host-provided function.
    Function(FunctionValue),
    /// Class: a construct function plus a method table.
    Class(ClassValue),
    /// Instance of a class.
    Instance(InstanceValue),
    /// Stable indirection to a replaceable value.
    Handle(Handle),
}

// Factory Methods (ONLY way to construct heap values)

impl Value {
    /// Create an integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a floating-point value.
    #[inline]
    pub fn float(n: f64) -> Self {
        Value::Float(n)
    }

    /// Create a string value.
    ///
    /// ```text
    /// let s = Value::string("hello");
    /// let s2 = Value::string(format!("answer: {}", n));
    /// ```
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Create an empty record.
    #[inline]
    pub fn record() -> Self {
        Value::Record(RecordValue::new())
    }

    /// Create a record from an initial set of fields.
    pub fn record_from(fields: impl IntoIterator<Item = (Name, Value)>) -> Self {
        Value::Record(RecordValue::from_fields(fields))
    }

    /// Create a function value from a host closure.
    pub fn function(
        name: Name,
        body: impl Fn(Option<&Value>, &[Value]) -> Result<Value, ValueError> + 'static,
    ) -> Self {
        Value::Function(FunctionValue::new(name, body))
    }

    /// Name of this value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Handle(_) => "handle",
        }
    }
}

impl From<RecordValue> for Value {
    fn from(record: RecordValue) -> Self {
        Value::Record(record)
    }
}

impl From<FunctionValue> for Value {
    fn from(function: FunctionValue) -> Self {
        Value::Function(function)
    }
}

impl From<ClassValue> for Value {
    fn from(class: ClassValue) -> Self {
        Value::Class(class)
    }
}

impl From<InstanceValue> for Value {
    fn from(instance: InstanceValue) -> Self {
        Value::Instance(instance)
    }
}

impl From<Handle> for Value {
    fn from(handle: Handle) -> Self {
        Value::Handle(handle)
    }
}

/// Structural for primitives and strings, identity for everything mutable.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.same(b),
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Class(a), Value::Class(b)) => a.same(b),
            (Value::Instance(a), Value::Instance(b)) => a.same(b),
            (Value::Handle(a), Value::Handle(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::Record(record) => record.fmt(f),
            Value::Function(function) => function.fmt(f),
            Value::Class(class) => class.fmt(f),
            Value::Instance(instance) => instance.fmt(f),
            Value::Handle(handle) => handle.fmt(f),
        }
    }
}

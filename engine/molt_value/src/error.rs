//! Error types for value operations.
//!
//! Factory functions are the public construction API; callers match on the
//! variant rather than parsing message strings.

use crate::{Name, Value};
use std::fmt;

/// Result of an operation on a value.
pub type ValueResult = Result<Value, ValueError>;

/// Error raised by an operation on a value or handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueError {
    /// Invoked a value that is not a function.
    NotCallable { type_name: &'static str },
    /// Constructed a value that is not a class.
    NotConstructible { type_name: &'static str },
    /// Property access on a value with no property table.
    NoProperties { type_name: &'static str },
    /// Property missing from a record or instance.
    NoSuchProperty { name: Name },
    /// Method missing from a class behavior table.
    NoSuchMethod { class: Name, method: Name },
    /// Failure signalled by host-provided code (constructors, methods).
    HostFailure { message: String },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::NotCallable { type_name } => {
                write!(f, "value of type {type_name} is not callable")
            }
            ValueError::NotConstructible { type_name } => {
                write!(f, "value of type {type_name} cannot be constructed")
            }
            ValueError::NoProperties { type_name } => {
                write!(f, "value of type {type_name} has no properties")
            }
            ValueError::NoSuchProperty { name } => {
                write!(f, "no property #{} on target", name.raw())
            }
            ValueError::NoSuchMethod { class, method } => {
                write!(f, "no method #{} on class #{}", method.raw(), class.raw())
            }
            ValueError::HostFailure { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ValueError {}

/// Invoked a value that is not a function.
#[cold]
pub fn not_callable(type_name: &'static str) -> ValueError {
    ValueError::NotCallable { type_name }
}

/// Constructed a value that is not a class.
#[cold]
pub fn not_constructible(type_name: &'static str) -> ValueError {
    ValueError::NotConstructible { type_name }
}

/// Property access on a value with no property table.
#[cold]
pub fn no_properties(type_name: &'static str) -> ValueError {
    ValueError::NoProperties { type_name }
}

/// Property missing from a record or instance.
#[cold]
pub fn no_such_property(name: Name) -> ValueError {
    ValueError::NoSuchProperty { name }
}

/// Method missing from a class behavior table.
#[cold]
pub fn no_such_method(class: Name, method: Name) -> ValueError {
    ValueError::NoSuchMethod { class, method }
}

/// Failure signalled by host-provided code.
#[cold]
pub fn host_failure(message: impl Into<String>) -> ValueError {
    ValueError::HostFailure {
        message: message.into(),
    }
}

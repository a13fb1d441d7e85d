//! Centralized error constructors for the engine.
//!
//! This module provides a single import point for engine error constructors
//! alongside the value-level ones re-exported from `molt_value`.

use std::fmt;

// Re-export value-level errors and constructors
pub use molt_value::error::{
    host_failure, no_properties, no_such_method, no_such_property, not_callable,
    not_constructible,
};
pub use molt_value::{ValueError, ValueResult};

/// Result of an engine operation.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error raised by an engine entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Operation on a value or handle failed.
    Value(ValueError),
    /// An entry point that needs a running version was called outside
    /// evaluation.
    NoRunningVersion { operation: &'static str },
    /// `keep_alive` was called for an instance whose class was never
    /// registered.
    UnregisteredKeepAlive { class: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Value(err) => err.fmt(f),
            EngineError::NoRunningVersion { operation } => {
                write!(f, "{operation} called outside module evaluation")
            }
            EngineError::UnregisteredKeepAlive { class } => {
                write!(f, "class {class} was not registered for keep-alive")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Value(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValueError> for EngineError {
    fn from(err: ValueError) -> Self {
        EngineError::Value(err)
    }
}

/// An entry point that needs a running version was called outside evaluation.
#[cold]
pub fn no_running_version(operation: &'static str) -> EngineError {
    EngineError::NoRunningVersion { operation }
}

/// `keep_alive` was called for an instance whose class was never registered.
#[cold]
pub fn unregistered_keep_alive(class: impl Into<String>) -> EngineError {
    EngineError::UnregisteredKeepAlive {
        class: class.into(),
    }
}

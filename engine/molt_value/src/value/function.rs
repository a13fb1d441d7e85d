//! Host-provided function values.

// Rc shares one function body between the value, its handle, and any
// method tables that carry it
#![expect(
    clippy::disallowed_types,
    reason = "Rc for shared ownership of the function body"
)]

use crate::error::ValueError;
use crate::{Name, Value};
use std::fmt;
use std::rc::Rc;

/// Signature shared by all host-provided callables.
///
/// The first argument is the bound receiver, if any.
pub type NativeFn = dyn Fn(Option<&Value>, &[Value]) -> Result<Value, ValueError>;

/// Function value: an interned name plus a host-provided body.
///
/// Two function values compare equal only when they share the same body.
#[derive(Clone)]
pub struct FunctionValue {
    name: Name,
    body: Rc<NativeFn>,
}

impl FunctionValue {
    /// Create a function value from a host closure.
    pub fn new(
        name: Name,
        body: impl Fn(Option<&Value>, &[Value]) -> Result<Value, ValueError> + 'static,
    ) -> Self {
        FunctionValue {
            name,
            body: Rc::new(body),
        }
    }

    /// Interned function name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Call the body with an optional receiver.
    pub fn call(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, ValueError> {
        (self.body)(receiver, args)
    }

    /// Whether two values share the same body.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionValue({:?})", self.name)
    }
}

//! Stable indirection handles.
//!
//! A handle keeps its identity for the lifetime of an export name while the
//! value behind it is swapped on every reload. Code that captured the handle
//! once, say at an import site or inside a callback, keeps calling through
//! it and always reaches the newest target.
//!
//! Class handles additionally own a persistent [`Behavior`] cell. Instances
//! constructed through the handle hang on that cell, so retargeting the
//! handle at a replacement class re-points every such instance's method
//! resolution in one swap.

// Rc is the identity of a Handle: clones are the same handle
#![expect(clippy::disallowed_types, reason = "Rc is the identity of a Handle")]

use crate::error::{
    no_properties, no_such_property, not_callable, not_constructible, ValueError,
};
use crate::value::{Behavior, ClassValue, InstanceValue, Value};
use crate::Name;
use bitflags::bitflags;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// What a handle's current target supports.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct Capabilities: u8 {
        /// Target carries named properties (records, instances).
        const PROPERTIES = 1 << 0;
        /// Target can be invoked as a function.
        const INVOKE = 1 << 1;
        /// Target can construct instances.
        const CONSTRUCT = 1 << 2;
    }
}

impl Capabilities {
    /// Capabilities of a value, resolved through nested handles.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Record(_) | Value::Instance(_) => Capabilities::PROPERTIES,
            Value::Function(_) => Capabilities::INVOKE,
            Value::Class(_) => Capabilities::CONSTRUCT,
            Value::Handle(handle) => handle.capabilities(),
            _ => Capabilities::empty(),
        }
    }
}

/// Stable indirection to a replaceable value.
///
/// Clones are the same handle: retargeting through one clone is observed by
/// all of them.
#[derive(Clone)]
pub struct Handle(Rc<HandleCore>);

struct HandleCore {
    name: Name,
    target: RefCell<Value>,
    /// Present on class handles: the behavior cell that instances
    /// constructed through this handle hang on to.
    behavior: Option<Behavior>,
}

impl Handle {
    /// Handle over a plain value.
    pub fn new(name: Name, target: Value) -> Self {
        Handle(Rc::new(HandleCore {
            name,
            target: RefCell::new(target),
            behavior: None,
        }))
    }

    /// Handle over a class, with a persistent behavior cell seeded from the
    /// class's current method table.
    pub fn for_class(name: Name, class: ClassValue) -> Self {
        let behavior = Behavior::from_shared(class.methods_shared());
        Handle(Rc::new(HandleCore {
            name,
            target: RefCell::new(Value::Class(class)),
            behavior: Some(behavior),
        }))
    }

    /// Name the handle was registered under.
    pub fn name(&self) -> Name {
        self.0.name
    }

    /// Current target (cloned out of the cell).
    pub fn target(&self) -> Value {
        self.0.target.borrow().clone()
    }

    /// Type name of the current target, for diagnostics.
    pub fn target_type_name(&self) -> &'static str {
        self.0.target.borrow().type_name()
    }

    /// What the current target supports.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::of(&self.target())
    }

    /// Behavior cell for class handles.
    pub fn behavior(&self) -> Option<&Behavior> {
        self.0.behavior.as_ref()
    }

    /// Point the handle at a replacement target.
    ///
    /// Pointing at the value already in place is a no-op. On a class handle,
    /// a class target also swaps the behavior cell's method table, which
    /// re-points every instance constructed through this handle.
    pub fn retarget(&self, value: Value) {
        if *self.0.target.borrow() == value {
            return;
        }
        if let (Some(behavior), Value::Class(class)) = (&self.0.behavior, &value) {
            behavior.swap_table(class.methods_shared());
        }
        *self.0.target.borrow_mut() = value;
    }

    /// Read a property from the target.
    pub fn get(&self, name: Name) -> Result<Value, ValueError> {
        match self.target() {
            Value::Handle(inner) => inner.get(name),
            Value::Record(record) => record.get(name).ok_or_else(|| no_such_property(name)),
            Value::Instance(instance) => {
                instance.lookup(name).ok_or_else(|| no_such_property(name))
            }
            other => Err(no_properties(other.type_name())),
        }
    }

    /// Write a property on the target.
    pub fn set(&self, name: Name, value: Value) -> Result<(), ValueError> {
        match self.target() {
            Value::Handle(inner) => inner.set(name, value),
            Value::Record(record) => {
                record.set(name, value);
                Ok(())
            }
            Value::Instance(instance) => {
                instance.set_field(name, value);
                Ok(())
            }
            other => Err(no_properties(other.type_name())),
        }
    }

    /// Invoke the target as a function.
    ///
    /// A receiver that is this very handle is rebound to the current target,
    /// so methods stored on a wrapped record observe the record itself.
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, ValueError> {
        let target = self.target();
        let rebound = match receiver {
            Some(Value::Handle(handle)) if handle.same(self) => Some(target.clone()),
            Some(other) => Some(other.clone()),
            None => None,
        };
        match target {
            Value::Handle(inner) => inner.invoke(rebound.as_ref(), args),
            Value::Function(function) => function.call(rebound.as_ref(), args),
            other => Err(not_callable(other.type_name())),
        }
    }

    /// Construct an instance through the target class.
    ///
    /// On a class handle the instance hangs on the handle's behavior cell
    /// rather than the class's own, so later retargets reach it. Anything
    /// but a class target is a hard error.
    pub fn construct(&self, args: &[Value]) -> Result<InstanceValue, ValueError> {
        match self.target() {
            Value::Handle(inner) => inner.construct(args),
            Value::Class(class) => {
                let fields = class.construct_fields(args)?;
                let behavior = match &self.0.behavior {
                    Some(behavior) => behavior.clone(),
                    None => class.behavior().clone(),
                };
                Ok(InstanceValue::new(class, behavior, fields))
            }
            other => Err(not_constructible(other.type_name())),
        }
    }

    /// Whether two values are the same handle.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:?} -> {})", self.0.name, self.target_type_name())
    }
}

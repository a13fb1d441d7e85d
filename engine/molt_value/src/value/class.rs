//! Classes, instances, and swappable behavior tables.
//!
//! A class couples a construct function with a method table. Instances never
//! hold the table directly; they hold a [`Behavior`] cell whose contents can
//! be swapped for a replacement table, so every instance hanging on the cell
//! resolves methods against the newest table at its next call.

// Rc identities back classes, instances, and shared method tables
#![expect(
    clippy::disallowed_types,
    reason = "Rc identities for classes, instances, and shared method tables"
)]

use crate::error::{no_such_method, ValueError};
use crate::value::FunctionValue;
use crate::{Live, Name, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Construct function: maps constructor arguments to the initial field map.
pub type ConstructFn = dyn Fn(&[Value]) -> Result<FxHashMap<Name, Value>, ValueError>;

/// Method table mapping method names to functions.
#[derive(Debug, Default)]
pub struct MethodTable {
    methods: FxHashMap<Name, FunctionValue>,
}

impl MethodTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a method.
    pub fn insert(&mut self, name: Name, method: FunctionValue) {
        self.methods.insert(name, method);
    }

    /// Look up a method by name.
    pub fn resolve(&self, name: Name) -> Option<&FunctionValue> {
        self.methods.get(&name)
    }

    /// Number of methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the table has no methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Swappable reference to a method table.
///
/// The cell's identity is what instances hang on to; its contents are
/// replaced when the class behind it is replaced.
#[derive(Clone)]
pub struct Behavior(Live<Rc<MethodTable>>);

impl Behavior {
    /// Wrap an already-shared table.
    pub(crate) fn from_shared(table: Rc<MethodTable>) -> Self {
        Behavior(Live::new(table))
    }

    /// Look up a method in the current table.
    pub fn resolve(&self, name: Name) -> Option<FunctionValue> {
        self.0.borrow().resolve(name).cloned()
    }

    /// Number of methods in the current table.
    pub fn method_count(&self) -> usize {
        self.0.borrow().len()
    }

    /// Swap in a replacement table.
    pub(crate) fn swap_table(&self, table: Rc<MethodTable>) {
        *self.0.borrow_mut() = table;
    }

    /// Whether two references share the same cell.
    pub fn same(&self, other: &Self) -> bool {
        self.0.same(&other.0)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Behavior({} methods)", self.method_count())
    }
}

/// Identity key for a class, usable in maps.
///
/// Only meaningful while the class it came from is alive; callers keying a
/// map with this must also hold the class.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ClassKey(usize);

/// Class value: a construct function plus methods behind a behavior cell.
#[derive(Clone)]
pub struct ClassValue(Rc<ClassCore>);

struct ClassCore {
    name: Name,
    construct: Box<ConstructFn>,
    methods: Rc<MethodTable>,
    behavior: Behavior,
}

impl ClassValue {
    /// Create a class from a construct function and its methods.
    pub fn new(
        name: Name,
        construct: impl Fn(&[Value]) -> Result<FxHashMap<Name, Value>, ValueError> + 'static,
        methods: MethodTable,
    ) -> Self {
        let methods = Rc::new(methods);
        let behavior = Behavior::from_shared(Rc::clone(&methods));
        ClassValue(Rc::new(ClassCore {
            name,
            construct: Box::new(construct),
            methods,
            behavior,
        }))
    }

    /// Interned class name.
    pub fn name(&self) -> Name {
        self.0.name
    }

    /// The class's own behavior cell.
    pub fn behavior(&self) -> &Behavior {
        &self.0.behavior
    }

    /// The method table, shared.
    pub(crate) fn methods_shared(&self) -> Rc<MethodTable> {
        Rc::clone(&self.0.methods)
    }

    /// Identity key for maps.
    pub fn key(&self) -> ClassKey {
        ClassKey(Rc::as_ptr(&self.0) as usize)
    }

    /// Run the construct function and return the raw field map.
    pub(crate) fn construct_fields(
        &self,
        args: &[Value],
    ) -> Result<FxHashMap<Name, Value>, ValueError> {
        (self.0.construct)(args)
    }

    /// Construct an instance carrying this class's own behavior cell.
    pub fn construct(&self, args: &[Value]) -> Result<InstanceValue, ValueError> {
        let fields = self.construct_fields(args)?;
        Ok(InstanceValue::new(
            self.clone(),
            self.0.behavior.clone(),
            fields,
        ))
    }

    /// Whether two values are the same class.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassValue({:?})", self.0.name)
    }
}

/// Instance of a class.
///
/// Field values belong to the instance. Method resolution goes through a
/// re-pointable behavior cell, and the class link itself can be moved to a
/// replacement class without touching the fields.
#[derive(Clone)]
pub struct InstanceValue(Rc<InstanceCore>);

struct InstanceCore {
    class: RefCell<ClassValue>,
    behavior: RefCell<Behavior>,
    fields: RefCell<FxHashMap<Name, Value>>,
}

impl InstanceValue {
    pub(crate) fn new(
        class: ClassValue,
        behavior: Behavior,
        fields: FxHashMap<Name, Value>,
    ) -> Self {
        InstanceValue(Rc::new(InstanceCore {
            class: RefCell::new(class),
            behavior: RefCell::new(behavior),
            fields: RefCell::new(fields),
        }))
    }

    /// The class this instance currently belongs to.
    pub fn class(&self) -> ClassValue {
        self.0.class.borrow().clone()
    }

    /// Name of the current class.
    pub fn class_name(&self) -> Name {
        self.0.class.borrow().name()
    }

    /// The behavior cell methods resolve through.
    pub fn behavior(&self) -> Behavior {
        self.0.behavior.borrow().clone()
    }

    /// Read a field.
    pub fn field(&self, name: Name) -> Option<Value> {
        self.0.fields.borrow().get(&name).cloned()
    }

    /// Write a field, inserting it if absent.
    pub fn set_field(&self, name: Name, value: Value) {
        self.0.fields.borrow_mut().insert(name, value);
    }

    /// Field if present, otherwise the named method as a plain function.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        if let Some(value) = self.field(name) {
            return Some(value);
        }
        self.0.behavior.borrow().resolve(name).map(Value::Function)
    }

    /// Resolve a method through the behavior cell and call it with this
    /// instance as the receiver.
    pub fn invoke_method(&self, name: Name, args: &[Value]) -> Result<Value, ValueError> {
        let method = self.0.behavior.borrow().resolve(name);
        let method = method.ok_or_else(|| no_such_method(self.class_name(), name))?;
        let receiver = Value::Instance(self.clone());
        method.call(Some(&receiver), args)
    }

    /// Re-point this instance at a replacement class.
    ///
    /// Fields keep their values; only the class link and the behavior cell
    /// move.
    pub fn rebind_class(&self, class: &ClassValue) {
        *self.0.class.borrow_mut() = class.clone();
        *self.0.behavior.borrow_mut() = class.behavior().clone();
    }

    /// Whether two values are the same instance.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InstanceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceValue({:?})", self.class_name())
    }
}

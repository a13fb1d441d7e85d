//! Mutable record values.

use crate::{Live, Name, Value};
use rustc_hash::FxHashMap;
use std::fmt;

/// Mutable record with named fields and stable identity.
///
/// Clones share the same field map. Two records compare equal only when they
/// are the same record, matching how the engine treats every mutable value.
#[derive(Clone)]
pub struct RecordValue(Live<FxHashMap<Name, Value>>);

impl RecordValue {
    /// Create an empty record.
    pub fn new() -> Self {
        RecordValue(Live::new(FxHashMap::default()))
    }

    /// Create a record from an initial set of fields.
    pub fn from_fields(fields: impl IntoIterator<Item = (Name, Value)>) -> Self {
        RecordValue(Live::new(fields.into_iter().collect()))
    }

    /// Read a field.
    pub fn get(&self, name: Name) -> Option<Value> {
        self.0.borrow().get(&name).cloned()
    }

    /// Write a field, inserting it if absent.
    pub fn set(&self, name: Name, value: Value) {
        self.0.borrow_mut().insert(name, value);
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Whether two values are the same record.
    pub fn same(&self, other: &Self) -> bool {
        self.0.same(&other.0)
    }
}

impl Default for RecordValue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordValue({} fields)", self.len())
    }
}
